#[cfg(test)]
mod tests;

use std::env;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use devstart::project::find_project_root;
use devstart::{DEFAULT_PORT, LaunchConfig, PackageManager};
use tracing::debug;

use crate::error::{CliError, Result};

/// Root CLI for devstart.
#[derive(Parser, Debug)]
#[command(name = "devstart")]
#[command(about = "Free the port, clear the build cache and start the Next.js dev server")]
#[command(version)]
#[command(styles = crate::styles::cli_styles())]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Port to run the dev server on
	#[arg(short, long, default_value_t = DEFAULT_PORT, value_parser = clap::value_parser!(u16).range(1..))]
	pub port: u16,

	/// Package manager to use; `auto` picks one from lockfiles
	#[arg(short = 'm', long, value_enum, default_value = "npm")]
	pub package_manager: ManagerArg,

	/// Project directory (default: nearest parent with a package.json)
	#[arg(short = 'C', long, value_name = "DIR")]
	pub project_root: Option<PathBuf>,

	/// Leave processes already listening on the port alone
	#[arg(long)]
	pub no_reclaim: bool,

	/// Keep the .next build cache
	#[arg(long)]
	pub keep_cache: bool,

	/// Print what would run without touching anything
	#[arg(long)]
	pub dry_run: bool,

	/// Print the dry-run plan as JSON
	#[arg(long, requires = "dry_run")]
	pub json: bool,
}

/// Package manager choice on the command line (CLI wrapper for devstart::PackageManager)
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ManagerArg {
	Npm,
	Yarn,
	Pnpm,
	Bun,
	/// Detect from lockfiles and PATH
	Auto,
}

impl ManagerArg {
	/// The explicitly requested manager, if any.
	pub fn requested(self) -> Option<PackageManager> {
		match self {
			ManagerArg::Npm => Some(PackageManager::Npm),
			ManagerArg::Yarn => Some(PackageManager::Yarn),
			ManagerArg::Pnpm => Some(PackageManager::Pnpm),
			ManagerArg::Bun => Some(PackageManager::Bun),
			ManagerArg::Auto => None,
		}
	}
}

impl Cli {
	/// Builds the run configuration, locating the project root when not given.
	pub fn launch_config(&self) -> Result<LaunchConfig> {
		let project_root = match &self.project_root {
			Some(dir) => {
				if !dir.is_dir() {
					return Err(CliError::MissingProjectRoot { path: dir.clone() });
				}
				dir.clone()
			}
			None => {
				let cwd = env::current_dir()?;
				find_project_root(&cwd).unwrap_or_else(|| {
					debug!(target = "devstart", cwd = %cwd.display(), "no package.json found, using current directory");
					cwd
				})
			}
		};

		Ok(LaunchConfig {
			port: self.port,
			package_manager: self.package_manager.requested(),
			project_root,
			reclaim_port: !self.no_reclaim,
			clean_cache: !self.keep_cache,
		})
	}
}
