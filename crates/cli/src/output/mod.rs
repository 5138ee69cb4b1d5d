//! Terminal output for devstart.
//!
//! Progress lines go to stdout, warnings and errors to stderr. The dry-run
//! plan renders as aligned text or as JSON for scripts.


use std::fmt::Write as _;
use std::io::{self, Write};
use std::path::PathBuf;

use colored::Colorize;
use devstart::PackageManager;
use devstart::launcher::CommandLine;
use devstart::manager::ResolvedBy;
use serde::Serialize;

use crate::error::CliError;

/// Announces a step that is about to run.
pub fn step(msg: impl AsRef<str>) {
	println!("{} {}", "==>".cyan().bold(), msg.as_ref());
}

/// Reports a detail of the current step.
pub fn info(msg: impl AsRef<str>) {
	println!("    {}", msg.as_ref());
}

pub fn success(msg: impl AsRef<str>) {
	println!("    {}", msg.as_ref().green());
}

/// Advisory failure; the run continues.
pub fn warning(msg: impl AsRef<str>) {
	eprintln!("{} {}", "Warning:".yellow().bold(), msg.as_ref());
}

pub fn print_error(err: &CliError) {
	eprintln!("{} {err}", "Error:".red().bold());
}

/// Everything a run would do, resolved up front.
#[derive(Debug, Clone, Serialize)]
pub struct LaunchPlan {
	pub project_root: PathBuf,
	pub port: u16,
	pub manager: PackageManager,
	pub executable: PathBuf,
	pub resolved_by: ResolvedBy,
	pub reclaim_port: bool,
	/// True when a cache directory exists and would be removed.
	pub clean_cache: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub install: Option<CommandLine>,
	pub dev: CommandLine,
}

impl LaunchPlan {
	pub fn render_text(&self) -> String {
		let mut out = String::new();
		let resolved = match self.resolved_by {
			ResolvedBy::Request => "requested".to_string(),
			ResolvedBy::Lockfile(lockfile) => format!("from {lockfile}"),
			ResolvedBy::Fallback => "first available".to_string(),
		};
		let _ = writeln!(out, "project  {}", self.project_root.display());
		let _ = writeln!(
			out,
			"manager  {} ({}, {resolved})",
			self.manager,
			self.executable.display()
		);
		let _ = writeln!(
			out,
			"port     {}{}",
			self.port,
			if self.reclaim_port { " (reclaim)" } else { "" }
		);
		let _ = writeln!(
			out,
			"cache    {}",
			if self.clean_cache { "remove" } else { "keep" }
		);
		match &self.install {
			Some(install) => {
				let _ = writeln!(out, "install  {install}");
			}
			None => {
				let _ = writeln!(out, "install  skipped (node_modules present)");
			}
		}
		let _ = writeln!(out, "dev      {}", self.dev);
		out
	}

	pub fn print(&self, json: bool) -> Result<(), CliError> {
		let mut stdout = io::stdout().lock();
		if json {
			serde_json::to_writer_pretty(&mut stdout, self)?;
			writeln!(stdout)?;
		} else {
			stdout.write_all(self.render_text().as_bytes())?;
		}
		stdout.flush()?;
		Ok(())
	}
}
