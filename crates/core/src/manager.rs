//! Package manager table and resolution.
//!
//! Resolution order, first hit wins:
//! 1. the explicitly requested manager, if its executable is on `PATH`
//! 2. the manager owning the first lockfile present (pnpm, yarn, bun, npm)
//!    whose executable is on `PATH`
//! 3. the first of pnpm, yarn, bun, npm found on `PATH`

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::env::Environment;
use crate::error::{Error, Result};
use crate::project::ProjectLayout;

/// Supported JavaScript package managers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
	Npm,
	Yarn,
	Pnpm,
	Bun,
}

/// Per-manager command table row.
struct ManagerInfo {
	manager: PackageManager,
	binary: &'static str,
	lockfile: &'static str,
	install_args: &'static [&'static str],
	/// Dev script invocation; the port value is appended.
	dev_args: &'static [&'static str],
}

/// Rows are in lockfile and fallback priority order.
const MANAGERS: [ManagerInfo; 4] = [
	ManagerInfo {
		manager: PackageManager::Pnpm,
		binary: "pnpm",
		lockfile: "pnpm-lock.yaml",
		install_args: &["install"],
		dev_args: &["dev", "-p"],
	},
	ManagerInfo {
		manager: PackageManager::Yarn,
		binary: "yarn",
		lockfile: "yarn.lock",
		install_args: &["install"],
		dev_args: &["dev", "-p"],
	},
	ManagerInfo {
		manager: PackageManager::Bun,
		binary: "bun",
		lockfile: "bun.lockb",
		install_args: &["install"],
		dev_args: &["run", "dev", "-p"],
	},
	ManagerInfo {
		manager: PackageManager::Npm,
		binary: "npm",
		lockfile: "package-lock.json",
		install_args: &["install", "--no-fund", "--no-audit"],
		dev_args: &["run", "dev", "--", "-p"],
	},
];

impl PackageManager {
	/// All managers in lockfile and fallback priority order.
	pub const PRIORITY: [PackageManager; 4] = [
		PackageManager::Pnpm,
		PackageManager::Yarn,
		PackageManager::Bun,
		PackageManager::Npm,
	];

	fn info(self) -> &'static ManagerInfo {
		let index = match self {
			PackageManager::Pnpm => 0,
			PackageManager::Yarn => 1,
			PackageManager::Bun => 2,
			PackageManager::Npm => 3,
		};
		&MANAGERS[index]
	}

	/// Command name without platform suffix.
	pub fn binary(self) -> &'static str {
		self.info().binary
	}

	/// Lockfile whose presence indicates this manager.
	pub fn lockfile(self) -> &'static str {
		self.info().lockfile
	}

	pub fn install_args(self) -> Vec<String> {
		self.info().install_args.iter().map(|s| s.to_string()).collect()
	}

	/// Arguments that run the `dev` script on `port`.
	pub fn dev_args(self, port: u16) -> Vec<String> {
		let mut args: Vec<String> = self.info().dev_args.iter().map(|s| s.to_string()).collect();
		args.push(port.to_string());
		args
	}

	/// Executable names tried on `PATH`, in order.
	pub fn executable_candidates(self) -> [String; 3] {
		let name = self.binary();
		[name.to_string(), format!("{name}.cmd"), format!("{name}.exe")]
	}
}

impl fmt::Display for PackageManager {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.binary())
	}
}

/// Executable lookup against an explicit `PATH` value.
#[derive(Debug, Clone)]
pub struct SearchPath {
	paths: Option<OsString>,
	cwd: PathBuf,
}

impl SearchPath {
	pub fn new(paths: impl Into<OsString>, cwd: impl Into<PathBuf>) -> Self {
		Self {
			paths: Some(paths.into()),
			cwd: cwd.into(),
		}
	}

	/// Uses the `PATH` of an environment snapshot.
	pub fn from_env(env: &Environment, cwd: &Path) -> Self {
		Self {
			paths: env.path().map(OsString::from),
			cwd: cwd.to_path_buf(),
		}
	}

	/// Full path of `name`, if an executable with that name is on the search path.
	pub fn find(&self, name: &str) -> Option<PathBuf> {
		which::which_in(name, self.paths.as_ref(), &self.cwd).ok()
	}

	/// First match among `names`.
	pub fn find_any<S: AsRef<str>>(&self, names: &[S]) -> Option<PathBuf> {
		names.iter().find_map(|name| self.find(name.as_ref()))
	}

	/// Executable for `manager`, trying each platform suffix.
	pub fn find_manager(&self, manager: PackageManager) -> Option<PathBuf> {
		self.find_any(&manager.executable_candidates())
	}
}

/// Why a manager was chosen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "lockfile")]
pub enum ResolvedBy {
	/// Explicitly requested and available.
	Request,
	/// Its lockfile was found in the project root.
	Lockfile(&'static str),
	/// First available manager in fallback order.
	Fallback,
}

/// The manager a run uses and where its executable lives.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResolvedManager {
	pub manager: PackageManager,
	pub executable: PathBuf,
	pub resolved_by: ResolvedBy,
}

/// Picks the package manager for the project at `layout`.
///
/// # Errors
///
/// Returns [`Error::NoPackageManager`] when none of the supported managers is on the search path.
pub fn resolve(
	requested: Option<PackageManager>,
	layout: &ProjectLayout,
	search: &SearchPath,
) -> Result<ResolvedManager> {
	if let Some(manager) = requested {
		if let Some(executable) = search.find_manager(manager) {
			debug!(target = "devstart", %manager, path = %executable.display(), "using requested package manager");
			return Ok(ResolvedManager {
				manager,
				executable,
				resolved_by: ResolvedBy::Request,
			});
		}
		debug!(target = "devstart", %manager, "requested package manager not on PATH, detecting");
	}

	for manager in PackageManager::PRIORITY {
		let lockfile = manager.lockfile();
		if !layout.file(lockfile).exists() {
			continue;
		}
		match search.find_manager(manager) {
			Some(executable) => {
				debug!(target = "devstart", %manager, lockfile, "using package manager from lockfile");
				return Ok(ResolvedManager {
					manager,
					executable,
					resolved_by: ResolvedBy::Lockfile(lockfile),
				});
			}
			None => debug!(target = "devstart", %manager, lockfile, "lockfile present but manager not on PATH"),
		}
	}

	for manager in PackageManager::PRIORITY {
		if let Some(executable) = search.find_manager(manager) {
			debug!(target = "devstart", %manager, "using first available package manager");
			return Ok(ResolvedManager {
				manager,
				executable,
				resolved_by: ResolvedBy::Fallback,
			});
		}
	}

	Err(Error::NoPackageManager)
}
