use std::path::PathBuf;

use serde::Serialize;

use crate::DEFAULT_PORT;
use crate::manager::PackageManager;

/// Settings for one run, fixed once parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaunchConfig {
	/// Port the dev server listens on and the reclaimer frees.
	pub port: u16,
	/// Explicitly requested manager; `None` lets lockfiles decide.
	pub package_manager: Option<PackageManager>,
	pub project_root: PathBuf,
	/// Kill processes already listening on `port`.
	pub reclaim_port: bool,
	/// Delete the build cache before starting.
	pub clean_cache: bool,
}

impl LaunchConfig {
	pub fn new(project_root: impl Into<PathBuf>) -> Self {
		Self {
			port: DEFAULT_PORT,
			package_manager: Some(PackageManager::Npm),
			project_root: project_root.into(),
			reclaim_port: true,
			clean_cache: true,
		}
	}
}
