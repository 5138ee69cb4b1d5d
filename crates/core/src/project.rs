//! Project detection and well-known paths inside a web project.

use std::path::{Path, PathBuf};

use tracing::debug;

/// Well-known names inside a project root.
pub mod names {
	pub const PACKAGE_JSON: &str = "package.json";
	pub const BUILD_CACHE: &str = ".next";
	pub const NODE_MODULES: &str = "node_modules";
}

/// Paths derived from a project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
	/// Project root directory (where package.json lives)
	pub root: PathBuf,
	/// Build cache removed before each start (default: .next)
	pub cache_dir: PathBuf,
	/// Dependency directory whose presence skips the install step
	pub deps_dir: PathBuf,
}

impl ProjectLayout {
	pub fn from_root(root: impl Into<PathBuf>) -> Self {
		let root = root.into();
		Self {
			cache_dir: root.join(names::BUILD_CACHE),
			deps_dir: root.join(names::NODE_MODULES),
			root,
		}
	}

	/// Path of a file directly under the project root.
	pub fn file(&self, name: &str) -> PathBuf {
		self.root.join(name)
	}

	pub fn has_dependencies(&self) -> bool {
		self.deps_dir.exists()
	}
}

/// Finds the project root by searching upward for package.json.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
	let start = if start.is_absolute() {
		start.to_path_buf()
	} else {
		std::env::current_dir().ok()?.join(start)
	};

	let mut current = start.as_path();
	loop {
		debug!(target = "devstart", path = %current.display(), "checking for package.json");

		if current.join(names::PACKAGE_JSON).is_file() {
			debug!(target = "devstart", root = %current.display(), "found project root");
			return Some(current.to_path_buf());
		}

		match current.parent() {
			Some(parent) if parent != current => current = parent,
			_ => break,
		}
	}

	None
}
