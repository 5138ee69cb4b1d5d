//! Build cache cleanup.

use std::fs;
use std::io;
use std::path::Path;

use tracing::debug;

use crate::outcome::StepOutcome;
use crate::project::ProjectLayout;

/// Removes the project's build cache directory if it exists.
///
/// Deletion errors (permissions, files held open by another process) become a
/// warning; the run carries on with the stale cache.
pub fn clean_build_cache(layout: &ProjectLayout) -> StepOutcome {
	let dir = &layout.cache_dir;
	if !dir.exists() {
		debug!(target = "devstart", path = %dir.display(), "no build cache to clean");
		return StepOutcome::Ok;
	}

	debug!(target = "devstart", path = %dir.display(), "removing build cache");
	let removed = if dir.is_dir() {
		fs::remove_dir_all(dir)
	} else {
		fs::remove_file(dir)
	};

	match removed {
		Ok(()) => StepOutcome::Ok,
		Err(e) => removal_warning(dir, &e),
	}
}

fn removal_warning(dir: &Path, err: &io::Error) -> StepOutcome {
	let name = dir
		.file_name()
		.map(|n| n.to_string_lossy().into_owned())
		.unwrap_or_else(|| dir.display().to_string());
	StepOutcome::Warning(format!("Could not clean {name} directory: {err}"))
}
