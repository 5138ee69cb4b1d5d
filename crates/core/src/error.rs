//! Error types for devstart.

use thiserror::Error;

/// Result type alias for devstart operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal errors. Advisory problems are reported through
/// [`StepOutcome`](crate::StepOutcome) instead.
#[derive(Debug, Error)]
pub enum Error {
	/// None of npm, yarn, pnpm or bun is available.
	#[error("No supported package manager found (npm, yarn, pnpm, bun). Install one and try again.")]
	NoPackageManager,

	/// The program to spawn does not exist.
	#[error("'{program}' not found on PATH.")]
	ExecutableNotFound { program: String },

	/// The program exists but could not be started or waited on.
	#[error("failed to run '{program}': {source}")]
	Spawn {
		program: String,
		#[source]
		source: std::io::Error,
	},
}

impl Error {
	/// Classifies a spawn failure, keeping "not found" distinct from other I/O errors.
	pub(crate) fn spawn(program: impl Into<String>, source: std::io::Error) -> Self {
		let program = program.into();
		if source.kind() == std::io::ErrorKind::NotFound {
			Error::ExecutableNotFound { program }
		} else {
			Error::Spawn { program, source }
		}
	}
}
