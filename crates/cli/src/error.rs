use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
	#[error(transparent)]
	Core(#[from] devstart::Error),

	/// The install command ran and exited non-zero; the dev server is not started.
	#[error("dependency install failed with exit code {code}")]
	InstallFailed { code: i32 },

	#[error("project root {} is not a directory", path.display())]
	MissingProjectRoot { path: PathBuf },

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),
}

impl CliError {
	/// Process exit code for this failure.
	pub fn exit_code(&self) -> i32 {
		match self {
			CliError::InstallFailed { code } => *code,
			_ => 1,
		}
	}
}
