//! Dev-server bootstrap for JavaScript web projects.
//!
//! Prepares a project for `<manager> dev` and runs it:
//!
//! 1. [`manager::resolve`] picks npm, yarn, pnpm or bun from the explicit request,
//!    lockfiles and what is installed on `PATH`.
//! 2. [`port::PortReclaimer`] frees the target TCP port.
//! 3. [`cache::clean_build_cache`] drops a stale `.next` directory.
//! 4. [`launcher::Launcher`] installs dependencies when `node_modules` is missing and
//!    then runs the dev server until it exits or the caller interrupts it.
//!
//! The advisory steps (port and cache) never fail the run; they report a
//! [`StepOutcome`] the caller is expected to surface.

pub mod cache;
pub mod config;
pub mod env;
pub mod error;
pub mod launcher;
pub mod manager;
mod outcome;
pub mod port;
pub mod project;

pub use config::LaunchConfig;
pub use env::Environment;
pub use error::{Error, Result};
pub use launcher::{DevServerExit, Launcher};
pub use manager::{PackageManager, ResolvedManager, SearchPath};
pub use outcome::StepOutcome;
pub use project::ProjectLayout;

/// Exit code reported when the dev server wait is interrupted (128 + SIGINT).
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Default dev server port.
pub const DEFAULT_PORT: u16 = 3000;
