//! Environment snapshot forwarded to every child process.

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};

/// Immutable copy of the environment variables children are started with.
///
/// Captured once at startup and applied explicitly to each spawned command, so
/// nothing in devstart reads or mutates the live process environment later.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
	vars: BTreeMap<OsString, OsString>,
}

impl Environment {
	/// Snapshots the current process environment.
	pub fn capture() -> Self {
		Self::from_iter(std::env::vars_os())
	}

	pub fn get(&self, key: impl AsRef<OsStr>) -> Option<&OsStr> {
		self.vars.get(key.as_ref()).map(OsString::as_os_str)
	}

	/// Value of `PATH`, used for executable discovery.
	pub fn path(&self) -> Option<&OsStr> {
		self.get("PATH").or_else(|| {
			// Windows keys are case-insensitive; the snapshot is not.
			self.vars
				.iter()
				.find(|(k, _)| k.eq_ignore_ascii_case("PATH"))
				.map(|(_, v)| v.as_os_str())
		})
	}

	/// Returns a copy with `key` set to `value`.
	pub fn with(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
		self.vars.insert(key.into(), value.into());
		self
	}

	/// Replaces the environment of `cmd` with this snapshot.
	pub fn apply<'a>(&self, cmd: &'a mut tokio::process::Command) -> &'a mut tokio::process::Command {
		cmd.env_clear().envs(&self.vars)
	}

	/// Same as [`apply`](Self::apply) for blocking commands.
	pub fn apply_std<'a>(&self, cmd: &'a mut std::process::Command) -> &'a mut std::process::Command {
		cmd.env_clear().envs(&self.vars)
	}
}

impl<K, V> FromIterator<(K, V)> for Environment
where
	K: Into<OsString>,
	V: Into<OsString>,
{
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		Self {
			vars: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
		}
	}
}
