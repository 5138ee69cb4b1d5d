//! Dependency install and dev server process.

use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use serde::Serialize;
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use crate::INTERRUPTED_EXIT_CODE;
use crate::env::Environment;
use crate::error::{Error, Result};
use crate::manager::ResolvedManager;
use crate::project::ProjectLayout;

/// How long an interrupted dev server gets to exit before it is killed.
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// A program and its arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandLine {
	pub program: PathBuf,
	pub args: Vec<String>,
}

impl CommandLine {
	fn program_name(&self) -> String {
		self.program.display().to_string()
	}
}

impl fmt::Display for CommandLine {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.program.display())?;
		for arg in &self.args {
			write!(f, " {arg}")?;
		}
		Ok(())
	}
}

/// How the dev server run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DevServerExit {
	/// The process exited on its own with this code.
	Exited(i32),
	/// The caller's interrupt fired and the process was asked to terminate.
	Interrupted,
}

impl DevServerExit {
	pub fn code(self) -> i32 {
		match self {
			DevServerExit::Exited(code) => code,
			DevServerExit::Interrupted => INTERRUPTED_EXIT_CODE,
		}
	}
}

/// Runs package manager commands inside a project.
///
/// Children start in the project root with the captured [`Environment`] and
/// inherit stdio.
pub struct Launcher<'a> {
	manager: &'a ResolvedManager,
	layout: &'a ProjectLayout,
	env: &'a Environment,
	shutdown_timeout: Duration,
}

impl<'a> Launcher<'a> {
	pub fn new(manager: &'a ResolvedManager, layout: &'a ProjectLayout, env: &'a Environment) -> Self {
		Self {
			manager,
			layout,
			env,
			shutdown_timeout: SHUTDOWN_TIMEOUT,
		}
	}

	pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
		self.shutdown_timeout = timeout;
		self
	}

	pub fn install_command(&self) -> CommandLine {
		CommandLine {
			program: self.manager.executable.clone(),
			args: self.manager.manager.install_args(),
		}
	}

	pub fn dev_command(&self, port: u16) -> CommandLine {
		CommandLine {
			program: self.manager.executable.clone(),
			args: self.manager.manager.dev_args(port),
		}
	}

	/// True when the dependency directory is missing.
	pub fn needs_install(&self) -> bool {
		!self.layout.has_dependencies()
	}

	/// Runs the install command and returns its exit code.
	pub async fn install(&self) -> Result<i32> {
		let line = self.install_command();
		debug!(target = "devstart", command = %line, "installing dependencies");
		let status = self
			.command(&line)
			.status()
			.await
			.map_err(|e| Error::spawn(line.program_name(), e))?;
		Ok(exit_code(status))
	}

	/// Runs the dev server until it exits or `interrupt` resolves.
	///
	/// On interrupt the child gets a termination request and up to the
	/// shutdown timeout to exit before it is killed.
	pub async fn run_dev_server<F>(&self, port: u16, interrupt: F) -> Result<DevServerExit>
	where
		F: Future<Output = ()>,
	{
		let line = self.dev_command(port);
		debug!(target = "devstart", command = %line, "starting dev server");
		let mut child = self
			.command(&line)
			.spawn()
			.map_err(|e| Error::spawn(line.program_name(), e))?;

		tokio::select! {
			status = child.wait() => {
				let status = status.map_err(|source| Error::Spawn {
					program: line.program_name(),
					source,
				})?;
				debug!(target = "devstart", %status, "dev server exited");
				Ok(DevServerExit::Exited(exit_code(status)))
			}
			() = interrupt => {
				debug!(target = "devstart", "interrupted, stopping dev server");
				self.terminate(&mut child).await;
				Ok(DevServerExit::Interrupted)
			}
		}
	}

	fn command(&self, line: &CommandLine) -> Command {
		let mut cmd = Command::new(&line.program);
		cmd.args(&line.args)
			.current_dir(&self.layout.root)
			.stdin(Stdio::inherit())
			.stdout(Stdio::inherit())
			.stderr(Stdio::inherit());
		self.env.apply(&mut cmd);
		cmd
	}

	async fn terminate(&self, child: &mut Child) {
		#[cfg(unix)]
		{
			if let Some(pid) = child.id() {
				let mut kill = std::process::Command::new("kill");
				kill.args(["-TERM", &pid.to_string()])
					.stdout(Stdio::null())
					.stderr(Stdio::null());
				self.env.apply_std(&mut kill);
				if let Err(e) = kill.status() {
					debug!(target = "devstart", pid, error = %e, "kill -TERM failed");
					let _ = child.start_kill();
				}
			}
		}

		#[cfg(not(unix))]
		{
			if let Err(e) = child.start_kill() {
				debug!(target = "devstart", error = %e, "failed to stop dev server");
			}
		}

		match tokio::time::timeout(self.shutdown_timeout, child.wait()).await {
			Ok(Ok(status)) => debug!(target = "devstart", %status, "dev server stopped"),
			Ok(Err(e)) => debug!(target = "devstart", error = %e, "failed to wait for dev server"),
			Err(_) => {
				warn!(
					target = "devstart",
					timeout_ms = self.shutdown_timeout.as_millis() as u64,
					"dev server did not stop in time, killing it"
				);
				let _ = child.kill().await;
			}
		}
	}
}

/// Maps an exit status to a shell-style exit code.
fn exit_code(status: ExitStatus) -> i32 {
	if let Some(code) = status.code() {
		return code;
	}

	#[cfg(unix)]
	{
		use std::os::unix::process::ExitStatusExt;
		if let Some(signal) = status.signal() {
			return 128 + signal;
		}
	}

	1
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::manager::{PackageManager, ResolvedBy};

	fn resolved(manager: PackageManager, executable: impl Into<PathBuf>) -> ResolvedManager {
		ResolvedManager {
			manager,
			executable: executable.into(),
			resolved_by: ResolvedBy::Request,
		}
	}

	#[test]
	fn command_lines_follow_the_manager_table() {
		let manager = resolved(PackageManager::Npm, "/usr/bin/npm");
		let layout = ProjectLayout::from_root("/project");
		let env = Environment::default();
		let launcher = Launcher::new(&manager, &layout, &env);

		assert_eq!(
			launcher.install_command().to_string(),
			"/usr/bin/npm install --no-fund --no-audit"
		);
		assert_eq!(launcher.dev_command(3001).to_string(), "/usr/bin/npm run dev -- -p 3001");
	}

	#[test]
	fn interrupted_exit_code_is_130() {
		assert_eq!(DevServerExit::Interrupted.code(), 130);
		assert_eq!(DevServerExit::Exited(0).code(), 0);
		assert_eq!(DevServerExit::Exited(2).code(), 2);
	}

	#[tokio::test]
	async fn missing_executable_is_reported() {
		let manager = resolved(PackageManager::Pnpm, "/nonexistent/devstart/pnpm");
		let temp = tempfile::TempDir::new().unwrap();
		let layout = ProjectLayout::from_root(temp.path());
		let env = Environment::capture();
		let launcher = Launcher::new(&manager, &layout, &env);

		let err = launcher
			.run_dev_server(3000, std::future::pending())
			.await
			.unwrap_err();
		assert!(matches!(err, Error::ExecutableNotFound { .. }));
		assert!(err.to_string().contains("not found on PATH"));
	}

	/// Fake package managers run through `/bin/sh`: the first manager argument
	/// (`dev`, `run`, `install`) names a script inside the project root, which
	/// receives the remaining arguments.
	#[cfg(unix)]
	mod process {
		use std::fs;
		use std::path::Path;

		use tempfile::TempDir;

		use super::*;

		struct Project {
			temp: TempDir,
			layout: ProjectLayout,
			env: Environment,
		}

		impl Project {
			fn new() -> Self {
				let temp = TempDir::new().unwrap();
				let layout = ProjectLayout::from_root(temp.path());
				Self {
					temp,
					layout,
					env: Environment::capture(),
				}
			}

			fn script(&self, name: &str, body: &str) {
				fs::write(self.temp.path().join(name), body).unwrap();
			}

			fn path(&self, name: &str) -> std::path::PathBuf {
				self.temp.path().join(name)
			}
		}

		fn sh(manager: PackageManager) -> ResolvedManager {
			resolved(manager, "/bin/sh")
		}

		async fn wait_for(path: &Path) {
			while !path.exists() {
				tokio::time::sleep(Duration::from_millis(20)).await;
			}
		}

		#[tokio::test]
		async fn relays_dev_server_exit_code() {
			let project = Project::new();
			project.script("dev", "exit 3\n");
			let manager = sh(PackageManager::Pnpm);
			let launcher = Launcher::new(&manager, &project.layout, &project.env);

			let exit = launcher.run_dev_server(3000, std::future::pending()).await.unwrap();
			assert_eq!(exit, DevServerExit::Exited(3));
		}

		#[tokio::test]
		async fn passes_port_and_runs_in_project_root() {
			let project = Project::new();
			project.script("run", "printf '%s\\n' \"$@\" > args.txt\n");
			let manager = sh(PackageManager::Npm);
			let launcher = Launcher::new(&manager, &project.layout, &project.env);

			let exit = launcher.run_dev_server(4000, std::future::pending()).await.unwrap();
			assert_eq!(exit.code(), 0);
			let args = fs::read_to_string(project.path("args.txt")).unwrap();
			assert_eq!(args.lines().collect::<Vec<_>>(), ["dev", "--", "-p", "4000"]);
		}

		#[tokio::test]
		async fn forwards_the_environment_snapshot() {
			let mut project = Project::new();
			project.env = project.env.clone().with("DEVSTART_FORWARDED", "from-parent");
			project.script("dev", "printf '%s' \"$DEVSTART_FORWARDED\" > env.txt\n");
			let manager = sh(PackageManager::Yarn);
			let launcher = Launcher::new(&manager, &project.layout, &project.env);

			launcher.run_dev_server(3000, std::future::pending()).await.unwrap();
			assert_eq!(fs::read_to_string(project.path("env.txt")).unwrap(), "from-parent");
		}

		#[tokio::test]
		async fn signal_death_maps_to_128_plus_signal() {
			let project = Project::new();
			project.script("dev", "kill -9 $$\n");
			let manager = sh(PackageManager::Pnpm);
			let launcher = Launcher::new(&manager, &project.layout, &project.env);

			let exit = launcher.run_dev_server(3000, std::future::pending()).await.unwrap();
			assert_eq!(exit, DevServerExit::Exited(137));
		}

		#[tokio::test]
		async fn interrupt_terminates_the_child_and_reports_130() {
			let project = Project::new();
			project.script(
				"dev",
				"trap 'touch terminated; exit 143' TERM\ntouch ready\nwhile :; do sleep 0.1; done\n",
			);
			let manager = sh(PackageManager::Pnpm);
			let launcher = Launcher::new(&manager, &project.layout, &project.env);

			let ready = project.path("ready");
			let exit = launcher.run_dev_server(3000, wait_for(&ready)).await.unwrap();

			assert_eq!(exit, DevServerExit::Interrupted);
			assert_eq!(exit.code(), 130);
			assert!(project.path("terminated").exists());
		}

		#[tokio::test]
		async fn stubborn_child_is_killed_after_timeout() {
			let project = Project::new();
			project.script("dev", "trap '' TERM\ntouch ready\nwhile :; do sleep 0.1; done\n");
			let manager = sh(PackageManager::Pnpm);
			let launcher = Launcher::new(&manager, &project.layout, &project.env)
				.with_shutdown_timeout(Duration::from_millis(300));

			let ready = project.path("ready");
			let exit = tokio::time::timeout(
				Duration::from_secs(10),
				launcher.run_dev_server(3000, wait_for(&ready)),
			)
			.await
			.expect("launcher hung on a child ignoring SIGTERM")
			.unwrap();
			assert_eq!(exit.code(), 130);
		}

		#[tokio::test]
		async fn install_runs_when_node_modules_is_missing() {
			let project = Project::new();
			project.script("install", "touch installed\nexit 0\n");
			let manager = sh(PackageManager::Pnpm);
			let launcher = Launcher::new(&manager, &project.layout, &project.env);

			assert!(launcher.needs_install());
			assert_eq!(launcher.install().await.unwrap(), 0);
			assert!(project.path("installed").exists());
		}

		#[test]
		fn no_install_needed_when_node_modules_exists() {
			let project = Project::new();
			fs::create_dir(&project.layout.deps_dir).unwrap();
			fs::write(project.layout.file("pnpm-lock.yaml"), "lockfileVersion: 9").unwrap();
			let manager = sh(PackageManager::Pnpm);
			let launcher = Launcher::new(&manager, &project.layout, &project.env);

			assert!(!launcher.needs_install());
		}

		#[tokio::test]
		async fn failed_install_returns_its_code() {
			let project = Project::new();
			project.script("install", "exit 7\n");
			let manager = sh(PackageManager::Bun);
			let launcher = Launcher::new(&manager, &project.layout, &project.env);

			assert_eq!(launcher.install().await.unwrap(), 7);
		}
	}
}
