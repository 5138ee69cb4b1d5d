//! Frees a TCP port by killing whatever process listens on it.
//!
//! PID discovery and killing go through [`PortKiller`]: `lsof`/`kill` on
//! POSIX systems and `netstat`/`taskkill` on Windows. Everything here is best
//! effort; failures end up as a [`StepOutcome::Warning`].

use std::io;
use std::process::{Command, Output, Stdio};
use std::time::Duration;

use tracing::debug;

use crate::env::Environment;
use crate::outcome::StepOutcome;

/// Pause after each kill attempt so the OS can release the socket.
pub const KILL_DELAY: Duration = Duration::from_millis(500);

/// Pause after the whole reclaim phase before the port is reused.
pub const SETTLE_DELAY: Duration = Duration::from_secs(1);

/// Platform capability to find and kill the processes bound to a port.
pub trait PortKiller {
	/// Short label used in logs.
	fn name(&self) -> &'static str;

	/// PIDs of processes listening on `port`. An empty list means the port is free.
	fn find_pids(&self, port: u16) -> io::Result<Vec<u32>>;

	/// Forcefully terminates `pid`.
	fn kill_pid(&self, pid: u32) -> io::Result<()>;
}

/// Picks the killer for the platform devstart was built for.
pub fn platform_killer(env: &Environment) -> Box<dyn PortKiller> {
	if cfg!(windows) {
		Box::new(NetstatKiller::new(env.clone()))
	} else {
		Box::new(LsofKiller::new(env.clone()))
	}
}

/// `lsof -ti :<port>` + `kill -9 <pid>`.
#[derive(Debug, Clone)]
pub struct LsofKiller {
	env: Environment,
}

impl LsofKiller {
	pub fn new(env: Environment) -> Self {
		Self { env }
	}
}

impl PortKiller for LsofKiller {
	fn name(&self) -> &'static str {
		"lsof"
	}

	fn find_pids(&self, port: u16) -> io::Result<Vec<u32>> {
		// lsof exits 1 when nothing matches, so only stdout matters.
		let output = capture(&self.env, "lsof", &["-ti", &format!(":{port}")])?;
		Ok(parse_lsof_pids(&String::from_utf8_lossy(&output.stdout)))
	}

	fn kill_pid(&self, pid: u32) -> io::Result<()> {
		let output = capture(&self.env, "kill", &["-9", &pid.to_string()])?;
		check_status("kill", &output)
	}
}

/// `netstat -ano` + `taskkill /F /PID <pid>`.
#[derive(Debug, Clone)]
pub struct NetstatKiller {
	env: Environment,
}

impl NetstatKiller {
	pub fn new(env: Environment) -> Self {
		Self { env }
	}
}

impl PortKiller for NetstatKiller {
	fn name(&self) -> &'static str {
		"netstat"
	}

	fn find_pids(&self, port: u16) -> io::Result<Vec<u32>> {
		let output = capture(&self.env, "netstat", &["-ano"])?;
		check_status("netstat", &output)?;
		Ok(parse_netstat_pids(&String::from_utf8_lossy(&output.stdout), port))
	}

	fn kill_pid(&self, pid: u32) -> io::Result<()> {
		let output = capture(&self.env, "taskkill", &["/F", "/PID", &pid.to_string()])?;
		check_status("taskkill", &output)
	}
}

fn capture(env: &Environment, program: &str, args: &[&str]) -> io::Result<Output> {
	let mut cmd = Command::new(program);
	cmd.args(args).stdin(Stdio::null());
	env.apply_std(&mut cmd);
	cmd.output()
		.map_err(|e| io::Error::new(e.kind(), format!("failed to run {program}: {e}")))
}

fn check_status(program: &str, output: &Output) -> io::Result<()> {
	if output.status.success() {
		return Ok(());
	}
	let stderr = String::from_utf8_lossy(&output.stderr);
	Err(io::Error::other(format!(
		"{program} exited with {}: {}",
		output.status,
		stderr.trim()
	)))
}

/// One PID per line, as printed by `lsof -t`.
fn parse_lsof_pids(stdout: &str) -> Vec<u32> {
	let mut pids = Vec::new();
	for pid in stdout.lines().filter_map(|line| line.trim().parse::<u32>().ok()) {
		if !pids.contains(&pid) {
			pids.push(pid);
		}
	}
	pids
}

/// Extracts PIDs of `LISTENING` rows bound to `port` from `netstat -ano`.
///
/// Rows look like `TCP  0.0.0.0:3000  0.0.0.0:0  LISTENING  1234`. The local
/// address must end in `:<port>` exactly so that 3000 does not match 30000.
fn parse_netstat_pids(stdout: &str, port: u16) -> Vec<u32> {
	let suffix = format!(":{port}");
	let mut pids = Vec::new();

	for line in stdout.lines() {
		let parts: Vec<&str> = line.split_whitespace().collect();
		let [_proto, local, _foreign, state, pid] = parts.as_slice() else {
			continue;
		};
		if !local.ends_with(&suffix) || *state != "LISTENING" {
			continue;
		}
		match pid.parse::<u32>() {
			Ok(0) | Err(_) => {}
			Ok(pid) if !pids.contains(&pid) => pids.push(pid),
			Ok(_) => {}
		}
	}

	pids
}

/// What a reclaim pass did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReclaimReport {
	pub port: u16,
	pub killed: Vec<u32>,
	pub outcome: StepOutcome,
}

/// Frees a port using a [`PortKiller`].
pub struct PortReclaimer {
	killer: Box<dyn PortKiller>,
	kill_delay: Duration,
}

impl PortReclaimer {
	pub fn new(killer: Box<dyn PortKiller>) -> Self {
		Self {
			killer,
			kill_delay: KILL_DELAY,
		}
	}

	/// Overrides the pause after each kill.
	pub fn with_kill_delay(mut self, delay: Duration) -> Self {
		self.kill_delay = delay;
		self
	}

	/// Kills every process listening on `port`.
	///
	/// Never fails: lookup and kill errors are folded into the report's outcome.
	pub async fn reclaim(&self, port: u16) -> ReclaimReport {
		let pids = match self.killer.find_pids(port) {
			Ok(pids) => pids,
			Err(e) => {
				debug!(target = "devstart", killer = self.killer.name(), error = %e, "pid lookup failed");
				return ReclaimReport {
					port,
					killed: Vec::new(),
					outcome: StepOutcome::Warning(format!(
						"Could not kill process on port {port}: {e}"
					)),
				};
			}
		};

		if pids.is_empty() {
			debug!(target = "devstart", port, "port is free");
			return ReclaimReport {
				port,
				killed: Vec::new(),
				outcome: StepOutcome::Ok,
			};
		}

		let mut killed = Vec::new();
		let mut failures = Vec::new();
		for pid in pids {
			debug!(target = "devstart", pid, port, "killing process");
			match self.killer.kill_pid(pid) {
				Ok(()) => killed.push(pid),
				Err(e) => failures.push(format!("{pid} ({e})")),
			}
			tokio::time::sleep(self.kill_delay).await;
		}

		let outcome = if failures.is_empty() {
			StepOutcome::Ok
		} else {
			StepOutcome::Warning(format!(
				"Could not kill process on port {port}: {}",
				failures.join(", ")
			))
		};

		ReclaimReport { port, killed, outcome }
	}
}
