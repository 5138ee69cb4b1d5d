//! Runs the startup sequence: resolve, reclaim, clean, install, launch.

use std::future::Future;

use devstart::port::{self, PortReclaimer};
use devstart::{Environment, LaunchConfig, Launcher, ProjectLayout, SearchPath, StepOutcome, cache, manager};
use tracing::{info, warn};

use crate::cli::Cli;
use crate::error::{CliError, Result};
use crate::output::{self, LaunchPlan};

/// Entry point behind `main`; returns the process exit code.
pub async fn run(cli: Cli) -> Result<i32> {
	let config = cli.launch_config()?;
	let env = Environment::capture();

	if cli.dry_run {
		plan(&config, &env)?.print(cli.json)?;
		return Ok(0);
	}

	execute(&config, &env, ctrl_c()).await
}

/// Resolves the package manager and describes the run without side effects.
pub fn plan(config: &LaunchConfig, env: &Environment) -> Result<LaunchPlan> {
	let layout = ProjectLayout::from_root(&config.project_root);
	let search = SearchPath::from_env(env, &layout.root);
	let resolved = manager::resolve(config.package_manager, &layout, &search)?;
	let launcher = Launcher::new(&resolved, &layout, env);

	Ok(LaunchPlan {
		project_root: layout.root.clone(),
		port: config.port,
		manager: resolved.manager,
		executable: resolved.executable.clone(),
		resolved_by: resolved.resolved_by,
		reclaim_port: config.reclaim_port,
		clean_cache: config.clean_cache && layout.cache_dir.exists(),
		install: launcher.needs_install().then(|| launcher.install_command()),
		dev: launcher.dev_command(config.port),
	})
}

/// Runs every step. `interrupt` stops the dev server once it is running.
pub async fn execute<F>(config: &LaunchConfig, env: &Environment, interrupt: F) -> Result<i32>
where
	F: Future<Output = ()>,
{
	let layout = ProjectLayout::from_root(&config.project_root);
	let search = SearchPath::from_env(env, &layout.root);
	let resolved = manager::resolve(config.package_manager, &layout, &search)?;
	info!(
		target = "devstart",
		manager = %resolved.manager,
		path = %resolved.executable.display(),
		root = %layout.root.display(),
		"resolved package manager"
	);

	if config.reclaim_port {
		output::step(format!("Checking for existing processes on port {}...", config.port));
		let reclaimer = PortReclaimer::new(port::platform_killer(env));
		let report = reclaimer.reclaim(config.port).await;
		for pid in &report.killed {
			output::info(format!("Killed process {pid} on port {}", report.port));
		}
		report_outcome(&report.outcome);
		tokio::time::sleep(port::SETTLE_DELAY).await;
	}

	if config.clean_cache && layout.cache_dir.exists() {
		output::step("Cleaning .next build cache...");
		match cache::clean_build_cache(&layout) {
			StepOutcome::Ok => output::success("Build cache cleaned successfully."),
			outcome => report_outcome(&outcome),
		}
	}

	let launcher = Launcher::new(&resolved, &layout, env);
	if launcher.needs_install() {
		output::step(format!("Installing dependencies with {}...", resolved.manager));
		let code = launcher.install().await?;
		if code != 0 {
			return Err(CliError::InstallFailed { code });
		}
	}

	output::step(format!(
		"Starting Next.js dev server on http://localhost:{} using {}...",
		config.port, resolved.manager
	));
	let exit = launcher.run_dev_server(config.port, interrupt).await?;
	info!(target = "devstart", code = exit.code(), "dev server finished");
	Ok(exit.code())
}

fn report_outcome(outcome: &StepOutcome) {
	if let Some(msg) = outcome.warning() {
		output::warning(msg);
	}
}

/// Resolves on Ctrl+C. Never resolves if the handler cannot be installed.
async fn ctrl_c() {
	if let Err(e) = tokio::signal::ctrl_c().await {
		warn!(target = "devstart", error = %e, "failed to listen for Ctrl+C");
		std::future::pending::<()>().await;
	}
}
