use std::ffi::OsString;
use std::path::PathBuf;

use clap::{CommandFactory, Parser};
use tempfile::TempDir;

use super::*;

#[test]
fn command_definition_is_valid() {
	Cli::command().debug_assert();
}

#[test]
fn defaults_match_the_documented_values() {
	let cli = Cli::try_parse_from(["devstart"]).unwrap();

	assert_eq!(cli.port, 3000);
	assert_eq!(cli.package_manager, ManagerArg::Npm);
	assert_eq!(cli.project_root, None);
	assert!(!cli.no_reclaim);
	assert!(!cli.keep_cache);
	assert!(!cli.dry_run);
	assert_eq!(cli.verbose, 0);
}

#[test]
fn short_flags() {
	let cli = Cli::try_parse_from(["devstart", "-p", "4000", "-m", "pnpm", "-C", "/srv/site", "-vv"]).unwrap();

	assert_eq!(cli.port, 4000);
	assert_eq!(cli.package_manager, ManagerArg::Pnpm);
	assert_eq!(cli.project_root, Some(PathBuf::from("/srv/site")));
	assert_eq!(cli.verbose, 2);
}

#[test]
fn long_flags() {
	let cli = Cli::try_parse_from([
		"devstart",
		"--port",
		"8080",
		"--package-manager",
		"bun",
		"--no-reclaim",
		"--keep-cache",
		"--dry-run",
		"--json",
	])
	.unwrap();

	assert_eq!(cli.port, 8080);
	assert_eq!(cli.package_manager, ManagerArg::Bun);
	assert!(cli.no_reclaim);
	assert!(cli.keep_cache);
	assert!(cli.dry_run);
	assert!(cli.json);
}

#[test]
fn auto_means_no_explicit_request() {
	let cli = Cli::try_parse_from(["devstart", "-m", "auto"]).unwrap();
	assert_eq!(cli.package_manager.requested(), None);
	assert_eq!(ManagerArg::Yarn.requested(), Some(PackageManager::Yarn));
}

#[test]
fn unknown_package_manager_is_rejected() {
	assert!(Cli::try_parse_from(["devstart", "-m", "deno"]).is_err());
}

#[test]
fn invalid_ports_are_rejected() {
	assert!(Cli::try_parse_from(["devstart", "-p", "0"]).is_err());
	assert!(Cli::try_parse_from(["devstart", "-p", "70000"]).is_err());
	assert!(Cli::try_parse_from(["devstart", "-p", "http"]).is_err());
}

#[test]
fn json_requires_dry_run() {
	assert!(Cli::try_parse_from(["devstart", "--json"]).is_err());
}

#[test]
fn launch_config_uses_explicit_root() {
	let temp = TempDir::new().unwrap();
	let root = temp.path().to_str().unwrap();
	let cli = Cli::try_parse_from(["devstart", "-C", root, "-p", "3100", "--keep-cache"]).unwrap();

	let config = cli.launch_config().unwrap();
	assert_eq!(config.project_root, temp.path());
	assert_eq!(config.port, 3100);
	assert_eq!(config.package_manager, Some(PackageManager::Npm));
	assert!(config.reclaim_port);
	assert!(!config.clean_cache);
}

#[test]
fn launch_config_rejects_missing_root() {
	let temp = TempDir::new().unwrap();
	let missing = temp.path().join("missing");
	let args: Vec<OsString> = vec!["devstart".into(), "-C".into(), missing.into()];
	let cli = Cli::try_parse_from(args).unwrap();

	let err = cli.launch_config().unwrap_err();
	assert!(matches!(err, CliError::MissingProjectRoot { .. }));
	assert_eq!(err.exit_code(), 1);
}
