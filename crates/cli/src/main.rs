use clap::Parser;
use devstart_cli::{cli::Cli, logging, output, run};

#[tokio::main(flavor = "current_thread")]
async fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	let code = match run::run(cli).await {
		Ok(code) => code,
		Err(err) => {
			output::print_error(&err);
			err.exit_code()
		}
	};

	std::process::exit(code);
}
