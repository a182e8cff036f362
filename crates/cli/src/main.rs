use clap::Parser;
use olsend_cli::{cli::Cli, commands, logging};
use tracing::error;

#[tokio::main]
async fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	match commands::dispatch(cli).await {
		Ok(code) => std::process::exit(code.into()),
		Err(err) => {
			error!(target = "olsend", error = %err, "command failed");
			eprintln!("Error: {err:#}");
			std::process::exit(commands::ExitCode::Fatal.into());
		}
	}
}
