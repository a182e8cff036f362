use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "olsend")]
#[command(about = "Send mail through the installed desktop mail application")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Read settings from this JSON file instead of the user config directory
	#[arg(long, global = true, value_name = "FILE")]
	pub config: Option<PathBuf>,

	/// Output format
	#[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
	pub format: OutputFormat,

	/// Drive an in-process simulated application instead of the real one
	#[arg(long, global = true)]
	pub dry_run: bool,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Compose and send one message, waiting for the application to confirm it
	Send(SendArgs),

	/// Report whether the mail application can be driven
	Check,

	/// Print the effective settings
	Config,
}

#[derive(Args, Debug)]
pub struct SendArgs {
	/// Recipient address or display name (repeatable, kept in order)
	#[arg(long = "to", required = true, value_name = "RECIPIENT")]
	pub to: Vec<String>,

	#[arg(short, long, default_value = "")]
	pub subject: String,

	/// Plain-text body
	#[arg(short, long, conflicts_with = "body_file")]
	pub body: Option<String>,

	/// Read the plain-text body from a file
	#[arg(long, value_name = "FILE")]
	pub body_file: Option<PathBuf>,

	/// File to attach (repeatable, kept in order)
	#[arg(short, long = "attach", value_name = "FILE")]
	pub attachments: Vec<PathBuf>,

	/// How long to wait for send confirmation (ms); overrides the config file
	#[arg(long, value_name = "MS")]
	pub timeout_ms: Option<u64>,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parse_send_with_repeated_flags() {
		let args = vec![
			"olsend", "send", "--to", "a@x.com", "--to", "b@x.com", "-s", "S", "-b", "B", "-a", "f1.txt", "-a", "f2.txt",
		];
		let cli = Cli::try_parse_from(args).unwrap();

		match cli.command {
			Commands::Send(send) => {
				assert_eq!(send.to, vec!["a@x.com", "b@x.com"]);
				assert_eq!(send.subject, "S");
				assert_eq!(send.body.as_deref(), Some("B"));
				assert_eq!(send.attachments, vec![PathBuf::from("f1.txt"), PathBuf::from("f2.txt")]);
				assert_eq!(send.timeout_ms, None);
			}
			_ => panic!("Expected Send command"),
		}
	}

	#[test]
	fn send_requires_a_recipient() {
		assert!(Cli::try_parse_from(["olsend", "send", "-s", "S"]).is_err());
	}

	#[test]
	fn body_and_body_file_conflict() {
		let result = Cli::try_parse_from(["olsend", "send", "--to", "a@x.com", "-b", "B", "--body-file", "body.txt"]);
		assert!(result.is_err());
	}

	#[test]
	fn global_flags_after_subcommand() {
		let cli = Cli::try_parse_from(["olsend", "check", "--dry-run", "-f", "json", "-vv"]).unwrap();
		assert!(cli.dry_run);
		assert_eq!(cli.format, OutputFormat::Json);
		assert_eq!(cli.verbose, 2);
		assert!(matches!(cli.command, Commands::Check));
	}
}
