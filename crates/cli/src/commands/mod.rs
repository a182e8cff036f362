mod check;
mod send;

use std::sync::Arc;

use olsend::surface::fake::ScriptedSurface;
use olsend::{AutomationSurface, Mailer, MailerConfig, ProcessTable, SystemProcessTable};
use olsend_runtime::fake::FakeProcessTable;
use tracing::debug;

use crate::cli::{Cli, Commands};
use crate::config;
use crate::output::{self, CommandResult};

pub use check::CheckData;
pub use send::SendData;

/// Process exit status for each kind of result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
	Confirmed,
	Fatal,
	Unavailable,
	NotConfirmed,
}

impl From<ExitCode> for i32 {
	fn from(code: ExitCode) -> Self {
		match code {
			ExitCode::Confirmed => 0,
			ExitCode::Fatal => 1,
			ExitCode::Unavailable => 2,
			ExitCode::NotConfirmed => 3,
		}
	}
}

/// The application and process table a command drives.
pub struct Backend {
	/// `None` when no automation binding exists on this host.
	pub surface: Option<Arc<dyn AutomationSurface>>,
	pub processes: Arc<dyn ProcessTable>,
}

impl Backend {
	/// A dry run drives an in-process application that is already running and
	/// confirms every send on the first poll.
	pub fn new(dry_run: bool) -> Self {
		if dry_run {
			debug!(target = "olsend.cli", "dry run: using scripted application");
			return Self {
				surface: Some(Arc::new(ScriptedSurface::new().with_running_instance())),
				processes: Arc::new(FakeProcessTable::new()),
			};
		}

		debug!(target = "olsend.cli", "no automation binding on this host");
		Self {
			surface: None,
			processes: Arc::new(SystemProcessTable::new()),
		}
	}

	pub fn mailer(&self, config: MailerConfig) -> Option<Mailer> {
		self.surface
			.as_ref()
			.map(|surface| Mailer::new(Arc::clone(surface), Arc::clone(&self.processes), config))
	}
}

pub async fn dispatch(cli: Cli) -> anyhow::Result<ExitCode> {
	let mailer_config = config::load(cli.config.as_deref())?;
	let backend = Backend::new(cli.dry_run);

	match cli.command {
		Commands::Send(args) => send::execute(args, mailer_config, &backend, cli.format).await,
		Commands::Check => check::execute(mailer_config, &backend, cli.format),
		Commands::Config => {
			let result = CommandResult::success("config", "effective settings", &mailer_config);
			output::print_result(cli.format, &result)?;
			if cli.format == output::OutputFormat::Text {
				println!("{}", serde_json::to_string_pretty(&mailer_config)?);
			}
			Ok(ExitCode::Confirmed)
		}
	}
}
