use anyhow::Result;
use olsend::MailerConfig;
use serde::Serialize;

use super::{Backend, ExitCode};
use crate::output::{self, CommandResult, ErrorCode, OutputFormat};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckData {
	pub available: bool,
	pub process_name: String,
	/// Instances of the application currently running.
	pub running: usize,
}

pub fn execute(config: MailerConfig, backend: &Backend, format: OutputFormat) -> Result<ExitCode> {
	let available = backend.mailer(config.clone()).is_some_and(|mailer| mailer.is_available());
	let data = CheckData {
		available,
		running: backend.processes.list_by_name(&config.process_name).len(),
		process_name: config.process_name,
	};

	if available {
		let message = format!("mail application available ({} running)", data.running);
		output::print_result(format, &CommandResult::success("check", message, data))?;
		Ok(ExitCode::Confirmed)
	} else {
		let result = CommandResult::failure("check", ErrorCode::Unavailable, super::send::UNAVAILABLE_MESSAGE, Some(data));
		output::print_result(format, &result)?;
		Ok(ExitCode::Unavailable)
	}
}
