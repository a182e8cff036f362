use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use olsend::{Delivery, MailRequest, MailerConfig, SendOutcome, ShutdownOutcome};
use serde::Serialize;
use tracing::info;

use super::{Backend, ExitCode};
use crate::cli::SendArgs;
use crate::output::{self, CommandResult, ErrorCode, OutputFormat};

pub const SENT_MESSAGE: &str = "email sent successfully";
pub const NOT_SENT_MESSAGE: &str = "failed to send email";
pub const UNAVAILABLE_MESSAGE: &str = "mail application not available";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendData {
	pub outcome: &'static str,
	pub recipients: usize,
	pub attachments: usize,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub shutdowns: Vec<&'static str>,
}

pub async fn execute(args: SendArgs, mut config: MailerConfig, backend: &Backend, format: OutputFormat) -> Result<ExitCode> {
	if let Some(timeout_ms) = args.timeout_ms {
		config.send_timeout_ms = timeout_ms;
	}

	let request = match build_request(args) {
		Ok(request) => request,
		Err(err) => {
			let result: CommandResult<SendData> = CommandResult::failure("send", ErrorCode::InvalidInput, format!("{err:#}"), None);
			output::print_result(format, &result)?;
			return Ok(ExitCode::Fatal);
		}
	};

	let Some(mailer) = backend.mailer(config) else {
		let result = CommandResult::failure("send", ErrorCode::Unavailable, UNAVAILABLE_MESSAGE, Some(data(&request, "unavailable", &[])));
		output::print_result(format, &result)?;
		return Ok(ExitCode::Unavailable);
	};

	let started = Instant::now();
	let delivery = mailer.send(&request).await;
	let shutdowns = mailer.drain_shutdowns().await;
	let elapsed_ms = started.elapsed().as_millis() as u64;
	info!(target = "olsend.cli", elapsed_ms, shutdowns = shutdowns.len(), "send command finished");

	let (result, code) = match delivery {
		Ok(Delivery::Attempted(SendOutcome::Sent)) => (
			CommandResult::success("send", SENT_MESSAGE, data(&request, "sent", &shutdowns)),
			ExitCode::Confirmed,
		),
		Ok(Delivery::Attempted(SendOutcome::NotConfirmedWithinTimeout)) => (
			CommandResult::failure("send", ErrorCode::NotConfirmed, NOT_SENT_MESSAGE, Some(data(&request, "notConfirmed", &shutdowns))),
			ExitCode::NotConfirmed,
		),
		Ok(Delivery::Unavailable) => (
			CommandResult::failure("send", ErrorCode::Unavailable, UNAVAILABLE_MESSAGE, Some(data(&request, "unavailable", &shutdowns))),
			ExitCode::Unavailable,
		),
		Err(err) => (
			CommandResult::failure("send", ErrorCode::RemoteFailure, err.to_string(), Some(data(&request, "failed", &shutdowns))),
			ExitCode::Fatal,
		),
	};

	output::print_result(format, &result.with_duration_ms(elapsed_ms))?;
	Ok(code)
}

fn build_request(args: SendArgs) -> Result<MailRequest> {
	let body = match (args.body, args.body_file) {
		(Some(body), _) => body,
		(None, Some(path)) => std::fs::read_to_string(&path).with_context(|| format!("failed to read body file {}", path.display()))?,
		(None, None) => String::new(),
	};

	let attachments = args.attachments.iter().map(|path| resolve_attachment(path)).collect::<Result<Vec<_>>>()?;

	Ok(MailRequest {
		to: args.to,
		subject: args.subject,
		body,
		attachments,
	})
}

/// The application resolves attachment paths against its own working
/// directory, so they are made absolute here.
fn resolve_attachment(path: &Path) -> Result<PathBuf> {
	if !path.is_file() {
		anyhow::bail!("attachment not found: {}", path.display());
	}
	std::path::absolute(path).with_context(|| format!("failed to resolve attachment {}", path.display()))
}

fn data(request: &MailRequest, outcome: &'static str, shutdowns: &[ShutdownOutcome]) -> SendData {
	SendData {
		outcome,
		recipients: request.to.len(),
		attachments: request.attachments.len(),
		shutdowns: shutdowns.iter().map(|s| shutdown_label(*s)).collect(),
	}
}

fn shutdown_label(outcome: ShutdownOutcome) -> &'static str {
	match outcome {
		ShutdownOutcome::NothingHeld => "nothingHeld",
		ShutdownOutcome::Released => "released",
		ShutdownOutcome::Exited => "exited",
		ShutdownOutcome::LeftRunning => "leftRunning",
	}
}
