use std::io::Write;

use clap::ValueEnum;
use serde::Serialize;

/// Output format for CLI results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
	/// Human-readable text
	#[default]
	Text,
	/// JSON result envelope
	Json,
}

impl std::str::FromStr for OutputFormat {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_lowercase().as_str() {
			"text" => Ok(OutputFormat::Text),
			"json" => Ok(OutputFormat::Json),
			_ => Err(format!("unknown format: {s}")),
		}
	}
}

impl std::fmt::Display for OutputFormat {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			OutputFormat::Text => write!(f, "text"),
			OutputFormat::Json => write!(f, "json"),
		}
	}
}

/// The result envelope printed by every command.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResult<T: Serialize> {
	pub ok: bool,
	pub command: String,
	pub message: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub data: Option<T>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<CommandError>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub duration_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandError {
	pub code: ErrorCode,
	pub message: String,
}

/// Error codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
	/// The mail application cannot be driven on this machine.
	Unavailable,
	/// The send was issued but never confirmed.
	NotConfirmed,
	/// The application reported an error.
	RemoteFailure,
	InvalidInput,
}

impl<T: Serialize> CommandResult<T> {
	pub fn success(command: &str, message: impl Into<String>, data: T) -> Self {
		Self {
			ok: true,
			command: command.to_string(),
			message: message.into(),
			data: Some(data),
			error: None,
			duration_ms: None,
		}
	}

	pub fn failure(command: &str, code: ErrorCode, message: impl Into<String>, data: Option<T>) -> Self {
		let message = message.into();
		Self {
			ok: false,
			command: command.to_string(),
			message: message.clone(),
			data,
			error: Some(CommandError { code, message }),
			duration_ms: None,
		}
	}

	pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
		self.duration_ms = Some(duration_ms);
		self
	}
}

/// Prints `result`. Text goes to stdout on success and stderr on failure;
/// JSON always goes to stdout.
pub fn print_result<T: Serialize>(format: OutputFormat, result: &CommandResult<T>) -> anyhow::Result<()> {
	match format {
		OutputFormat::Json => {
			let mut stdout = std::io::stdout().lock();
			serde_json::to_writer_pretty(&mut stdout, result)?;
			writeln!(stdout)?;
		}
		OutputFormat::Text if result.ok => println!("{}", result.message),
		OutputFormat::Text => eprintln!("{}", result.message),
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn format_parses_case_insensitively() {
		assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
		assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
		assert!("toml".parse::<OutputFormat>().is_err());
		assert_eq!(OutputFormat::Json.to_string(), "json");
	}

	#[test]
	fn success_envelope_omits_error() {
		let result = CommandResult::success("send", "email sent successfully", json!({ "outcome": "sent" })).with_duration_ms(12);
		let value = serde_json::to_value(&result).unwrap();

		assert_eq!(value["ok"], true);
		assert_eq!(value["command"], "send");
		assert_eq!(value["data"]["outcome"], "sent");
		assert_eq!(value["durationMs"], 12);
		assert!(value.get("error").is_none());
	}

	#[test]
	fn failure_envelope_carries_code() {
		let result: CommandResult<()> = CommandResult::failure("send", ErrorCode::NotConfirmed, "failed to send email", None);
		let value = serde_json::to_value(&result).unwrap();

		assert_eq!(value["ok"], false);
		assert_eq!(value["error"]["code"], "NOT_CONFIRMED");
		assert_eq!(value["error"]["message"], "failed to send email");
		assert!(value.get("data").is_none());
	}
}
