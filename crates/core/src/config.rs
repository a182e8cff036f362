//! Tunables for acquisition, confirmation polling, and shutdown.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings shared by every send. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MailerConfig {
	/// Executable name of the mail application, matched without `.exe` and case.
	pub process_name: String,
	/// Name of the mail-store session opened before composing.
	pub namespace: String,
	/// Wall-clock bound on waiting for send confirmation.
	pub send_timeout_ms: u64,
	/// Spacing between "sent" status polls.
	pub poll_interval_ms: u64,
	/// How long a launched instance gets to exit after the quit request.
	pub quit_wait_ms: u64,
}

impl MailerConfig {
	pub const DEFAULT_PROCESS_NAME: &'static str = "outlook";
	pub const DEFAULT_NAMESPACE: &'static str = "MAPI";

	pub fn send_timeout(&self) -> Duration {
		Duration::from_millis(self.send_timeout_ms)
	}

	/// Poll spacing, never zero.
	pub fn poll_interval(&self) -> Duration {
		Duration::from_millis(self.poll_interval_ms.max(1))
	}

	pub fn quit_wait(&self) -> Duration {
		Duration::from_millis(self.quit_wait_ms)
	}
}

impl Default for MailerConfig {
	fn default() -> Self {
		Self {
			process_name: Self::DEFAULT_PROCESS_NAME.to_string(),
			namespace: Self::DEFAULT_NAMESPACE.to_string(),
			send_timeout_ms: 5000,
			poll_interval_ms: 250,
			quit_wait_ms: 5000,
		}
	}
}
