//! One-call send: compose under a fresh session, send, confirm, tear down.

use std::path::PathBuf;
use std::sync::Arc;

use olsend_runtime::ProcessTable;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::config::MailerConfig;
use crate::draft::{MailDraft, SendOutcome};
use crate::error::Result;
use crate::session::{ApplicationSession, ShutdownOutcome, ShutdownTask};
use crate::surface::AutomationSurface;

/// A message to send.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MailRequest {
	/// Recipients in any form the application resolves, added in order.
	pub to: Vec<String>,
	pub subject: String,
	/// Plain-text body.
	pub body: String,
	/// Files attached in order.
	pub attachments: Vec<PathBuf>,
}

impl MailRequest {
	pub fn new(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
		Self {
			to: vec![to.into()],
			subject: subject.into(),
			body: body.into(),
			attachments: Vec::new(),
		}
	}

	pub fn with_recipient(mut self, recipient: impl Into<String>) -> Self {
		self.to.push(recipient.into());
		self
	}

	pub fn with_attachment(mut self, path: impl Into<PathBuf>) -> Self {
		self.attachments.push(path.into());
		self
	}
}

/// What happened to a send request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
	/// The mail application is not installed; nothing was touched.
	Unavailable,
	/// The send was issued; the outcome says whether it was confirmed.
	Attempted(SendOutcome),
}

impl Delivery {
	/// `true` only when the application confirmed the send.
	pub fn confirmed(self) -> bool {
		matches!(self, Delivery::Attempted(SendOutcome::Sent))
	}
}

/// Sends mail through the external application.
///
/// Every send gets its own [`ApplicationSession`]; nothing is pooled. Shutdown
/// of an instance the send launched continues in the background after
/// [`send`](Self::send) returns; [`drain_shutdowns`](Self::drain_shutdowns)
/// waits for those.
pub struct Mailer {
	surface: Arc<dyn AutomationSurface>,
	processes: Arc<dyn ProcessTable>,
	config: MailerConfig,
	shutdowns: Mutex<Vec<ShutdownTask>>,
}

impl Mailer {
	pub fn new(surface: Arc<dyn AutomationSurface>, processes: Arc<dyn ProcessTable>, config: MailerConfig) -> Self {
		Self {
			surface,
			processes,
			config,
			shutdowns: Mutex::new(Vec::new()),
		}
	}

	pub fn config(&self) -> &MailerConfig {
		&self.config
	}

	/// Whether the mail application can be driven on this machine.
	pub fn is_available(&self) -> bool {
		self.surface.is_available()
	}

	/// Sends `request` and waits for confirmation up to the configured timeout.
	///
	/// Remote failures while composing or sending are returned unchanged,
	/// after the draft and session have been torn down.
	pub async fn send(&self, request: &MailRequest) -> Result<Delivery> {
		if !self.is_available() {
			info!(target = "olsend.mailer", "mail application not available");
			return Ok(Delivery::Unavailable);
		}

		let mut session = ApplicationSession::new(Arc::clone(&self.surface), Arc::clone(&self.processes), self.config.clone());
		let mut draft = None;

		let result = self.compose_and_send(&mut session, &mut draft, request).await;

		if let Some(mut draft) = draft {
			draft.dispose();
		}
		if let Some(pending) = session.dispose() {
			debug!(target = "olsend.mailer", process = %pending.process(), "shutdown continues in background");
			self.shutdowns.lock().push(pending.spawn());
		}

		match &result {
			Ok(outcome) => info!(target = "olsend.mailer", recipients = request.to.len(), ?outcome, "send finished"),
			Err(err) => warn!(target = "olsend.mailer", error = %err, "send failed"),
		}
		result.map(Delivery::Attempted)
	}

	/// Convenience form returning `true` only for a confirmed send.
	pub async fn send_simple(&self, to: &str, subject: &str, body: &str, attachments: &[PathBuf]) -> Result<bool> {
		let request = MailRequest {
			to: vec![to.to_string()],
			subject: subject.to_string(),
			body: body.to_string(),
			attachments: attachments.to_vec(),
		};
		Ok(self.send(&request).await?.confirmed())
	}

	/// Number of background shutdowns not yet drained.
	pub fn pending_shutdowns(&self) -> usize {
		self.shutdowns.lock().len()
	}

	/// Waits for every background shutdown started so far.
	pub async fn drain_shutdowns(&self) -> Vec<ShutdownOutcome> {
		let tasks = std::mem::take(&mut *self.shutdowns.lock());
		let mut outcomes = Vec::with_capacity(tasks.len());
		for task in tasks {
			outcomes.push(task.wait().await);
		}
		outcomes
	}

	async fn compose_and_send(&self, session: &mut ApplicationSession, slot: &mut Option<MailDraft>, request: &MailRequest) -> Result<SendOutcome> {
		let draft = slot.insert(session.create_mail_item().await?);

		for recipient in &request.to {
			draft.add_recipient(recipient).await?;
		}
		draft.set_subject(&request.subject).await?;
		draft.set_body(&request.body).await?;
		for attachment in &request.attachments {
			draft.add_attachment(attachment).await?;
		}

		draft.send_and_confirm(self.config.send_timeout()).await
	}
}

impl std::fmt::Debug for Mailer {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Mailer")
			.field("config", &self.config)
			.field("pending_shutdowns", &self.pending_shutdowns())
			.finish_non_exhaustive()
	}
}
