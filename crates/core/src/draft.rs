//! A mail item being composed, and the send-then-confirm loop.

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::collections::{Attachments, Recipients};
use crate::error::Result;
use crate::handle::RemoteHandle;
use crate::surface::{self, AutomationSurface};

/// Result of waiting for the application to report a send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
	/// The item reported itself sent, or vanished from the outbox.
	Sent,
	/// No confirmation arrived in time. The mail may still go out later.
	NotConfirmedWithinTimeout,
}

impl SendOutcome {
	pub fn is_sent(self) -> bool {
		matches!(self, SendOutcome::Sent)
	}
}

/// One mail item plus its lazily opened recipient and attachment lists.
///
/// Disposal releases the collections before the item. Dropping an
/// undisposed draft disposes it.
pub struct MailDraft {
	surface: Arc<dyn AutomationSurface>,
	item: RemoteHandle,
	recipients: Option<Recipients>,
	attachments: Option<Attachments>,
	poll_interval: Duration,
}

impl MailDraft {
	pub(crate) fn new(surface: Arc<dyn AutomationSurface>, item: RemoteHandle, poll_interval: Duration) -> Self {
		Self {
			surface,
			item,
			recipients: None,
			attachments: None,
			poll_interval,
		}
	}

	pub async fn subject(&self) -> Result<String> {
		let item = self.item.object()?;
		surface::offload(&self.surface, move |surface| surface.subject(item)).await
	}

	pub async fn set_subject(&mut self, subject: &str) -> Result<()> {
		let item = self.item.object()?;
		let subject = subject.to_string();
		surface::offload(&self.surface, move |surface| surface.set_subject(item, &subject)).await
	}

	/// Plain-text body.
	pub async fn body(&self) -> Result<String> {
		let item = self.item.object()?;
		surface::offload(&self.surface, move |surface| surface.body(item)).await
	}

	pub async fn set_body(&mut self, body: &str) -> Result<()> {
		let item = self.item.object()?;
		let body = body.to_string();
		surface::offload(&self.surface, move |surface| surface.set_body(item, &body)).await
	}

	/// The recipients list, opened on first use.
	pub async fn recipients(&mut self) -> Result<&Recipients> {
		let recipients = match self.recipients.take() {
			Some(recipients) => recipients,
			None => {
				let item = self.item.object()?;
				let object = surface::offload(&self.surface, move |surface| surface.recipients(item)).await?;
				Recipients::new(RemoteHandle::new(Arc::clone(&self.surface), object, "recipients"))
			}
		};
		Ok(&*self.recipients.insert(recipients))
	}

	/// The attachments list, opened on first use.
	pub async fn attachments(&mut self) -> Result<&Attachments> {
		let attachments = match self.attachments.take() {
			Some(attachments) => attachments,
			None => {
				let item = self.item.object()?;
				let object = surface::offload(&self.surface, move |surface| surface.attachments(item)).await?;
				Attachments::new(RemoteHandle::new(Arc::clone(&self.surface), object, "attachments"))
			}
		};
		Ok(&*self.attachments.insert(attachments))
	}

	pub async fn add_recipient(&mut self, recipient: &str) -> Result<()> {
		self.recipients().await?.add(recipient).await
	}

	pub async fn add_attachment(&mut self, path: &Path) -> Result<()> {
		self.attachments().await?.add(path).await
	}

	/// Sends the item and polls its "sent" flag until `timeout` elapses.
	///
	/// The item is never saved to drafts first. A status error meaning the
	/// item was moved or deleted counts as sent; any other status error is
	/// returned at once without further polling. Remote calls run on blocking
	/// threads and the last sleep ends at the deadline.
	pub async fn send_and_confirm(&self, timeout: Duration) -> Result<SendOutcome> {
		let item = self.item.object()?;
		surface::offload(&self.surface, move |surface| surface.send(item)).await?;
		debug!(target = "olsend.draft", timeout_ms = timeout.as_millis() as u64, "send issued; awaiting confirmation");

		let started = Instant::now();
		let deadline = started + timeout;
		let mut tick = started;
		let mut polls = 0u32;

		while started.elapsed() < timeout {
			polls += 1;
			let surface = Arc::clone(&self.surface);
			let status = tokio::task::spawn_blocking(move || surface.is_sent(item)).await?;

			match status {
				Ok(true) => {
					info!(target = "olsend.draft", polls, elapsed_ms = started.elapsed().as_millis() as u64, "send confirmed");
					return Ok(SendOutcome::Sent);
				}
				Ok(false) => {}
				Err(err) if err.is_item_moved_or_deleted() => {
					info!(target = "olsend.draft", polls, "item left the outbox; treating as sent");
					return Ok(SendOutcome::Sent);
				}
				Err(err) => {
					warn!(target = "olsend.draft", polls, code = err.code, error = %err, "status poll failed");
					return Err(err.into());
				}
			}

			tick += self.poll_interval;
			tokio::time::sleep_until(tick.min(deadline)).await;
		}

		warn!(target = "olsend.draft", polls, timeout_ms = timeout.as_millis() as u64, "send not confirmed in time");
		Ok(SendOutcome::NotConfirmedWithinTimeout)
	}

	/// Releases the collections, then the item. Later calls are no-ops.
	pub fn dispose(&mut self) {
		if let Some(recipients) = self.recipients.as_mut() {
			recipients.dispose();
		}
		if let Some(attachments) = self.attachments.as_mut() {
			attachments.dispose();
		}
		self.item.release();
	}
}

impl fmt::Debug for MailDraft {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("MailDraft")
			.field("item", &self.item)
			.field("recipients", &self.recipients)
			.field("attachments", &self.attachments)
			.finish_non_exhaustive()
	}
}

impl Drop for MailDraft {
	fn drop(&mut self) {
		self.dispose();
	}
}
