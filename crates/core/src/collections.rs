//! Append-only recipient and attachment lists of a mail item.

use std::path::Path;

use tracing::debug;

use crate::error::Result;
use crate::handle::RemoteHandle;
use crate::surface;

/// Recipients collection of one mail item.
#[derive(Debug)]
pub struct Recipients {
	handle: RemoteHandle,
}

impl Recipients {
	pub(crate) fn new(handle: RemoteHandle) -> Self {
		Self { handle }
	}

	/// Appends a recipient in any form the application resolves (address or display name).
	pub async fn add(&self, recipient: &str) -> Result<()> {
		let object = self.handle.object()?;
		debug!(target = "olsend.draft", %recipient, "adding recipient");
		let recipient = recipient.to_string();
		surface::offload(self.handle.surface(), move |surface| surface.add_recipient(object, &recipient)).await
	}

	pub fn dispose(&mut self) {
		self.handle.release();
	}
}

/// Attachments collection of one mail item.
#[derive(Debug)]
pub struct Attachments {
	handle: RemoteHandle,
}

impl Attachments {
	pub(crate) fn new(handle: RemoteHandle) -> Self {
		Self { handle }
	}

	/// Attaches the file at `path`. The application reads the file itself.
	pub async fn add(&self, path: &Path) -> Result<()> {
		let object = self.handle.object()?;
		debug!(target = "olsend.draft", path = %path.display(), "adding attachment");
		let path = path.to_path_buf();
		surface::offload(self.handle.surface(), move |surface| surface.add_attachment(object, &path)).await
	}

	pub fn dispose(&mut self) {
		self.handle.release();
	}
}
