//! Owned references to remote automation objects.

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::error::{Error, Result};
use crate::surface::{AutomationSurface, ObjectId};

/// Sole owner of one remote object reference.
///
/// The reference is handed back to the surface exactly once: on
/// [`release`](Self::release) or on drop, whichever comes first. After
/// release, [`object`](Self::object) fails with [`Error::Released`].
pub struct RemoteHandle {
	surface: Arc<dyn AutomationSurface>,
	object: Option<ObjectId>,
	kind: &'static str,
}

impl RemoteHandle {
	pub(crate) fn new(surface: Arc<dyn AutomationSurface>, object: ObjectId, kind: &'static str) -> Self {
		trace!(target = "olsend.handle", %object, kind, "acquired");
		Self {
			surface,
			object: Some(object),
			kind,
		}
	}

	/// The remote object, or [`Error::Released`] once released.
	pub fn object(&self) -> Result<ObjectId> {
		self.object.ok_or(Error::Released { kind: self.kind })
	}

	pub(crate) fn surface(&self) -> &Arc<dyn AutomationSurface> {
		&self.surface
	}

	pub fn kind(&self) -> &'static str {
		self.kind
	}

	pub fn is_released(&self) -> bool {
		self.object.is_none()
	}

	/// Hands the reference back to the surface. Later calls are no-ops.
	pub fn release(&mut self) {
		if let Some(object) = self.object.take() {
			trace!(target = "olsend.handle", %object, kind = self.kind, "released");
			self.surface.release(object);
		}
	}

	/// Gives up ownership without releasing the remote reference.
	///
	/// Used when releasing could strand the application in a worse state than
	/// keeping the reference alive.
	pub fn leak(mut self) -> Option<ObjectId> {
		let object = self.object.take();
		trace!(target = "olsend.handle", object = ?object, kind = self.kind, "leaked");
		object
	}
}

impl Drop for RemoteHandle {
	fn drop(&mut self) {
		self.release();
	}
}

impl fmt::Debug for RemoteHandle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RemoteHandle").field("kind", &self.kind).field("object", &self.object).finish()
	}
}
