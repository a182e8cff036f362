//! The narrow automation interface consumed from the external mail application.
//!
//! A concrete binding (native interop, a typed client, a scripting bridge)
//! implements [`AutomationSurface`]; nothing else in this crate depends on how
//! the calls reach the application. Remote objects are named by [`ObjectId`]
//! and must be handed back through [`AutomationSurface::release`] exactly once,
//! which [`RemoteHandle`](crate::handle::RemoteHandle) takes care of.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

pub mod fake;

/// "Operation unavailable": no running instance is registered.
pub const MK_E_UNAVAILABLE: u32 = 0x8004_01E3;

/// "The item has been moved or deleted": the draft was consumed by a send.
pub const E_ITEM_MOVED_OR_DELETED: u32 = 0x8004_010A;

/// Opaque reference to one object living in the application's process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(pub u64);

impl fmt::Display for ObjectId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

/// Failure reported by the automation surface.
///
/// Displays the remote message unchanged; the numeric code is kept for
/// classification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SurfaceError {
	pub code: u32,
	pub message: String,
}

impl SurfaceError {
	pub fn new(code: u32, message: impl Into<String>) -> Self {
		Self {
			code,
			message: message.into(),
		}
	}

	/// No running instance was found; launching a new one is appropriate.
	pub fn is_not_running(&self) -> bool {
		self.code == MK_E_UNAVAILABLE
	}

	/// The item was moved or deleted, which for a sent draft means it left the outbox.
	pub fn is_item_moved_or_deleted(&self) -> bool {
		self.code == E_ITEM_MOVED_OR_DELETED
	}
}

pub type SurfaceResult<T> = std::result::Result<T, SurfaceError>;

/// Remote-control interface of the external mail application.
///
/// Calls are synchronous and may block on the application; async callers
/// offload them to blocking threads.
pub trait AutomationSurface: Send + Sync {
	/// Whether the application is installed and scriptable on this machine.
	fn is_available(&self) -> bool;

	/// Attaches to an already running instance. Fails with [`MK_E_UNAVAILABLE`]
	/// when none is registered.
	fn lookup_running_instance(&self) -> SurfaceResult<ObjectId>;

	/// Starts a new instance through the application's registered activation path.
	fn activate_new_instance(&self) -> SurfaceResult<ObjectId>;

	/// Opens the named mail-store session ("namespace") of an application.
	fn get_namespace(&self, application: ObjectId, name: &str) -> SurfaceResult<ObjectId>;

	/// Creates a new mail-composition item.
	fn create_mail_item(&self, application: ObjectId) -> SurfaceResult<ObjectId>;

	/// Asks the application to exit. Returns without waiting for it to do so.
	fn quit(&self, application: ObjectId) -> SurfaceResult<()>;

	/// Brings the default inbox of a session to the foreground.
	fn display_default_inbox(&self, namespace: ObjectId) -> SurfaceResult<()>;

	fn recipients(&self, item: ObjectId) -> SurfaceResult<ObjectId>;
	fn attachments(&self, item: ObjectId) -> SurfaceResult<ObjectId>;
	fn add_recipient(&self, recipients: ObjectId, recipient: &str) -> SurfaceResult<()>;
	fn add_attachment(&self, attachments: ObjectId, path: &Path) -> SurfaceResult<()>;

	fn subject(&self, item: ObjectId) -> SurfaceResult<String>;
	fn set_subject(&self, item: ObjectId, subject: &str) -> SurfaceResult<()>;
	fn body(&self, item: ObjectId) -> SurfaceResult<String>;
	fn set_body(&self, item: ObjectId, body: &str) -> SurfaceResult<()>;

	/// Queues the item for sending. The application completes the send asynchronously.
	fn send(&self, item: ObjectId) -> SurfaceResult<()>;

	/// Reads the item's "sent" flag.
	fn is_sent(&self, item: ObjectId) -> SurfaceResult<bool>;

	/// Drops this process's reference to a remote object. Called once per object.
	fn release(&self, object: ObjectId);
}

/// Runs one surface call on a blocking thread so the caller's executor keeps running.
pub(crate) async fn offload<T, F>(surface: &Arc<dyn AutomationSurface>, call: F) -> crate::error::Result<T>
where
	T: Send + 'static,
	F: FnOnce(&dyn AutomationSurface) -> SurfaceResult<T> + Send + 'static,
{
	let surface = Arc::clone(surface);
	Ok(tokio::task::spawn_blocking(move || call(surface.as_ref())).await??)
}
