//! Application session: attach-or-launch, ownership, and disposal.
//!
//! A session holds the top-level application reference, the mail-store
//! session ("namespace") reference, and, when it launched the application
//! itself, the identity of the process it started. Only that exact process
//! is ever asked to go away; an instance someone else started is merely
//! detached from.

mod acquire;
mod shutdown;

use std::fmt;
use std::sync::Arc;

use olsend_runtime::{ProcessRef, ProcessTable};
use parking_lot::Mutex;
use tracing::{debug, warn};

pub use acquire::Acquisition;
pub use shutdown::{PendingShutdown, ShutdownOutcome, ShutdownTask};

use crate::config::MailerConfig;
use crate::draft::MailDraft;
use crate::error::{Error, Result};
use crate::handle::RemoteHandle;
use crate::surface::{self, AutomationSurface, ObjectId};

/// Lifecycle of an [`ApplicationSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
	/// No application reference acquired yet.
	Idle,
	/// References held.
	Active,
	/// An owned instance is being asked to quit.
	ShuttingDown,
	Disposed,
}

/// Per-send connection to the mail application.
pub struct ApplicationSession {
	surface: Arc<dyn AutomationSurface>,
	processes: Arc<dyn ProcessTable>,
	config: MailerConfig,
	application: Option<RemoteHandle>,
	namespace: Option<RemoteHandle>,
	owned_process: Option<ProcessRef>,
	state: Arc<Mutex<SessionState>>,
}

impl ApplicationSession {
	pub fn new(surface: Arc<dyn AutomationSurface>, processes: Arc<dyn ProcessTable>, config: MailerConfig) -> Self {
		Self {
			surface,
			processes,
			config,
			application: None,
			namespace: None,
			owned_process: None,
			state: Arc::new(Mutex::new(SessionState::Idle)),
		}
	}

	pub fn state(&self) -> SessionState {
		*self.state.lock()
	}

	/// The process this session launched and is responsible for, if any.
	pub fn owned_process(&self) -> Option<ProcessRef> {
		self.owned_process
	}

	/// Attaches to a running instance or launches one. Cached after the first success.
	pub async fn acquire_application(&mut self) -> Result<ObjectId> {
		if let Some(application) = &self.application {
			return application.object();
		}
		self.ensure_open()?;

		let surface = Arc::clone(&self.surface);
		let processes = Arc::clone(&self.processes);
		let process_name = self.config.process_name.clone();
		let acquisition =
			tokio::task::spawn_blocking(move || acquire::attach_or_launch(surface.as_ref(), processes.as_ref(), &process_name)).await??;

		let application = acquisition.application();
		self.owned_process = acquisition.owned_process();
		self.application = Some(RemoteHandle::new(Arc::clone(&self.surface), application, "application"));
		*self.state.lock() = SessionState::Active;
		Ok(application)
	}

	/// Opens the mail-store session, acquiring the application first if needed. Idempotent.
	pub async fn ensure_namespace(&mut self) -> Result<ObjectId> {
		if let Some(namespace) = &self.namespace {
			return namespace.object();
		}

		let application = self.acquire_application().await?;
		let name = self.config.namespace.clone();
		let namespace = surface::offload(&self.surface, move |surface| surface.get_namespace(application, &name)).await?;
		debug!(target = "olsend.session", %namespace, name = %self.config.namespace, "namespace opened");
		self.namespace = Some(RemoteHandle::new(Arc::clone(&self.surface), namespace, "namespace"));
		Ok(namespace)
	}

	/// Creates a new mail item under this session.
	pub async fn create_mail_item(&mut self) -> Result<MailDraft> {
		self.ensure_namespace().await?;
		let application = self.acquire_application().await?;
		let item = surface::offload(&self.surface, move |surface| surface.create_mail_item(application)).await?;
		debug!(target = "olsend.session", %item, "mail item created");

		Ok(MailDraft::new(
			Arc::clone(&self.surface),
			RemoteHandle::new(Arc::clone(&self.surface), item, "mail item"),
			self.config.poll_interval(),
		))
	}

	/// Starts disposal. Entered once; later calls return `None`.
	///
	/// The namespace is released first. An attached instance has its
	/// reference released and nothing else. A launched instance is handed to
	/// the returned [`PendingShutdown`], which must be run (or spawned) to
	/// request the quit and wait for the process.
	pub fn dispose(&mut self) -> Option<PendingShutdown> {
		match self.state() {
			SessionState::ShuttingDown | SessionState::Disposed => return None,
			SessionState::Idle | SessionState::Active => {}
		}

		if let Some(mut namespace) = self.namespace.take() {
			namespace.release();
		}

		let Some(mut application) = self.application.take() else {
			*self.state.lock() = SessionState::Disposed;
			return None;
		};

		let Some(process) = self.owned_process else {
			debug!(target = "olsend.session", "detaching from instance we did not start");
			application.release();
			*self.state.lock() = SessionState::Disposed;
			return None;
		};

		*self.state.lock() = SessionState::ShuttingDown;
		Some(PendingShutdown::new(
			Arc::clone(&self.surface),
			Arc::clone(&self.processes),
			application,
			process,
			self.config.namespace.clone(),
			self.config.quit_wait(),
			Arc::clone(&self.state),
		))
	}

	/// Disposes and waits for any pending shutdown to finish.
	pub async fn shutdown(&mut self) -> ShutdownOutcome {
		let held = self.application.is_some();
		match self.dispose() {
			Some(pending) => pending.spawn().wait().await,
			None if held => ShutdownOutcome::Released,
			None => ShutdownOutcome::NothingHeld,
		}
	}

	fn ensure_open(&self) -> Result<()> {
		match self.state() {
			SessionState::Idle | SessionState::Active => Ok(()),
			SessionState::ShuttingDown | SessionState::Disposed => Err(Error::Released { kind: "application session" }),
		}
	}
}

impl Drop for ApplicationSession {
	fn drop(&mut self) {
		let Some(pending) = self.dispose() else {
			return;
		};

		warn!(target = "olsend.session", process = %pending.process(), "session dropped without disposal; shutting down");
		if tokio::runtime::Handle::try_current().is_ok() {
			drop(pending.spawn());
		} else {
			pending.run();
		}
	}
}

impl fmt::Debug for ApplicationSession {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ApplicationSession")
			.field("state", &self.state())
			.field("application", &self.application)
			.field("namespace", &self.namespace)
			.field("owned_process", &self.owned_process)
			.finish_non_exhaustive()
	}
}
