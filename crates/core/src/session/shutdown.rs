//! Quit-then-wait shutdown of an application instance this session launched.
//!
//! The quit request is unreliable, so shutdown is an explicit sequence:
//! ask the application to quit, wait a bounded time for the owned process to
//! exit, and if it does not, leave it running and bring its inbox to the
//! foreground. The process is never killed: forced termination risks
//! corrupting the application's mail store.

use std::sync::Arc;
use std::time::Duration;

use olsend_runtime::{ProcessRef, ProcessTable};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::SessionState;
use crate::handle::RemoteHandle;
use crate::surface::{AutomationSurface, ObjectId};

/// How disposal of a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
	/// No application handle was ever acquired.
	NothingHeld,
	/// The instance belonged to someone else; only our references were released.
	Released,
	/// The launched process exited after the quit request.
	Exited,
	/// The launched process outlived the wait; its inbox was shown and the
	/// application reference intentionally kept.
	LeftRunning,
}

/// Shutdown of an owned instance, handed off by [`ApplicationSession::dispose`](super::ApplicationSession::dispose).
///
/// Dropping it without running releases the application reference, leaves
/// the process alone, and marks the session disposed.
pub struct PendingShutdown {
	surface: Arc<dyn AutomationSurface>,
	processes: Arc<dyn ProcessTable>,
	application: Option<RemoteHandle>,
	process: ProcessRef,
	namespace: String,
	wait: Duration,
	state: Arc<Mutex<SessionState>>,
}

impl PendingShutdown {
	pub(super) fn new(
		surface: Arc<dyn AutomationSurface>,
		processes: Arc<dyn ProcessTable>,
		application: RemoteHandle,
		process: ProcessRef,
		namespace: String,
		wait: Duration,
		state: Arc<Mutex<SessionState>>,
	) -> Self {
		Self {
			surface,
			processes,
			application: Some(application),
			process,
			namespace,
			wait,
			state,
		}
	}

	/// The process this shutdown waits on.
	pub fn process(&self) -> ProcessRef {
		self.process
	}

	/// Runs the shutdown on the current thread. Blocks for up to the wait bound.
	pub fn run(mut self) -> ShutdownOutcome {
		self.quit_and_wait()
	}

	/// Runs the shutdown on a blocking thread of the ambient tokio runtime.
	pub fn spawn(self) -> ShutdownTask {
		ShutdownTask {
			process: self.process,
			join: tokio::task::spawn_blocking(move || self.run()),
		}
	}

	fn quit_and_wait(&mut self) -> ShutdownOutcome {
		let Some(application) = self.application.as_ref().and_then(|handle| handle.object().ok()) else {
			return ShutdownOutcome::Released;
		};

		info!(target = "olsend.session", process = %self.process, wait_ms = self.wait.as_millis() as u64, "requesting quit");
		if let Err(err) = self.surface.quit(application) {
			warn!(target = "olsend.session", code = err.code, error = %err, "quit request failed; waiting anyway");
		}

		if self.processes.wait_for_exit(&self.process, self.wait) {
			info!(target = "olsend.session", process = %self.process, "application exited");
			if let Some(mut handle) = self.application.take() {
				handle.release();
			}
			return ShutdownOutcome::Exited;
		}

		warn!(
			target = "olsend.session",
			process = %self.process,
			"application did not exit; leaving it running with the inbox shown"
		);
		self.show_inbox(application);
		if let Some(handle) = self.application.take() {
			handle.leak();
		}
		ShutdownOutcome::LeftRunning
	}

	fn show_inbox(&self, application: ObjectId) {
		let namespace = match self.surface.get_namespace(application, &self.namespace) {
			Ok(namespace) => RemoteHandle::new(Arc::clone(&self.surface), namespace, "namespace"),
			Err(err) => {
				warn!(target = "olsend.session", code = err.code, error = %err, "could not reopen session to show inbox");
				return;
			}
		};

		if let Ok(object) = namespace.object() {
			if let Err(err) = self.surface.display_default_inbox(object) {
				warn!(target = "olsend.session", code = err.code, error = %err, "could not display inbox");
			}
		}
	}
}

impl Drop for PendingShutdown {
	fn drop(&mut self) {
		*self.state.lock() = SessionState::Disposed;
	}
}

impl std::fmt::Debug for PendingShutdown {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("PendingShutdown")
			.field("application", &self.application)
			.field("process", &self.process)
			.field("wait", &self.wait)
			.finish_non_exhaustive()
	}
}

/// A shutdown running in the background.
#[derive(Debug)]
pub struct ShutdownTask {
	process: ProcessRef,
	join: JoinHandle<ShutdownOutcome>,
}

impl ShutdownTask {
	pub fn process(&self) -> ProcessRef {
		self.process
	}

	pub fn is_finished(&self) -> bool {
		self.join.is_finished()
	}

	/// Waits for the shutdown to finish. Never fails: a crashed shutdown is
	/// logged and reported as [`ShutdownOutcome::LeftRunning`].
	pub async fn wait(self) -> ShutdownOutcome {
		match self.join.await {
			Ok(outcome) => outcome,
			Err(err) => {
				warn!(target = "olsend.session", process = %self.process, error = %err, "shutdown task failed");
				ShutdownOutcome::LeftRunning
			}
		}
	}
}
