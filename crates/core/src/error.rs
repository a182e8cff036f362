//! Error types for driving the mail application.

use thiserror::Error;

use crate::surface::SurfaceError;

/// Errors raised while acquiring the application, composing, or sending.
#[derive(Debug, Error)]
pub enum Error {
	/// The automation surface rejected a call. The remote message is shown verbatim.
	#[error(transparent)]
	Remote(#[from] SurfaceError),

	/// A remote handle was used after it had been released.
	#[error("{kind} handle used after release")]
	Released { kind: &'static str },

	/// A background task running blocking automation work panicked or was cancelled.
	#[error("background automation task failed: {0}")]
	Background(#[from] tokio::task::JoinError),
}

impl Error {
	/// Returns the remote error code when this error came from the automation surface.
	pub fn remote_code(&self) -> Option<u32> {
		match self {
			Error::Remote(err) => Some(err.code),
			_ => None,
		}
	}
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
