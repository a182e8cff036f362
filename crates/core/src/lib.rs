//! Send mail by driving an installed desktop mail application.
//!
//! The crate never speaks a mail protocol. It attaches to (or launches) the
//! application through an [`AutomationSurface`], composes one item, sends it,
//! and polls until the application reports it sent. What it does carefully is
//! manage the application's lifetime:
//!
//! - an instance that was already running is only detached from;
//! - an instance this crate launched is identified by diffing process
//!   snapshots and, at the end, asked to quit and waited on;
//! - an instance that ignores the quit is never killed, only brought to the
//!   foreground.
//!
//! # Example
//!
//! ```ignore
//! let mailer = Mailer::new(surface, Arc::new(SystemProcessTable::new()), MailerConfig::default());
//! let request = MailRequest::new("a@x.com", "Report", "Attached.").with_attachment("report.pdf");
//! match mailer.send(&request).await? {
//!     Delivery::Attempted(SendOutcome::Sent) => println!("sent"),
//!     Delivery::Attempted(SendOutcome::NotConfirmedWithinTimeout) => println!("not confirmed"),
//!     Delivery::Unavailable => println!("no mail application"),
//! }
//! mailer.drain_shutdowns().await;
//! ```

pub mod collections;
pub mod config;
pub mod draft;
pub mod error;
pub mod handle;
pub mod mailer;
pub mod session;
pub mod surface;

pub use collections::{Attachments, Recipients};
pub use config::MailerConfig;
pub use draft::{MailDraft, SendOutcome};
pub use error::{Error, Result};
pub use handle::RemoteHandle;
pub use mailer::{Delivery, MailRequest, Mailer};
pub use olsend_runtime::{ProcessRef, ProcessTable, SystemProcessTable};
pub use session::{ApplicationSession, PendingShutdown, SessionState, ShutdownOutcome, ShutdownTask};
pub use surface::{AutomationSurface, ObjectId, SurfaceError};
