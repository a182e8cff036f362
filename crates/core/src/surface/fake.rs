//! Scripted automation surface for tests and dry runs.
//!
//! Records every call in order, tracks which objects are live, and answers
//! status polls from a queue.
//!
//! ```ignore
//! let surface = Arc::new(ScriptedSurface::new());
//! surface.push_status(Ok(false));
//! surface.push_status(Err(SurfaceError::new(E_ITEM_MOVED_OR_DELETED, "moved")));
//! let mailer = Mailer::new(surface.clone(), processes, MailerConfig::default());
//! ```

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::time::Duration;

use parking_lot::Mutex;

use super::{AutomationSurface, MK_E_UNAVAILABLE, ObjectId, SurfaceError, SurfaceResult};

/// Surface operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
	Activate,
	GetNamespace,
	CreateMailItem,
	Quit,
	DisplayInbox,
	Recipients,
	Attachments,
	AddRecipient,
	AddAttachment,
	SetSubject,
	SetBody,
	Send,
}

/// One recorded call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
	Lookup,
	Activate,
	GetNamespace(String),
	CreateMailItem,
	Quit,
	DisplayInbox,
	Recipients,
	Attachments,
	AddRecipient(String),
	AddAttachment(PathBuf),
	SetSubject(String),
	SetBody(String),
	Send,
	IsSent,
	Release(ObjectId),
}

#[derive(Debug)]
struct State {
	available: bool,
	running: Option<SurfaceResult<()>>,
	next_id: u64,
	live: HashSet<ObjectId>,
	double_releases: Vec<ObjectId>,
	calls: Vec<Call>,
	failures: HashMap<Operation, SurfaceError>,
	statuses: VecDeque<SurfaceResult<bool>>,
	default_status: SurfaceResult<bool>,
	status_latency: Duration,
	subjects: HashMap<ObjectId, String>,
	bodies: HashMap<ObjectId, String>,
}

/// In-memory [`AutomationSurface`] driven by a script.
///
/// Defaults: available, no running instance (lookup fails with
/// [`MK_E_UNAVAILABLE`]), every call succeeds, and the first status poll
/// reports the item as sent.
#[derive(Debug)]
pub struct ScriptedSurface {
	state: Mutex<State>,
}

impl ScriptedSurface {
	pub fn new() -> Self {
		Self {
			state: Mutex::new(State {
				available: true,
				running: None,
				next_id: 1,
				live: HashSet::new(),
				double_releases: Vec::new(),
				calls: Vec::new(),
				failures: HashMap::new(),
				statuses: VecDeque::new(),
				default_status: Ok(true),
				status_latency: Duration::ZERO,
				subjects: HashMap::new(),
				bodies: HashMap::new(),
			}),
		}
	}

	/// Reports the application as not installed.
	pub fn unavailable() -> Self {
		let surface = Self::new();
		surface.state.lock().available = false;
		surface
	}

	/// Makes `lookup_running_instance` attach to an existing instance.
	pub fn with_running_instance(self) -> Self {
		self.state.lock().running = Some(Ok(()));
		self
	}

	/// Makes `lookup_running_instance` fail with `error`.
	pub fn with_lookup_error(self, error: SurfaceError) -> Self {
		self.state.lock().running = Some(Err(error));
		self
	}

	/// Makes every call of `operation` fail with `error`.
	pub fn fail(&self, operation: Operation, error: SurfaceError) {
		self.state.lock().failures.insert(operation, error);
	}

	/// Queues the result of the next `is_sent` poll.
	pub fn push_status(&self, status: SurfaceResult<bool>) {
		self.state.lock().statuses.push_back(status);
	}

	/// Result returned once queued statuses run out.
	pub fn set_default_status(&self, status: SurfaceResult<bool>) {
		self.state.lock().default_status = status;
	}

	/// Makes each `is_sent` poll block the calling thread for `latency`.
	pub fn set_status_latency(&self, latency: Duration) {
		self.state.lock().status_latency = latency;
	}

	/// Every call made so far, in order.
	pub fn calls(&self) -> Vec<Call> {
		self.state.lock().calls.clone()
	}

	/// Number of recorded calls equal to `call`.
	pub fn count(&self, call: &Call) -> usize {
		self.state.lock().calls.iter().filter(|c| *c == call).count()
	}

	/// Number of `is_sent` polls.
	pub fn polls(&self) -> usize {
		self.count(&Call::IsSent)
	}

	/// Recipients added, in order.
	pub fn recipients_added(&self) -> Vec<String> {
		self.filter_calls(|call| match call {
			Call::AddRecipient(r) => Some(r.clone()),
			_ => None,
		})
	}

	/// Attachments added, in order.
	pub fn attachments_added(&self) -> Vec<PathBuf> {
		self.filter_calls(|call| match call {
			Call::AddAttachment(p) => Some(p.clone()),
			_ => None,
		})
	}

	/// Objects handed out and not yet released.
	pub fn live_objects(&self) -> usize {
		self.state.lock().live.len()
	}

	/// Objects released more than once, or never handed out.
	pub fn double_releases(&self) -> Vec<ObjectId> {
		self.state.lock().double_releases.clone()
	}

	fn filter_calls<T>(&self, pick: impl Fn(&Call) -> Option<T>) -> Vec<T> {
		self.state.lock().calls.iter().filter_map(pick).collect()
	}

	fn record(&self, call: Call, operation: Operation) -> SurfaceResult<()> {
		let mut state = self.state.lock();
		state.calls.push(call);
		match state.failures.get(&operation) {
			Some(err) => Err(err.clone()),
			None => Ok(()),
		}
	}

	fn allocate(&self) -> ObjectId {
		let mut state = self.state.lock();
		let id = ObjectId(state.next_id);
		state.next_id += 1;
		state.live.insert(id);
		id
	}

	fn create(&self, call: Call, operation: Operation) -> SurfaceResult<ObjectId> {
		self.record(call, operation)?;
		Ok(self.allocate())
	}
}

impl Default for ScriptedSurface {
	fn default() -> Self {
		Self::new()
	}
}

impl AutomationSurface for ScriptedSurface {
	fn is_available(&self) -> bool {
		self.state.lock().available
	}

	fn lookup_running_instance(&self) -> SurfaceResult<ObjectId> {
		let running = {
			let mut state = self.state.lock();
			state.calls.push(Call::Lookup);
			state.running.clone()
		};
		match running {
			Some(Ok(())) => Ok(self.allocate()),
			Some(Err(err)) => Err(err),
			None => Err(SurfaceError::new(MK_E_UNAVAILABLE, "Operation unavailable")),
		}
	}

	fn activate_new_instance(&self) -> SurfaceResult<ObjectId> {
		self.create(Call::Activate, Operation::Activate)
	}

	fn get_namespace(&self, _application: ObjectId, name: &str) -> SurfaceResult<ObjectId> {
		self.create(Call::GetNamespace(name.to_string()), Operation::GetNamespace)
	}

	fn create_mail_item(&self, _application: ObjectId) -> SurfaceResult<ObjectId> {
		self.create(Call::CreateMailItem, Operation::CreateMailItem)
	}

	fn quit(&self, _application: ObjectId) -> SurfaceResult<()> {
		self.record(Call::Quit, Operation::Quit)
	}

	fn display_default_inbox(&self, _namespace: ObjectId) -> SurfaceResult<()> {
		self.record(Call::DisplayInbox, Operation::DisplayInbox)
	}

	fn recipients(&self, _item: ObjectId) -> SurfaceResult<ObjectId> {
		self.create(Call::Recipients, Operation::Recipients)
	}

	fn attachments(&self, _item: ObjectId) -> SurfaceResult<ObjectId> {
		self.create(Call::Attachments, Operation::Attachments)
	}

	fn add_recipient(&self, _recipients: ObjectId, recipient: &str) -> SurfaceResult<()> {
		self.record(Call::AddRecipient(recipient.to_string()), Operation::AddRecipient)
	}

	fn add_attachment(&self, _attachments: ObjectId, path: &Path) -> SurfaceResult<()> {
		self.record(Call::AddAttachment(path.to_path_buf()), Operation::AddAttachment)
	}

	fn subject(&self, item: ObjectId) -> SurfaceResult<String> {
		Ok(self.state.lock().subjects.get(&item).cloned().unwrap_or_default())
	}

	fn set_subject(&self, item: ObjectId, subject: &str) -> SurfaceResult<()> {
		self.record(Call::SetSubject(subject.to_string()), Operation::SetSubject)?;
		self.state.lock().subjects.insert(item, subject.to_string());
		Ok(())
	}

	fn body(&self, item: ObjectId) -> SurfaceResult<String> {
		Ok(self.state.lock().bodies.get(&item).cloned().unwrap_or_default())
	}

	fn set_body(&self, item: ObjectId, body: &str) -> SurfaceResult<()> {
		self.record(Call::SetBody(body.to_string()), Operation::SetBody)?;
		self.state.lock().bodies.insert(item, body.to_string());
		Ok(())
	}

	fn send(&self, _item: ObjectId) -> SurfaceResult<()> {
		self.record(Call::Send, Operation::Send)
	}

	fn is_sent(&self, _item: ObjectId) -> SurfaceResult<bool> {
		let latency = self.state.lock().status_latency;
		if !latency.is_zero() {
			std::thread::sleep(latency);
		}

		let mut state = self.state.lock();
		state.calls.push(Call::IsSent);
		match state.statuses.pop_front() {
			Some(status) => status,
			None => state.default_status.clone(),
		}
	}

	fn release(&self, object: ObjectId) {
		let mut state = self.state.lock();
		state.calls.push(Call::Release(object));
		if !state.live.remove(&object) {
			state.double_releases.push(object);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn lookup_without_running_instance_reports_unavailable() {
		let surface = ScriptedSurface::new();
		let err = surface.lookup_running_instance().unwrap_err();
		assert!(err.is_not_running());
		assert_eq!(surface.calls(), vec![Call::Lookup]);
	}

	#[test]
	fn lookup_with_running_instance_records_once() {
		let surface = ScriptedSurface::new().with_running_instance();
		let id = surface.lookup_running_instance().unwrap();
		assert_eq!(surface.calls(), vec![Call::Lookup]);
		assert_eq!(surface.live_objects(), 1);
		surface.release(id);
		assert_eq!(surface.live_objects(), 0);
	}

	#[test]
	fn releasing_twice_is_flagged() {
		let surface = ScriptedSurface::new();
		let id = surface.activate_new_instance().unwrap();
		surface.release(id);
		surface.release(id);
		assert_eq!(surface.double_releases(), vec![id]);
	}

	#[test]
	fn statuses_drain_before_default() {
		let surface = ScriptedSurface::new();
		surface.push_status(Ok(false));
		assert_eq!(surface.is_sent(ObjectId(1)), Ok(false));
		assert_eq!(surface.is_sent(ObjectId(1)), Ok(true));
		assert_eq!(surface.polls(), 2);
	}

	#[test]
	fn injected_failure_is_returned() {
		let surface = ScriptedSurface::new();
		surface.fail(Operation::Send, SurfaceError::new(0x8000_4005, "blocked"));
		assert_eq!(surface.send(ObjectId(3)).unwrap_err().message, "blocked");
	}
}
