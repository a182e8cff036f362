//! Scripted process table for exercising ownership and shutdown logic
//! without real processes.
//!
//! ```ignore
//! let table = FakeProcessTable::new();
//! table.push_snapshot(vec![]);
//! table.push_snapshot(vec![ProcessRef::new(42, 1)]);
//! table.set_exits(false);
//! ```

use std::collections::VecDeque;
use std::time::Duration;

use parking_lot::Mutex;

use crate::process::{ProcessRef, ProcessTable};

/// In-memory [`ProcessTable`] returning queued snapshots.
///
/// Each `list_by_name` call pops the next queued snapshot; once the queue is
/// empty the last snapshot is repeated. Waits never sleep: they return the
/// configured exit result immediately and are recorded for inspection.
#[derive(Debug)]
pub struct FakeProcessTable {
	inner: Mutex<Inner>,
}

#[derive(Debug)]
struct Inner {
	snapshots: VecDeque<Vec<ProcessRef>>,
	last: Vec<ProcessRef>,
	exits: bool,
	listed: Vec<String>,
	waits: Vec<(ProcessRef, Duration)>,
}

impl FakeProcessTable {
	pub fn new() -> Self {
		Self {
			inner: Mutex::new(Inner {
				snapshots: VecDeque::new(),
				last: Vec::new(),
				exits: true,
				listed: Vec::new(),
				waits: Vec::new(),
			}),
		}
	}

	/// Builds a table that reports `before` then `after`, the shape of one
	/// launch.
	pub fn with_launch(before: Vec<ProcessRef>, after: Vec<ProcessRef>) -> Self {
		let table = Self::new();
		table.push_snapshot(before);
		table.push_snapshot(after);
		table
	}

	/// Queues the result of a future `list_by_name` call.
	pub fn push_snapshot(&self, snapshot: Vec<ProcessRef>) {
		self.inner.lock().snapshots.push_back(snapshot);
	}

	/// Sets whether waited-on processes exit within the bound.
	pub fn set_exits(&self, exits: bool) {
		self.inner.lock().exits = exits;
	}

	/// Names passed to `list_by_name`, in call order.
	pub fn listed(&self) -> Vec<String> {
		self.inner.lock().listed.clone()
	}

	/// Processes waited on, with the bound used, in call order.
	pub fn waits(&self) -> Vec<(ProcessRef, Duration)> {
		self.inner.lock().waits.clone()
	}
}

impl Default for FakeProcessTable {
	fn default() -> Self {
		Self::new()
	}
}

impl ProcessTable for FakeProcessTable {
	fn list_by_name(&self, name: &str) -> Vec<ProcessRef> {
		let mut inner = self.inner.lock();
		inner.listed.push(name.to_string());
		if let Some(next) = inner.snapshots.pop_front() {
			inner.last = next;
		}
		inner.last.clone()
	}

	fn wait_for_exit(&self, process: &ProcessRef, timeout: Duration) -> bool {
		let mut inner = self.inner.lock();
		inner.waits.push((*process, timeout));
		inner.exits
	}
}
