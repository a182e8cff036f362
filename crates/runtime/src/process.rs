//! Process snapshots and exit waits for the automated mail application.

use std::fmt;
use std::time::{Duration, Instant};

use sysinfo::{Pid, ProcessesToUpdate, System};
use tracing::{debug, trace};

/// Interval between liveness checks while waiting for a process to exit.
const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Identity of one OS process.
///
/// Process ids are recycled by the OS, so identity is the pair of pid and
/// start time (seconds since the epoch). Two refs with the same pid but a
/// different start time name different processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProcessRef {
	pub pid: u32,
	pub start_time: u64,
}

impl ProcessRef {
	pub fn new(pid: u32, start_time: u64) -> Self {
		Self { pid, start_time }
	}
}

impl fmt::Display for ProcessRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "pid {} (started {})", self.pid, self.start_time)
	}
}

/// OS process management consumed by the application session.
///
/// Both operations block the calling thread; callers on an async runtime
/// should run them through `spawn_blocking`.
pub trait ProcessTable: Send + Sync {
	/// Lists running processes whose executable name matches `name`.
	fn list_by_name(&self, name: &str) -> Vec<ProcessRef>;

	/// Waits up to `timeout` for `process` to exit. Returns `true` once the
	/// exact (pid, start time) pair is gone.
	fn wait_for_exit(&self, process: &ProcessRef, timeout: Duration) -> bool;
}

/// Returns the single process present in `after` but not in `before`.
///
/// Zero or several new processes yield `None`: ownership cannot be
/// attributed when the launch is ambiguous.
pub fn spawned_process(before: &[ProcessRef], after: &[ProcessRef]) -> Option<ProcessRef> {
	let mut fresh = after.iter().filter(|candidate| !before.contains(candidate));
	let first = fresh.next()?;
	match fresh.next() {
		Some(second) => {
			debug!(target = "olsend.process", first = %first, second = %second, "several new processes; ownership ambiguous");
			None
		}
		None => Some(*first),
	}
}

/// Returns `true` when `candidate` names the same executable as `wanted`.
///
/// Matching is case-insensitive and ignores a trailing `.exe`, so `outlook`
/// matches `OUTLOOK.EXE`.
pub fn name_matches(candidate: &str, wanted: &str) -> bool {
	fn stem(name: &str) -> &str {
		let len = name.len();
		if len > 4 && name.is_char_boundary(len - 4) && name[len - 4..].eq_ignore_ascii_case(".exe") {
			&name[..len - 4]
		} else {
			name
		}
	}

	stem(candidate).eq_ignore_ascii_case(stem(wanted))
}

/// [`ProcessTable`] backed by the live OS process list.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProcessTable;

impl SystemProcessTable {
	pub fn new() -> Self {
		Self
	}

	fn refreshed() -> System {
		let mut system = System::new();
		system.refresh_processes(ProcessesToUpdate::All, true);
		system
	}

	fn is_running(system: &mut System, process: &ProcessRef) -> bool {
		let pid = Pid::from_u32(process.pid);
		system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
		system.process(pid).is_some_and(|found| found.start_time() == process.start_time)
	}
}

impl ProcessTable for SystemProcessTable {
	fn list_by_name(&self, name: &str) -> Vec<ProcessRef> {
		let system = Self::refreshed();
		let found: Vec<ProcessRef> = system
			.processes()
			.values()
			// Linux lists every thread as a task carrying the parent's name.
			.filter(|process| process.thread_kind().is_none())
			.filter(|process| name_matches(&process.name().to_string_lossy(), name))
			.map(|process| ProcessRef::new(process.pid().as_u32(), process.start_time()))
			.collect();
		trace!(target = "olsend.process", %name, count = found.len(), "process snapshot");
		found
	}

	fn wait_for_exit(&self, process: &ProcessRef, timeout: Duration) -> bool {
		let deadline = Instant::now() + timeout;
		let mut system = System::new();

		loop {
			if !Self::is_running(&mut system, process) {
				debug!(target = "olsend.process", process = %process, "process exited");
				return true;
			}

			let now = Instant::now();
			if now >= deadline {
				return false;
			}
			std::thread::sleep(EXIT_POLL_INTERVAL.min(deadline - now));
		}
	}
}
