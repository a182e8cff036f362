//! Attach to a running application or launch one and work out whether we own it.

use olsend_runtime::{ProcessRef, ProcessTable, spawned_process};
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::surface::{AutomationSurface, ObjectId, SurfaceResult};

/// Serializes attach-or-launch within this process so concurrent sessions do
/// not read each other's launches in the process-snapshot diff.
static ACQUIRE_LOCK: Mutex<()> = parking_lot::const_mutex(());

/// How the application handle was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquisition {
	/// An instance was already running; it belongs to someone else.
	Attached(ObjectId),
	/// A new instance was activated. `owned` is the process it started, when
	/// exactly one new process appeared.
	Launched { application: ObjectId, owned: Option<ProcessRef> },
}

impl Acquisition {
	pub fn application(&self) -> ObjectId {
		match *self {
			Acquisition::Attached(application) => application,
			Acquisition::Launched { application, .. } => application,
		}
	}

	pub fn owned_process(&self) -> Option<ProcessRef> {
		match *self {
			Acquisition::Attached(_) => None,
			Acquisition::Launched { owned, .. } => owned,
		}
	}
}

/// Looks up a running instance, launching a new one only when none is running.
///
/// Blocks on the surface and the process table. Lookup errors other than
/// "not running" are returned without launching.
pub(crate) fn attach_or_launch(surface: &dyn AutomationSurface, processes: &dyn ProcessTable, process_name: &str) -> SurfaceResult<Acquisition> {
	let _guard = ACQUIRE_LOCK.lock();

	match surface.lookup_running_instance() {
		Ok(application) => {
			info!(target = "olsend.session", %application, "attached to running instance");
			Ok(Acquisition::Attached(application))
		}
		Err(err) if err.is_not_running() => {
			debug!(target = "olsend.session", %process_name, "no running instance; launching");
			let before = processes.list_by_name(process_name);
			let application = surface.activate_new_instance()?;
			let after = processes.list_by_name(process_name);

			let owned = spawned_process(&before, &after);
			match owned {
				Some(process) => info!(target = "olsend.session", %application, pid = process.pid, "launched instance; process owned"),
				None => info!(
					target = "olsend.session",
					%application,
					before = before.len(),
					after = after.len(),
					"launched instance; owning process not identifiable"
				),
			}
			Ok(Acquisition::Launched { application, owned })
		}
		Err(err) => Err(err),
	}
}

#[cfg(test)]
mod tests {
	use olsend_runtime::fake::FakeProcessTable;

	use super::*;
	use crate::surface::SurfaceError;
	use crate::surface::fake::{Call, ScriptedSurface};

	fn refs(pids: &[u32]) -> Vec<ProcessRef> {
		pids.iter().map(|&pid| ProcessRef::new(pid, 100)).collect()
	}

	fn launch_with(before: &[u32], after: &[u32]) -> Acquisition {
		let surface = ScriptedSurface::new();
		let processes = FakeProcessTable::with_launch(refs(before), refs(after));
		attach_or_launch(&surface, &processes, "outlook").unwrap()
	}

	#[test]
	fn running_instance_is_attached_without_snapshots() {
		let surface = ScriptedSurface::new().with_running_instance();
		let processes = FakeProcessTable::new();

		let acquisition = attach_or_launch(&surface, &processes, "outlook").unwrap();

		assert!(matches!(acquisition, Acquisition::Attached(_)));
		assert!(processes.listed().is_empty());
		assert_eq!(surface.count(&Call::Activate), 0);
	}

	#[test]
	fn launch_snapshots_around_activation() {
		let surface = ScriptedSurface::new();
		let processes = FakeProcessTable::with_launch(vec![], refs(&[7]));

		attach_or_launch(&surface, &processes, "outlook").unwrap();

		assert_eq!(processes.listed(), vec!["outlook", "outlook"]);
		assert_eq!(surface.calls(), vec![Call::Lookup, Call::Activate]);
	}

	#[test]
	fn ownership_follows_number_of_new_processes() {
		assert_eq!(launch_with(&[1], &[1]).owned_process(), None);
		assert_eq!(launch_with(&[1], &[1, 2]).owned_process(), Some(ProcessRef::new(2, 100)));
		assert_eq!(launch_with(&[1], &[1, 2, 3]).owned_process(), None);
		assert_eq!(launch_with(&[], &[10, 11, 12, 13, 14, 15]).owned_process(), None);
	}

	#[test]
	fn other_lookup_errors_do_not_launch() {
		let surface = ScriptedSurface::new().with_lookup_error(SurfaceError::new(0x8007_0005, "Access is denied."));
		let processes = FakeProcessTable::new();

		let err = attach_or_launch(&surface, &processes, "outlook").unwrap_err();

		assert_eq!(err.message, "Access is denied.");
		assert_eq!(surface.count(&Call::Activate), 0);
		assert!(processes.listed().is_empty());
	}

	#[test]
	fn activation_failure_is_returned() {
		let surface = ScriptedSurface::new();
		surface.fail(crate::surface::fake::Operation::Activate, SurfaceError::new(0x8008_0005, "Server execution failed"));
		let processes = FakeProcessTable::new();

		let err = attach_or_launch(&surface, &processes, "outlook").unwrap_err();

		assert_eq!(err.code, 0x8008_0005);
	}
}
