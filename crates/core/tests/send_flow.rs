//! End-to-end send flows against the scripted surface and process table.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use olsend::surface::fake::{Call, ScriptedSurface};
use olsend::surface::{E_ITEM_MOVED_OR_DELETED, SurfaceError};
use olsend::{Delivery, MailRequest, Mailer, MailerConfig, ProcessRef, SendOutcome, ShutdownOutcome};
use olsend_runtime::fake::FakeProcessTable;

fn init_tracing() {
	let _ = tracing_subscriber::fmt().with_test_writer().with_env_filter("olsend=debug").try_init();
}

fn fast_config() -> MailerConfig {
	MailerConfig {
		send_timeout_ms: 200,
		poll_interval_ms: 20,
		..Default::default()
	}
}

#[tokio::test]
async fn send_records_exactly_what_was_asked() {
	init_tracing();
	let surface = Arc::new(ScriptedSurface::new().with_running_instance());
	let processes = Arc::new(FakeProcessTable::new());
	let mailer = Mailer::new(surface.clone(), processes.clone(), MailerConfig::default());

	let sent = mailer.send_simple("a@x.com", "S", "B", &[PathBuf::from("f1.txt")]).await.expect("send should succeed");

	assert!(sent);
	assert_eq!(surface.recipients_added(), vec!["a@x.com"]);
	assert_eq!(surface.attachments_added(), vec![PathBuf::from("f1.txt")]);
	assert_eq!(surface.count(&Call::SetSubject("S".into())), 1);
	assert_eq!(surface.count(&Call::SetBody("B".into())), 1);
	assert_eq!(surface.polls(), 1);

	let calls = surface.calls();
	let position = |wanted: &Call| calls.iter().position(|c| c == wanted).expect("call should be recorded");
	assert!(position(&Call::AddRecipient("a@x.com".into())) < position(&Call::SetSubject("S".into())));
	assert!(position(&Call::SetSubject("S".into())) < position(&Call::SetBody("B".into())));
	assert!(position(&Call::SetBody("B".into())) < position(&Call::AddAttachment("f1.txt".into())));
	assert!(position(&Call::AddAttachment("f1.txt".into())) < position(&Call::Send));

	assert_eq!(surface.live_objects(), 0);
	assert!(surface.double_releases().is_empty());
}

#[tokio::test]
async fn unconfirmed_send_is_not_an_error() {
	init_tracing();
	let surface = Arc::new(ScriptedSurface::new().with_running_instance());
	surface.set_default_status(Ok(false));
	let processes = Arc::new(FakeProcessTable::new());
	let mailer = Mailer::new(surface.clone(), processes, fast_config());

	let delivery = mailer.send(&MailRequest::new("a@x.com", "S", "B")).await.expect("timeout is not an error");

	assert_eq!(delivery, Delivery::Attempted(SendOutcome::NotConfirmedWithinTimeout));
	assert!(!delivery.confirmed());
	assert!(surface.polls() >= 1);
	assert_eq!(surface.live_objects(), 0);
}

#[tokio::test]
async fn moved_item_confirms_send() {
	init_tracing();
	let surface = Arc::new(ScriptedSurface::new().with_running_instance());
	surface.push_status(Ok(false));
	surface.push_status(Err(SurfaceError::new(E_ITEM_MOVED_OR_DELETED, "The item has been moved or deleted.")));
	let mailer = Mailer::new(surface.clone(), Arc::new(FakeProcessTable::new()), fast_config());

	assert!(mailer.send_simple("a@x.com", "S", "B", &[]).await.unwrap());
	assert_eq!(surface.polls(), 2);
}

#[tokio::test]
async fn launched_instance_is_shut_down_after_send() {
	init_tracing();
	let stranger = ProcessRef::new(100, 1);
	let ours = ProcessRef::new(200, 2);
	let surface = Arc::new(ScriptedSurface::new());
	let processes = Arc::new(FakeProcessTable::with_launch(vec![stranger], vec![stranger, ours]));
	let mailer = Mailer::new(surface.clone(), processes.clone(), MailerConfig::default());

	assert!(mailer.send_simple("a@x.com", "S", "B", &[]).await.unwrap());
	assert_eq!(mailer.drain_shutdowns().await, vec![ShutdownOutcome::Exited]);

	assert_eq!(processes.waits(), vec![(ours, Duration::from_millis(5000))]);
	assert_eq!(surface.count(&Call::Quit), 1);
	assert_eq!(surface.live_objects(), 0);
}

#[tokio::test]
async fn stuck_launched_instance_is_left_visible() {
	init_tracing();
	let ours = ProcessRef::new(200, 2);
	let surface = Arc::new(ScriptedSurface::new());
	let processes = Arc::new(FakeProcessTable::with_launch(vec![], vec![ours]));
	processes.set_exits(false);
	let mailer = Mailer::new(surface.clone(), processes.clone(), MailerConfig::default());

	let sent = mailer.send_simple("a@x.com", "S", "B", &[]).await.unwrap();

	assert!(sent, "send result does not depend on shutdown");
	assert_eq!(mailer.drain_shutdowns().await, vec![ShutdownOutcome::LeftRunning]);
	assert_eq!(surface.count(&Call::DisplayInbox), 1);
	assert_eq!(surface.live_objects(), 1, "application reference stays with the running instance");
}

#[tokio::test]
async fn concurrent_sends_each_get_a_session() {
	init_tracing();
	let surface = Arc::new(ScriptedSurface::new().with_running_instance());
	let mailer = Arc::new(Mailer::new(surface.clone(), Arc::new(FakeProcessTable::new()), fast_config()));

	let mut tasks = Vec::new();
	for n in 0..4 {
		let mailer = Arc::clone(&mailer);
		tasks.push(tokio::spawn(async move { mailer.send_simple(&format!("user{n}@x.com"), "S", "B", &[]).await }));
	}
	for task in tasks {
		assert!(task.await.unwrap().unwrap());
	}

	assert_eq!(surface.count(&Call::Lookup), 4);
	assert_eq!(surface.recipients_added().len(), 4);
	assert_eq!(surface.live_objects(), 0);
}
