//! Dispatch and suppression integration tests
//!
//! Tests the full send path under suppression: validation, sender
//! resolution, dispatch events, the recording outbox, and the bulk
//! connection lifecycle — all without a live SMTP server.

use mailroom::{MailConfig, MailError, Mailer, Message, SignalError};
use rstest::rstest;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn testing_config() -> MailConfig {
	MailConfig::new("localhost", 25)
		.with_default_sender("noreply@example.com")
		.with_testing()
}

fn plain_message(subject: &str) -> Message {
	Message::builder()
		.subject(subject)
		.to(vec!["user@example.com".to_string()])
		.body("hello")
		.build()
}

/// Test: suppressed sends fire one dispatch event per message and never
/// touch the network
#[rstest]
fn test_suppressed_sends_fire_events() {
	// Arrange
	let mailer = Mailer::new(testing_config());
	let dispatched = Arc::new(AtomicUsize::new(0));
	let counter = dispatched.clone();
	mailer.on_dispatch(move |_event| {
		counter.fetch_add(1, Ordering::SeqCst);
		Ok(())
	});

	// Act
	let mut connection = mailer.connect().unwrap();
	for i in 0..5 {
		connection.send(&plain_message(&format!("message {}", i))).unwrap();
	}

	// Assert
	assert!(!connection.is_live());
	assert_eq!(dispatched.load(Ordering::SeqCst), 5);
}

/// Test: the outbox records exactly the messages dispatched inside its scope
#[rstest]
fn test_outbox_scoped_recording() {
	// Arrange
	let mailer = Mailer::new(testing_config());
	mailer.send(&plain_message("before the scope")).unwrap();

	// Act
	let recorded = {
		let outbox = mailer.record_messages();
		mailer.send(&plain_message("testing")).unwrap();
		outbox.outbox()
	};
	mailer.send(&plain_message("after the scope")).unwrap();

	// Assert
	assert_eq!(recorded.len(), 1);
	assert_eq!(recorded.get(0).unwrap().subject(), "testing");
}

/// Test: header injection is rejected even when the send is suppressed
#[rstest]
fn test_validation_precedes_suppression() {
	// Arrange
	let mailer = Mailer::new(testing_config());
	let outbox = mailer.record_messages();
	let message = Message::builder()
		.subject("Evil\r\nBcc: attacker@evil.com")
		.to(vec!["user@example.com".to_string()])
		.build();

	// Act
	let result = mailer.send(&message);

	// Assert
	assert!(matches!(result, Err(MailError::HeaderInjection(_))));
	assert!(outbox.is_empty());
}

/// Test: a client-supplied Message-ID cannot smuggle extra headers
#[rstest]
fn test_message_id_injection_rejected() {
	// Arrange
	let mailer = Mailer::new(testing_config());
	let outbox = mailer.record_messages();
	let message = Message::builder()
		.subject("hi")
		.to(vec!["user@example.com".to_string()])
		.message_id("<x@y>\r\nBcc: attacker@evil.com")
		.build();

	// Act
	let result = mailer.send(&message);

	// Assert
	assert!(matches!(result, Err(MailError::HeaderInjection(_))));
	assert!(outbox.is_empty());
}

/// Test: injected recipient addresses are rejected
#[rstest]
fn test_recipient_injection_rejected() {
	// Arrange
	let mailer = Mailer::new(testing_config());
	let message = Message::builder()
		.subject("hi")
		.to(vec!["user@example.com\nBcc: attacker@evil.com".to_string()])
		.build();

	// Act
	let result = mailer.send(&message);

	// Assert
	assert!(matches!(result, Err(MailError::HeaderInjection(_))));
}

/// Test: a message without recipients fails before anything else
#[rstest]
fn test_no_recipients_rejected() {
	// Arrange
	let mailer = Mailer::new(testing_config());
	let message = Message::builder().subject("empty").build();

	// Act
	let result = mailer.send(&message);

	// Assert
	assert!(matches!(result, Err(MailError::NoRecipients)));
}

/// Test: without a sender or default sender the send fails; the
/// configured default fills in otherwise
#[rstest]
fn test_sender_resolution() {
	// Arrange
	let without_default = Mailer::new(MailConfig::new("localhost", 25).with_testing());
	let with_default = Mailer::new(testing_config());
	let outbox = with_default.record_messages();

	// Act
	let missing = without_default.send(&plain_message("no sender"));
	let resolved = with_default.send(&plain_message("default sender"));

	// Assert
	assert!(matches!(missing, Err(MailError::MissingSender)));
	resolved.unwrap();
	assert_eq!(outbox.len(), 1);
}

/// Test: an explicit message sender wins over the configured default
#[rstest]
fn test_explicit_sender_wins() {
	// Arrange
	let mailer = Mailer::new(testing_config());
	let outbox = mailer.record_messages();
	let message = Message::builder()
		.subject("signed")
		.sender(("Alerts", "alerts@example.com"))
		.to(vec!["user@example.com".to_string()])
		.build();

	// Act
	mailer.send(&message).unwrap();

	// Assert
	let recorded = outbox.get(0).unwrap();
	assert_eq!(
		recorded.sender().unwrap().as_str(),
		"Alerts <alerts@example.com>"
	);
}

/// Test: a failing dispatch listener does not fail the send or starve
/// other listeners
#[rstest]
fn test_listener_error_isolation() {
	// Arrange
	let mailer = Mailer::new(testing_config());
	mailer.on_dispatch(|_event| Err(SignalError::Receiver("listener broke".to_string())));
	let seen = Arc::new(AtomicUsize::new(0));
	let counter = seen.clone();
	mailer.on_dispatch(move |_event| {
		counter.fetch_add(1, Ordering::SeqCst);
		Ok(())
	});

	// Act
	let result = mailer.send(&plain_message("resilient"));

	// Assert
	result.unwrap();
	assert_eq!(seen.load(Ordering::SeqCst), 1);
}

/// Test: the per-connection send limit resets the counter without
/// disturbing dispatch order
#[rstest]
fn test_max_emails_preserves_order() {
	// Arrange
	let config = testing_config().with_max_emails(2);
	let mailer = Mailer::new(config);
	let subjects = Arc::new(Mutex::new(Vec::new()));
	let sink = subjects.clone();
	mailer.on_dispatch(move |event| {
		sink.lock().unwrap().push(event.message.subject().to_string());
		Ok(())
	});

	// Act
	let mut connection = mailer.connect().unwrap();
	for i in 0..5 {
		connection.send(&plain_message(&format!("bulk {}", i))).unwrap();
	}

	// Assert
	assert_eq!(connection.sent_since_connect(), 1);
	assert_eq!(
		*subjects.lock().unwrap(),
		vec!["bulk 0", "bulk 1", "bulk 2", "bulk 3", "bulk 4"]
	);
}

/// Test: send_message builds and dispatches in one call
#[rstest]
fn test_send_message_builder_path() {
	// Arrange
	let mailer = Mailer::new(testing_config());
	let outbox = mailer.record_messages();

	// Act
	mailer
		.send_message(
			Message::builder()
				.subject("built inline")
				.to(vec!["user@example.com".to_string()])
				.body("hi"),
		)
		.unwrap();

	// Assert
	assert_eq!(outbox.get(0).unwrap().subject(), "built inline");
}

/// Test: dispatch events carry the configured application name
#[rstest]
fn test_event_app_name() {
	// Arrange
	let mailer = Mailer::new(testing_config().with_app_name("billing"));
	let names = Arc::new(Mutex::new(Vec::new()));
	let sink = names.clone();
	mailer.on_dispatch(move |event| {
		sink.lock().unwrap().push(event.app_name.clone());
		Ok(())
	});

	// Act
	mailer.send(&plain_message("invoice")).unwrap();

	// Assert
	assert_eq!(*names.lock().unwrap(), vec!["billing"]);
}

/// Test: send_with_envelope validates and dispatches under suppression
#[rstest]
fn test_send_with_envelope_suppressed() {
	// Arrange
	let mailer = Mailer::new(testing_config());
	let outbox = mailer.record_messages();
	let mut connection = mailer.connect().unwrap();

	// Act
	connection
		.send_with_envelope(&plain_message("bounced elsewhere"), Some("bounces@example.com"))
		.unwrap();

	// Assert
	assert_eq!(outbox.len(), 1);
}

/// Test: suppress_send alone suppresses, independent of the testing flag
#[rstest]
fn test_suppress_send_without_testing() {
	// Arrange
	let config = MailConfig::new("localhost", 25)
		.with_default_sender("noreply@example.com")
		.with_suppress_send();
	let mailer = Mailer::new(config);
	let outbox = mailer.record_messages();

	// Act
	let connection = mailer.connect().unwrap();
	drop(connection);
	mailer.send(&plain_message("quietly")).unwrap();

	// Assert
	assert_eq!(outbox.len(), 1);
}
