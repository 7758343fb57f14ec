//! The recording outbox: a scoped subscriber that captures every dispatched
//! message for later inspection, used in tests instead of a live mail
//! server.

use parking_lot::RwLock;
use std::ops::Deref;
use std::sync::Arc;

use crate::mailer::MessageDispatched;
use crate::message::Message;
use crate::signal::{ReceiverId, Signal};

/// An ordered, append-only record of dispatched messages.
///
/// Appended to by the dispatch event path while a recording scope is active;
/// intended to be read after the scope ends.
#[derive(Debug, Clone, Default)]
pub struct Outbox {
	messages: Arc<RwLock<Vec<Arc<Message>>>>,
}

impl Outbox {
	pub fn len(&self) -> usize {
		self.messages.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.messages.read().is_empty()
	}

	/// The recorded message at `index`, in dispatch order.
	pub fn get(&self, index: usize) -> Option<Arc<Message>> {
		self.messages.read().get(index).cloned()
	}

	/// Snapshot of every recorded message, in dispatch order.
	pub fn messages(&self) -> Vec<Arc<Message>> {
		self.messages.read().clone()
	}

	pub fn clear(&self) {
		self.messages.write().clear();
	}

	pub(crate) fn push(&self, message: Arc<Message>) {
		self.messages.write().push(message);
	}
}

/// Scoped recording of dispatched messages.
///
/// Subscribes to the dispatch signal on acquisition and unsubscribes when
/// dropped, on every exit path. Obtained from
/// [`Mailer::record_messages`](crate::Mailer::record_messages); nesting
/// scopes on the same mailer is not supported.
///
/// # Examples
///
/// ```
/// use mailroom::{MailConfig, Mailer, Message};
///
/// # fn main() -> Result<(), mailroom::MailError> {
/// let mailer = Mailer::new(MailConfig::new("localhost", 25).with_testing());
///
/// let outbox = mailer.record_messages();
/// mailer.send_message(
///     Message::builder()
///         .subject("testing")
///         .sender("me@example.com")
///         .to(vec!["a@example.com".to_string()])
///         .body("test"),
/// )?;
///
/// assert_eq!(outbox.len(), 1);
/// assert_eq!(outbox.get(0).unwrap().subject(), "testing");
/// # Ok(())
/// # }
/// ```
pub struct OutboxGuard {
	outbox: Outbox,
	signal: Signal<MessageDispatched>,
	receiver: ReceiverId,
}

impl OutboxGuard {
	pub(crate) fn new(signal: Signal<MessageDispatched>) -> Self {
		let outbox = Outbox::default();
		let sink = outbox.clone();
		let receiver = signal.connect(move |event: &MessageDispatched| {
			sink.push(Arc::clone(&event.message));
			Ok(())
		});

		Self {
			outbox,
			signal,
			receiver,
		}
	}

	/// A handle to the underlying outbox that outlives the recording scope.
	pub fn outbox(&self) -> Outbox {
		self.outbox.clone()
	}
}

impl Deref for OutboxGuard {
	type Target = Outbox;

	fn deref(&self) -> &Outbox {
		&self.outbox
	}
}

impl Drop for OutboxGuard {
	fn drop(&mut self) {
		self.signal.disconnect(self.receiver);
	}
}
