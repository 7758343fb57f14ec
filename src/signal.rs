//! A synchronous, one-to-many publish/subscribe signal.
//!
//! Receivers connect and disconnect explicitly; dispatch is best-effort: a
//! failing receiver is logged and never aborts delivery to the others or the
//! operation that emitted the event.

use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

/// Error returned by a signal receiver. Isolated by [`Signal::send_robust`];
/// never propagated into the emitting call path.
#[derive(Debug, Error)]
pub enum SignalError {
	#[error("receiver failed: {0}")]
	Receiver(String),
}

/// Handle identifying one connected receiver, used to disconnect it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReceiverId(u64);

type ReceiverFn<T> = Arc<dyn Fn(&T) -> Result<(), SignalError> + Send + Sync>;

struct ReceiverEntry<T> {
	id: ReceiverId,
	receiver: ReceiverFn<T>,
}

impl<T> Clone for ReceiverEntry<T> {
	fn clone(&self) -> Self {
		Self {
			id: self.id,
			receiver: Arc::clone(&self.receiver),
		}
	}
}

/// A named signal dispatching events of type `T` to connected receivers.
///
/// Clones share the same receiver list.
///
/// # Examples
///
/// ```
/// use mailroom::Signal;
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// let signal = Signal::<String>::new("greetings");
/// let seen = Arc::new(AtomicUsize::new(0));
///
/// let counter = seen.clone();
/// let receiver = signal.connect(move |_event| {
///     counter.fetch_add(1, Ordering::SeqCst);
///     Ok(())
/// });
///
/// signal.send_robust(&"hello".to_string());
/// assert_eq!(seen.load(Ordering::SeqCst), 1);
///
/// signal.disconnect(receiver);
/// signal.send_robust(&"ignored".to_string());
/// assert_eq!(seen.load(Ordering::SeqCst), 1);
/// ```
pub struct Signal<T> {
	receivers: Arc<RwLock<Vec<ReceiverEntry<T>>>>,
	next_id: Arc<AtomicU64>,
	name: &'static str,
}

impl<T> Signal<T> {
	pub fn new(name: &'static str) -> Self {
		Self {
			receivers: Arc::new(RwLock::new(Vec::new())),
			next_id: Arc::new(AtomicU64::new(0)),
			name,
		}
	}

	/// Connect a receiver; returns the handle needed to disconnect it.
	pub fn connect<F>(&self, receiver: F) -> ReceiverId
	where
		F: Fn(&T) -> Result<(), SignalError> + Send + Sync + 'static,
	{
		let id = ReceiverId(self.next_id.fetch_add(1, Ordering::Relaxed));
		self.receivers.write().push(ReceiverEntry {
			id,
			receiver: Arc::new(receiver),
		});
		id
	}

	/// Disconnect a receiver. Returns whether it was still connected.
	pub fn disconnect(&self, id: ReceiverId) -> bool {
		let mut receivers = self.receivers.write();
		let before = receivers.len();
		receivers.retain(|entry| entry.id != id);
		receivers.len() < before
	}

	/// Deliver `event` to every connected receiver, in connection order.
	///
	/// Receiver failures are logged and swallowed so one misbehaving
	/// listener cannot starve the others or fail the emitting send.
	pub fn send_robust(&self, event: &T) {
		let receivers = self.receivers.read().clone();
		for entry in receivers {
			if let Err(error) = (entry.receiver)(event) {
				tracing::warn!(signal = self.name, %error, "signal receiver failed");
			}
		}
	}

	pub fn receiver_count(&self) -> usize {
		self.receivers.read().len()
	}

	pub fn disconnect_all(&self) {
		self.receivers.write().clear();
	}
}

impl<T> Clone for Signal<T> {
	fn clone(&self) -> Self {
		Self {
			receivers: Arc::clone(&self.receivers),
			next_id: Arc::clone(&self.next_id),
			name: self.name,
		}
	}
}

impl<T> std::fmt::Debug for Signal<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Signal")
			.field("name", &self.name)
			.field("receiver_count", &self.receiver_count())
			.finish()
	}
}
