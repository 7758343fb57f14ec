//! The dispatcher facade: holds the configuration and the dispatch signal,
//! and hands out connections.

use std::sync::Arc;

use crate::config::MailConfig;
use crate::connection::Connection;
use crate::message::{Message, MessageBuilder};
use crate::outbox::OutboxGuard;
use crate::signal::{ReceiverId, Signal, SignalError};
use crate::MailResult;

/// Event emitted after each successful dispatch, including suppressed ones.
#[derive(Debug, Clone)]
pub struct MessageDispatched {
	/// The dispatched message.
	pub message: Arc<Message>,
	/// The configured application name the dispatching mailer belongs to.
	pub app_name: String,
}

/// The central entry point for sending mail.
///
/// Construction never touches the network; connections are opened lazily by
/// [`connect`](Self::connect) or per-call by [`send`](Self::send). Cloning is
/// cheap and clones share the dispatch signal and configuration.
///
/// # Examples
///
/// ```no_run
/// use mailroom::{MailConfig, Mailer, Message};
///
/// # fn main() -> Result<(), mailroom::MailError> {
/// let config = MailConfig::new("smtp.example.com", 587)
///     .with_tls()
///     .with_credentials("user", "secret")
///     .with_default_sender("noreply@example.com");
/// let mailer = Mailer::new(config);
///
/// mailer.send_message(
///     Message::builder()
///         .subject("Welcome")
///         .to(vec!["new-user@example.com".to_string()])
///         .body("Thanks for signing up!"),
/// )?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Mailer {
	config: Arc<MailConfig>,
	dispatched: Signal<MessageDispatched>,
}

impl Mailer {
	pub fn new(config: MailConfig) -> Self {
		Self {
			config: Arc::new(config),
			dispatched: Signal::new("message-dispatched"),
		}
	}

	pub fn config(&self) -> &MailConfig {
		&self.config
	}

	/// Open a connection for bulk sending.
	///
	/// The transport connects and authenticates eagerly, so configuration
	/// and credential problems surface here instead of on the first send.
	/// Under suppression no connection is attempted and every send through
	/// the returned connection is a local no-op that still fires events.
	pub fn connect(&self) -> MailResult<Connection> {
		Connection::open(Arc::clone(&self.config), self.dispatched.clone())
	}

	/// Send a single message over a dedicated short-lived connection.
	pub fn send(&self, message: &Message) -> MailResult<()> {
		let mut connection = self.connect()?;
		connection.send(message)
	}

	/// Build a message from the given builder and send it.
	pub fn send_message(&self, builder: MessageBuilder) -> MailResult<()> {
		self.send(&builder.build())
	}

	/// Start recording dispatched messages into an [`Outbox`].
	///
	/// Recording lasts until the returned guard is dropped.
	///
	/// [`Outbox`]: crate::Outbox
	pub fn record_messages(&self) -> OutboxGuard {
		OutboxGuard::new(self.dispatched.clone())
	}

	/// Subscribe to dispatch events. Returns the handle needed to
	/// unsubscribe via [`off_dispatch`](Self::off_dispatch).
	pub fn on_dispatch<F>(&self, receiver: F) -> ReceiverId
	where
		F: Fn(&MessageDispatched) -> Result<(), SignalError> + Send + Sync + 'static,
	{
		self.dispatched.connect(receiver)
	}

	/// Unsubscribe a dispatch listener. Returns whether it was still
	/// connected.
	pub fn off_dispatch(&self, id: ReceiverId) -> bool {
		self.dispatched.disconnect(id)
	}
}
