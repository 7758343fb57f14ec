//! # Mailroom
//!
//! SMTP mail dispatch for web applications.
//!
//! Mailroom is a thin layer over an SMTP transport that covers the parts a
//! web application actually needs when it sends mail:
//!
//! - **Message building**: subject, sender, To/Cc/Bcc, plain and HTML bodies,
//!   attachments, custom headers
//! - **Scoped bulk sending**: one [`Connection`] amortizes the SMTP handshake
//!   across many sends and transparently reconnects after a configurable
//!   number of messages
//! - **Send suppression**: with the testing or suppress flag set, no network
//!   connection is ever opened, but every send is still validated and
//!   dispatched to observers
//! - **Recording outbox**: a scoped recorder that captures dispatched
//!   messages for test assertions
//! - **Header-injection protection**: CR/LF in subject, sender or recipient
//!   fields is a terminal validation error, checked before any network I/O
//!
//! ## Sending a message
//!
//! ```rust,no_run
//! use mailroom::{MailConfig, Mailer, Message};
//!
//! # fn main() -> Result<(), mailroom::MailError> {
//! let config = MailConfig::new("smtp.example.com", 587)
//!     .with_tls()
//!     .with_credentials("user", "password")
//!     .with_default_sender("noreply@example.com");
//!
//! let mailer = Mailer::new(config);
//!
//! let message = Message::builder()
//!     .subject("Welcome!")
//!     .to(vec!["user@example.com".to_string()])
//!     .body("Welcome to our service")
//!     .build();
//!
//! mailer.send(&message)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Bulk sending over one connection
//!
//! ```rust,no_run
//! use mailroom::{MailConfig, Mailer, Message};
//!
//! # fn main() -> Result<(), mailroom::MailError> {
//! let mailer = Mailer::new(MailConfig::new("smtp.example.com", 25));
//!
//! let mut connection = mailer.connect()?;
//! for user in ["a@example.com", "b@example.com"] {
//!     let message = Message::builder()
//!         .subject("Newsletter")
//!         .sender("news@example.com")
//!         .to(vec![user.to_string()])
//!         .body("Content")
//!         .build();
//!     connection.send(&message)?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Recording messages in tests
//!
//! ```rust
//! use mailroom::{MailConfig, Mailer, Message};
//!
//! # fn main() -> Result<(), mailroom::MailError> {
//! let config = MailConfig::new("localhost", 25)
//!     .with_default_sender("noreply@example.com")
//!     .with_testing();
//!
//! let mailer = Mailer::new(config);
//!
//! let outbox = mailer.record_messages();
//! mailer.send_message(
//!     Message::builder()
//!         .subject("testing")
//!         .to(vec!["a@example.com".to_string()])
//!         .body("test"),
//! )?;
//! assert_eq!(outbox.len(), 1);
//! assert_eq!(outbox.get(0).unwrap().subject(), "testing");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod connection;
pub mod mailer;
pub mod message;
pub mod outbox;
pub mod serialize;
pub mod signal;
pub mod validation;

use thiserror::Error;

pub use config::MailConfig;
pub use connection::Connection;
pub use mailer::{Mailer, MessageDispatched};
pub use message::{Attachment, Message, MessageBuilder, Sender};
pub use outbox::{Outbox, OutboxGuard};
pub use serialize::TransportMessage;
pub use signal::{ReceiverId, Signal, SignalError};

/// Errors raised by message validation and the SMTP transport.
///
/// Validation errors surface before any network I/O; transport errors are
/// raised to the caller untouched and are never retried internally.
#[derive(Debug, Error)]
pub enum MailError {
	#[error("message has no sender and no default sender is configured")]
	MissingSender,

	#[error("message has no recipients")]
	NoRecipients,

	#[error("header injection attempt detected in {0}")]
	HeaderInjection(String),

	#[error("invalid header name: {0}")]
	InvalidHeader(String),

	#[error("invalid email address: {0}")]
	InvalidAddress(String),

	#[error("SMTP error: {0}")]
	Smtp(#[from] lettre::transport::smtp::Error),

	#[error("envelope error: {0}")]
	Envelope(#[from] lettre::error::Error),

	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
}

pub type MailResult<T> = std::result::Result<T, MailError>;
