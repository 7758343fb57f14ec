//! Mail configuration.
//!
//! All settings are resolved into an explicit [`MailConfig`] passed to the
//! [`Mailer`](crate::Mailer) at construction; there is no ambient or global
//! lookup. The struct deserializes from the host application's settings
//! source with serde, every field defaulting as documented.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Resolved mail settings.
///
/// Read-only after construction; safe to share across concurrent mailer
/// usages.
///
/// # Examples
///
/// ```
/// use mailroom::MailConfig;
///
/// let config = MailConfig::new("smtp.example.com", 465)
///     .with_ssl()
///     .with_credentials("user", "secret")
///     .with_default_sender("noreply@example.com")
///     .with_max_emails(100);
///
/// assert!(config.use_ssl);
/// assert_eq!(config.max_emails, Some(100));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
	/// SMTP server hostname.
	pub server: String,
	/// SMTP server port.
	pub port: u16,
	/// Upgrade the session with STARTTLS after connecting in plaintext.
	pub use_tls: bool,
	/// Connect with implicit TLS from the start.
	pub use_ssl: bool,
	/// PEM client certificate presented during the TLS handshake.
	pub client_cert: Option<PathBuf>,
	/// PEM private key for the client certificate.
	pub client_key: Option<PathBuf>,
	/// Emit debug-level transport logs.
	pub debug: bool,
	/// SMTP username; authentication runs only when both username and
	/// password are present.
	pub username: Option<String>,
	/// SMTP password.
	pub password: Option<String>,
	/// Sender used for messages that do not specify one.
	pub default_sender: Option<String>,
	/// Number of messages to send per transport connection before
	/// transparently reconnecting. `None` means unlimited.
	pub max_emails: Option<usize>,
	/// Never open a network connection; sends become validated no-ops.
	pub suppress_send: bool,
	/// Force attachment filenames to ASCII via NFKD transliteration.
	pub ascii_attachments: bool,
	/// Host application's testing flag; forces suppression regardless of
	/// `suppress_send`.
	pub testing: bool,
	/// Connection timeout in seconds.
	pub timeout: Option<u64>,
	/// Identifier of the owning application, carried on dispatch events.
	pub app_name: String,
}

impl Default for MailConfig {
	fn default() -> Self {
		Self {
			server: "localhost".to_string(),
			port: 25,
			use_tls: false,
			use_ssl: false,
			client_cert: None,
			client_key: None,
			debug: false,
			username: None,
			password: None,
			default_sender: None,
			max_emails: None,
			suppress_send: false,
			ascii_attachments: false,
			testing: false,
			timeout: None,
			app_name: "application".to_string(),
		}
	}
}

impl MailConfig {
	/// Create a configuration for the given server and port, all other
	/// settings at their defaults.
	pub fn new(server: impl Into<String>, port: u16) -> Self {
		Self {
			server: server.into(),
			port,
			..Self::default()
		}
	}

	/// Set username and password for SMTP authentication.
	pub fn with_credentials(
		mut self,
		username: impl Into<String>,
		password: impl Into<String>,
	) -> Self {
		self.username = Some(username.into());
		self.password = Some(password.into());
		self
	}

	/// Enable STARTTLS.
	pub fn with_tls(mut self) -> Self {
		self.use_tls = true;
		self
	}

	/// Enable implicit TLS.
	pub fn with_ssl(mut self) -> Self {
		self.use_ssl = true;
		self
	}

	/// Present a client certificate and key during the TLS handshake.
	pub fn with_client_cert(
		mut self,
		cert: impl Into<PathBuf>,
		key: impl Into<PathBuf>,
	) -> Self {
		self.client_cert = Some(cert.into());
		self.client_key = Some(key.into());
		self
	}

	/// Set the sender used when a message does not specify one.
	pub fn with_default_sender(mut self, sender: impl Into<String>) -> Self {
		self.default_sender = Some(sender.into());
		self
	}

	/// Reconnect the transport after `max` messages.
	pub fn with_max_emails(mut self, max: usize) -> Self {
		self.max_emails = Some(max);
		self
	}

	/// Suppress all network transmission.
	pub fn with_suppress_send(mut self) -> Self {
		self.suppress_send = true;
		self
	}

	/// Mark the host application as testing, which forces suppression.
	pub fn with_testing(mut self) -> Self {
		self.testing = true;
		self
	}

	/// Force attachment filenames to ASCII.
	pub fn with_ascii_attachments(mut self) -> Self {
		self.ascii_attachments = true;
		self
	}

	/// Set the connection timeout in seconds.
	pub fn with_timeout(mut self, seconds: u64) -> Self {
		self.timeout = Some(seconds);
		self
	}

	/// Enable debug-level transport logging.
	pub fn with_debug(mut self) -> Self {
		self.debug = true;
		self
	}

	/// Set the application identifier carried on dispatch events.
	pub fn with_app_name(mut self, name: impl Into<String>) -> Self {
		self.app_name = name.into();
		self
	}

	/// Whether sends are suppressed: the testing flag forces suppression
	/// regardless of the explicit suppress setting.
	pub fn effective_suppression(&self) -> bool {
		self.testing || self.suppress_send
	}
}
