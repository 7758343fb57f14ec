//! A scoped wrapper around one live SMTP session.
//!
//! The connection amortizes the handshake and authentication cost across
//! many sends and transparently reconnects after a configured number of
//! messages. While suppression is active the transport is a no-op stand-in
//! and no network connection is attempted at all.

use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Identity, Tls, TlsParameters};
use lettre::{SmtpTransport, Transport};
use std::sync::Arc;
use std::time::Duration;

use crate::config::MailConfig;
use crate::mailer::MessageDispatched;
use crate::message::{Message, MessageBuilder};
use crate::signal::Signal;
use crate::validation::validate_message;
use crate::{MailError, MailResult, serialize};

/// One SMTP session, exclusively owned by the scope that opened it.
///
/// Obtained from [`Mailer::connect`](crate::Mailer::connect). Messages sent
/// through one connection are transmitted in call order; the transport is
/// closed when the connection is dropped, on every exit path.
pub struct Connection {
	config: Arc<MailConfig>,
	signal: Signal<MessageDispatched>,
	transport: Option<SmtpTransport>,
	sent: usize,
}

impl Connection {
	/// Open a connection, eagerly establishing (and authenticating) the
	/// transport unless suppression is active.
	pub(crate) fn open(
		config: Arc<MailConfig>,
		signal: Signal<MessageDispatched>,
	) -> MailResult<Self> {
		let transport = if config.effective_suppression() {
			tracing::debug!(app = %config.app_name, "send suppression active, skipping SMTP connection");
			None
		} else {
			Some(Self::connect_transport(&config)?)
		};

		Ok(Self {
			config,
			signal,
			transport,
			sent: 0,
		})
	}

	fn connect_transport(config: &MailConfig) -> MailResult<SmtpTransport> {
		let mut builder =
			SmtpTransport::builder_dangerous(config.server.as_str()).port(config.port);

		if config.use_ssl || config.use_tls {
			let mut tls = TlsParameters::builder(config.server.clone());
			if let (Some(cert), Some(key)) = (&config.client_cert, &config.client_key) {
				let cert_pem = std::fs::read(cert)?;
				let key_pem = std::fs::read(key)?;
				tls = tls.identify_with(Identity::from_pem(&cert_pem, &key_pem)?);
			}
			let params = tls.build()?;
			// use_ssl selects implicit TLS; use_tls upgrades via STARTTLS
			builder = builder.tls(if config.use_ssl {
				Tls::Wrapper(params)
			} else {
				Tls::Required(params)
			});
		}

		if let (Some(username), Some(password)) = (&config.username, &config.password) {
			builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
		}

		if let Some(seconds) = config.timeout {
			builder = builder.timeout(Some(Duration::from_secs(seconds)));
		}

		let transport = builder.build();
		// Surface connect/TLS/auth failures here rather than on first send
		transport.test_connection()?;

		if config.debug {
			tracing::debug!(
				server = %config.server,
				port = config.port,
				"SMTP connection established"
			);
		}

		Ok(transport)
	}

	/// Validate, serialize and send one message.
	///
	/// Validation runs before the suppression decision, so an invalid
	/// message fails identically whether or not a real transmission would
	/// follow. After a successful send the message-dispatched event fires,
	/// and the transport reconnects transparently once the configured
	/// per-connection send count is reached.
	pub fn send(&mut self, message: &Message) -> MailResult<()> {
		self.send_with_envelope(message, None)
	}

	/// Like [`send`](Self::send), but overriding the address used in the
	/// transport-level `MAIL FROM` command.
	pub fn send_with_envelope(
		&mut self,
		message: &Message,
		envelope_from: Option<&str>,
	) -> MailResult<()> {
		let sender = message
			.sender()
			.map(|s| s.as_str().to_string())
			.or_else(|| self.config.default_sender.clone())
			.ok_or(MailError::MissingSender)?;

		validate_message(message, &sender)?;

		let transport_message =
			serialize::serialize(message, &sender, envelope_from, &self.config)?;

		if let Some(transport) = &self.transport {
			transport.send_raw(&transport_message.envelope, &transport_message.raw)?;
			if self.config.debug {
				tracing::debug!(message_id = message.message_id(), "message transmitted");
			}
		}

		self.signal.send_robust(&MessageDispatched {
			message: Arc::new(message.clone()),
			app_name: self.config.app_name.clone(),
		});

		self.sent += 1;
		if let Some(max) = self.config.max_emails
			&& max > 0 && self.sent >= max
		{
			self.sent = 0;
			if self.transport.is_some() {
				if self.config.debug {
					tracing::debug!(
						server = %self.config.server,
						"per-connection send limit reached, reconnecting"
					);
				}
				self.transport = Some(Self::connect_transport(&self.config)?);
			}
		}

		Ok(())
	}

	/// Build a message from the given builder and send it.
	pub fn send_message(&mut self, builder: MessageBuilder) -> MailResult<()> {
		self.send(&builder.build())
	}

	/// Messages sent since the transport last (re)connected.
	pub fn sent_since_connect(&self) -> usize {
		self.sent
	}

	/// Whether a real transport is held (false while suppression is
	/// active).
	pub fn is_live(&self) -> bool {
		self.transport.is_some()
	}
}

impl Drop for Connection {
	fn drop(&mut self) {
		if self.transport.take().is_some() && self.config.debug {
			tracing::debug!(server = %self.config.server, "SMTP connection closed");
		}
	}
}
