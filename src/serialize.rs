//! RFC 5322 serialization of a [`Message`] into a transport-ready form.
//!
//! Produces the raw header-and-body bytes together with the transport
//! envelope. The header block deliberately omits Bcc — some relays forward a
//! visible Bcc header to recipients — while the envelope recipient list still
//! carries every Bcc address.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::Utc;
use lettre::address::Envelope;
use uuid::Uuid;

use crate::config::MailConfig;
use crate::message::{Attachment, Message};
use crate::validation::{ascii_filename, envelope_address};
use crate::MailResult;

/// A serialized message: envelope plus raw RFC 5322 bytes.
#[derive(Debug, Clone)]
pub struct TransportMessage {
	pub envelope: Envelope,
	pub raw: Vec<u8>,
}

/// Serialize `message` with the already-resolved sender.
///
/// `envelope_from`, when given, replaces the sender in the transport
/// envelope only; the From header keeps the resolved sender.
pub fn serialize(
	message: &Message,
	sender: &str,
	envelope_from: Option<&str>,
	config: &MailConfig,
) -> MailResult<TransportMessage> {
	let envelope = build_envelope(message, envelope_from.unwrap_or(sender))?;
	let raw = encode(message, sender, config)?;
	Ok(TransportMessage { envelope, raw })
}

fn build_envelope(message: &Message, from: &str) -> MailResult<Envelope> {
	let from = envelope_address(from)?;
	let recipients = message
		.send_to()
		.into_iter()
		.map(envelope_address)
		.collect::<MailResult<Vec<_>>>()?;
	Ok(Envelope::new(Some(from), recipients)?)
}

fn encode(message: &Message, sender: &str, config: &MailConfig) -> MailResult<Vec<u8>> {
	let mut out = Vec::new();

	if !message.subject().is_empty() {
		write_header(&mut out, "Subject", &encode_header_value(message.subject()));
	}
	write_header(&mut out, "From", &encode_mailbox(sender));

	let to: Vec<String> = message.recipients().iter().map(|a| encode_mailbox(a)).collect();
	write_header(&mut out, "To", &to.join(", "));

	if !message.cc().is_empty() {
		let cc: Vec<String> = message.cc().iter().map(|a| encode_mailbox(a)).collect();
		write_header(&mut out, "Cc", &cc.join(", "));
	}

	// Bcc is never written into the header block

	if let Some(reply_to) = message.reply_to() {
		write_header(&mut out, "Reply-To", &encode_mailbox(reply_to));
	}

	let date = message.date().unwrap_or_else(Utc::now);
	write_header(&mut out, "Date", &date.to_rfc2822());
	write_header(&mut out, "Message-ID", message.message_id());

	for (name, value) in message.extra_headers() {
		write_header(&mut out, name, &encode_header_value(value));
	}

	write_header(&mut out, "MIME-Version", "1.0");
	write_body(&mut out, message, config);

	Ok(out)
}

/// Header-and-body layout:
///
/// - plain body only: a single `text/plain` part
/// - body and HTML: `multipart/alternative`, plain first
/// - any attachment: a `multipart/mixed` envelope around the above
fn write_body(out: &mut Vec<u8>, message: &Message, config: &MailConfig) {
	let has_attachments = !message.attachments().is_empty();
	let charset = message.charset();

	if has_attachments {
		let mixed = boundary();
		write_header(
			out,
			"Content-Type",
			&format!("multipart/mixed; boundary=\"{}\"", mixed),
		);
		out.extend_from_slice(b"\r\n");

		out.extend_from_slice(format!("--{}\r\n", mixed).as_bytes());
		write_content(out, message, charset);

		for attachment in message.attachments() {
			out.extend_from_slice(format!("--{}\r\n", mixed).as_bytes());
			write_attachment(out, attachment, config);
		}
		out.extend_from_slice(format!("--{}--\r\n", mixed).as_bytes());
	} else {
		write_content(out, message, charset);
	}
}

/// Writes the textual content: a single part, or `multipart/alternative`
/// when both representations exist.
fn write_content(out: &mut Vec<u8>, message: &Message, charset: &str) {
	match (message.body(), message.html()) {
		(Some(body), Some(html)) => {
			let alt = boundary();
			write_header(
				out,
				"Content-Type",
				&format!("multipart/alternative; boundary=\"{}\"", alt),
			);
			out.extend_from_slice(b"\r\n");

			out.extend_from_slice(format!("--{}\r\n", alt).as_bytes());
			write_text_part(out, "plain", body, charset);
			out.extend_from_slice(format!("--{}\r\n", alt).as_bytes());
			write_text_part(out, "html", html, charset);
			out.extend_from_slice(format!("--{}--\r\n", alt).as_bytes());
		}
		(None, Some(html)) => write_text_part(out, "html", html, charset),
		(body, None) => write_text_part(out, "plain", body.unwrap_or(""), charset),
	}
}

fn write_text_part(out: &mut Vec<u8>, subtype: &str, content: &str, charset: &str) {
	write_header(
		out,
		"Content-Type",
		&format!("text/{}; charset={}", subtype, charset),
	);
	write_header(out, "Content-Transfer-Encoding", "quoted-printable");
	out.extend_from_slice(b"\r\n");
	out.extend_from_slice(&quoted_printable::encode(content.as_bytes()));
	out.extend_from_slice(b"\r\n");
}

fn write_attachment(out: &mut Vec<u8>, attachment: &Attachment, config: &MailConfig) {
	let filename = attachment.filename().map(|name| {
		if config.ascii_attachments {
			ascii_filename(name)
		} else {
			name.to_string()
		}
	});

	match &filename {
		Some(name) => write_header(
			out,
			"Content-Type",
			&format!("{}; name=\"{}\"", attachment.content_type(), name),
		),
		None => write_header(out, "Content-Type", attachment.content_type()),
	}
	write_header(out, "Content-Transfer-Encoding", "base64");
	match &filename {
		Some(name) => write_header(
			out,
			"Content-Disposition",
			&format!("{}; filename=\"{}\"", attachment.disposition(), name),
		),
		None => write_header(out, "Content-Disposition", attachment.disposition()),
	}
	for (name, value) in attachment.headers() {
		write_header(out, name, value);
	}
	out.extend_from_slice(b"\r\n");

	let encoded = BASE64.encode(attachment.data());
	for chunk in encoded.as_bytes().chunks(76) {
		out.extend_from_slice(chunk);
		out.extend_from_slice(b"\r\n");
	}
}

fn write_header(out: &mut Vec<u8>, name: &str, value: &str) {
	out.extend_from_slice(fold_header(&format!("{}: {}", name, value)).as_bytes());
	out.extend_from_slice(b"\r\n");
}

/// Folds a header line at 78 characters, breaking on spaces.
fn fold_header(header: &str) -> String {
	if header.len() <= 78 {
		return header.to_string();
	}

	let mut result = String::new();
	let mut current = String::new();
	for word in header.split(' ') {
		if current.is_empty() {
			current = word.to_string();
		} else if current.len() + 1 + word.len() <= 76 {
			current.push(' ');
			current.push_str(word);
		} else {
			result.push_str(&current);
			result.push_str("\r\n ");
			current = word.to_string();
		}
	}
	result.push_str(&current);
	result
}

/// RFC 2047 encoding for non-ASCII header values.
fn encode_header_value(value: &str) -> String {
	if value.is_ascii() {
		return value.to_string();
	}
	format!("=?UTF-8?B?{}?=", BASE64.encode(value.as_bytes()))
}

/// Encode one mailbox for a header: the display name gets RFC 2047 treatment
/// when non-ASCII, the address is left as written.
fn encode_mailbox(mailbox: &str) -> String {
	if mailbox.is_ascii() {
		return mailbox.to_string();
	}
	match (mailbox.rfind('<'), mailbox.rfind('>')) {
		(Some(start), Some(end)) if start < end => {
			let name = mailbox[..start].trim();
			let address = &mailbox[start..=end];
			format!("{} {}", encode_header_value(name), address)
		}
		_ => mailbox.to_string(),
	}
}

fn boundary() -> String {
	format!("=_mailroom_{}", Uuid::new_v4().simple())
}
