//! Pre-send validation: header-injection protection, recipient checks and
//! address normalization.
//!
//! All checks run before serialization and before the suppression decision,
//! so an invalid message fails the same way whether or not a network send
//! would follow.

use crate::message::Message;
use crate::{MailError, MailResult};
use lettre::Address;
use unicode_normalization::UnicodeNormalization;

pub(crate) fn has_newline(value: &str) -> bool {
	value.contains('\r') || value.contains('\n')
}

/// Reject a header value containing a raw CR or LF.
pub fn check_header_value(field: &str, value: &str) -> MailResult<()> {
	if has_newline(value) {
		Err(MailError::HeaderInjection(field.to_string()))
	} else {
		Ok(())
	}
}

/// Reject a header name that is not printable ASCII or contains a colon.
pub fn check_header_name(name: &str) -> MailResult<()> {
	if name.is_empty() || !name.chars().all(|c| c.is_ascii_graphic() && c != ':') {
		Err(MailError::InvalidHeader(name.to_string()))
	} else {
		Ok(())
	}
}

/// Validate a subject line.
///
/// RFC 5322 folding is tolerated: a multiline subject is legal when every
/// continuation starts with `CRLF` followed by whitespace. Anything else
/// containing CR or LF is an injection attempt.
pub fn check_subject(subject: &str) -> MailResult<()> {
	if !has_newline(subject) {
		return Ok(());
	}
	for (linenum, line) in subject.split("\r\n").enumerate() {
		let folded_ok = line.starts_with(['\t', ' ']);
		if line.is_empty()
			|| (linenum > 0 && !folded_ok)
			|| has_newline(line)
			|| line.trim().is_empty()
		{
			return Err(MailError::HeaderInjection("subject".to_string()));
		}
	}
	Ok(())
}

/// Full validation pass over a message with its resolved sender.
///
/// Checks combined-recipient non-emptiness, then CR/LF in every field that
/// ends up in the serialized header block: sender, reply-to, every recipient
/// address, the subject (folding-aware), message id, charset, every extra
/// header and every attachment's part headers.
pub(crate) fn validate_message(message: &Message, sender: &str) -> MailResult<()> {
	if message.send_to().is_empty() {
		return Err(MailError::NoRecipients);
	}

	check_header_value("sender", sender)?;
	if let Some(reply_to) = message.reply_to() {
		check_header_value("reply-to", reply_to)?;
	}
	for addr in message.send_to() {
		check_header_value("recipient", addr)?;
	}
	check_subject(message.subject())?;
	check_header_value("message-id", message.message_id())?;
	check_header_value("charset", message.charset())?;

	for (name, value) in message.extra_headers() {
		check_header_name(name)?;
		check_header_value(name, value)?;
	}

	for attachment in message.attachments() {
		check_header_value("content-type", attachment.content_type())?;
		check_header_value("content-disposition", attachment.disposition())?;
		if let Some(filename) = attachment.filename() {
			check_header_value("filename", filename)?;
		}
		for (name, value) in attachment.headers() {
			check_header_name(name)?;
			check_header_value(name, value)?;
		}
	}

	Ok(())
}

/// Force a filename to ASCII: canonical decomposition (NFKD), drop everything
/// outside ASCII, collapse whitespace runs.
///
/// Lossy by design; callers needing fidelity (e.g. `ß` → `ss`) must
/// pre-transliterate themselves.
pub(crate) fn ascii_filename(filename: &str) -> String {
	let stripped: String = filename.nfkd().filter(char::is_ascii).collect();
	stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Extract the bare address from a `Name <addr>` mailbox string.
pub(crate) fn bare_address(mailbox: &str) -> &str {
	match (mailbox.rfind('<'), mailbox.rfind('>')) {
		(Some(start), Some(end)) if start < end => mailbox[start + 1..end].trim(),
		_ => mailbox.trim(),
	}
}

/// Parse a mailbox string into a transport-level address, encoding
/// international domains with IDNA.
pub(crate) fn envelope_address(mailbox: &str) -> MailResult<Address> {
	let bare = bare_address(mailbox);
	if bare.is_ascii() {
		return bare
			.parse()
			.map_err(|_| MailError::InvalidAddress(bare.to_string()));
	}

	let Some((local, domain)) = bare.rsplit_once('@') else {
		return Err(MailError::InvalidAddress(bare.to_string()));
	};
	let domain = idna::domain_to_ascii(domain)
		.map_err(|_| MailError::InvalidAddress(bare.to_string()))?;
	format!("{}@{}", local, domain)
		.parse()
		.map_err(|_| MailError::InvalidAddress(bare.to_string()))
}
