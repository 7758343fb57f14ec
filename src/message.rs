use chrono::{DateTime, Utc};
use std::fmt;
use uuid::Uuid;

/// Represents a file attachment for an email message.
///
/// The MIME type is detected from the filename extension when not given
/// explicitly.
///
/// # Examples
///
/// ```
/// use mailroom::Attachment;
///
/// let attachment = Attachment::new("report.pdf", b"PDF content".to_vec());
/// assert_eq!(attachment.filename(), Some("report.pdf"));
/// assert!(attachment.content_type().contains("pdf"));
/// ```
#[derive(Debug, Clone)]
pub struct Attachment {
	filename: Option<String>,
	content_type: String,
	data: Vec<u8>,
	disposition: String,
	headers: Vec<(String, String)>,
}

impl Attachment {
	/// Create an attachment from a filename and raw bytes.
	pub fn new(filename: impl Into<String>, data: Vec<u8>) -> Self {
		let filename = filename.into();
		let content_type = Self::detect_content_type(&filename);

		Self {
			filename: Some(filename),
			content_type,
			data,
			disposition: "attachment".to_string(),
			headers: Vec::new(),
		}
	}

	/// Create an unnamed attachment with an explicit content type.
	pub fn from_data(content_type: impl Into<String>, data: Vec<u8>) -> Self {
		Self {
			filename: None,
			content_type: content_type.into(),
			data,
			disposition: "attachment".to_string(),
			headers: Vec::new(),
		}
	}

	/// Override the detected MIME type.
	pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
		self.content_type = content_type.into();
		self
	}

	/// Set the content disposition (default `attachment`).
	pub fn with_disposition(mut self, disposition: impl Into<String>) -> Self {
		self.disposition = disposition.into();
		self
	}

	/// Add a custom header to the attachment part.
	pub fn with_header(
		mut self,
		name: impl Into<String>,
		value: impl Into<String>,
	) -> Self {
		self.headers.push((name.into(), value.into()));
		self
	}

	pub fn filename(&self) -> Option<&str> {
		self.filename.as_deref()
	}

	pub fn content_type(&self) -> &str {
		&self.content_type
	}

	pub fn data(&self) -> &[u8] {
		&self.data
	}

	pub fn disposition(&self) -> &str {
		&self.disposition
	}

	pub fn headers(&self) -> &[(String, String)] {
		&self.headers
	}

	fn detect_content_type(filename: &str) -> String {
		mime_guess::from_path(filename)
			.first()
			.map(|mime| mime.to_string())
			.unwrap_or_else(|| "application/octet-stream".to_string())
	}
}

/// A sender, normalized to a single RFC 5322 mailbox string.
///
/// Accepts either a preformatted string or a `(display name, address)` pair.
///
/// # Examples
///
/// ```
/// use mailroom::Sender;
///
/// let bare = Sender::from("me@example.com");
/// assert_eq!(bare.as_str(), "me@example.com");
///
/// let named = Sender::from(("Me", "me@example.com"));
/// assert_eq!(named.as_str(), "Me <me@example.com>");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender(String);

impl Sender {
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl From<&str> for Sender {
	fn from(address: &str) -> Self {
		Self(address.to_string())
	}
}

impl From<String> for Sender {
	fn from(address: String) -> Self {
		Self(address)
	}
}

impl From<(&str, &str)> for Sender {
	fn from((name, address): (&str, &str)) -> Self {
		if name.is_empty() {
			Self(address.to_string())
		} else {
			Self(format!("{} <{}>", name, address))
		}
	}
}

impl From<(String, String)> for Sender {
	fn from((name, address): (String, String)) -> Self {
		Self::from((name.as_str(), address.as_str()))
	}
}

impl fmt::Display for Sender {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// An email message.
///
/// Messages are plain values: the caller builds and may mutate one up to the
/// point it is handed to a send operation, which only reads it. Validation
/// (header injection, recipients, sender resolution) runs at send time, so
/// construction never fails.
///
/// # Examples
///
/// ```
/// use mailroom::{Attachment, Message};
///
/// let message = Message::builder()
///     .subject("Monthly Report")
///     .sender(("Reports", "reports@example.com"))
///     .to(vec!["user@example.com".to_string()])
///     .body("Please find attached your monthly report.")
///     .attachment(Attachment::new("report.pdf", b"PDF content".to_vec()))
///     .build();
///
/// assert_eq!(message.subject(), "Monthly Report");
/// assert_eq!(message.attachments().len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Message {
	subject: String,
	sender: Option<Sender>,
	recipients: Vec<String>,
	cc: Vec<String>,
	bcc: Vec<String>,
	reply_to: Option<String>,
	body: Option<String>,
	html: Option<String>,
	date: Option<DateTime<Utc>>,
	charset: String,
	extra_headers: Vec<(String, String)>,
	attachments: Vec<Attachment>,
	message_id: String,
}

impl Message {
	/// Create a new builder for constructing a `Message`.
	pub fn builder() -> MessageBuilder {
		MessageBuilder::default()
	}

	pub fn subject(&self) -> &str {
		&self.subject
	}

	pub fn sender(&self) -> Option<&Sender> {
		self.sender.as_ref()
	}

	pub fn recipients(&self) -> &[String] {
		&self.recipients
	}

	pub fn cc(&self) -> &[String] {
		&self.cc
	}

	pub fn bcc(&self) -> &[String] {
		&self.bcc
	}

	pub fn reply_to(&self) -> Option<&str> {
		self.reply_to.as_deref()
	}

	pub fn body(&self) -> Option<&str> {
		self.body.as_deref()
	}

	pub fn html(&self) -> Option<&str> {
		self.html.as_deref()
	}

	pub fn date(&self) -> Option<DateTime<Utc>> {
		self.date
	}

	pub fn charset(&self) -> &str {
		&self.charset
	}

	pub fn extra_headers(&self) -> &[(String, String)] {
		&self.extra_headers
	}

	pub fn attachments(&self) -> &[Attachment] {
		&self.attachments
	}

	pub fn message_id(&self) -> &str {
		&self.message_id
	}

	/// The envelope recipient list: recipients, Cc and Bcc in first-seen
	/// order, duplicates removed.
	pub fn send_to(&self) -> Vec<&str> {
		let mut seen = Vec::new();
		for addr in self
			.recipients
			.iter()
			.chain(self.cc.iter())
			.chain(self.bcc.iter())
		{
			if !seen.contains(&addr.as_str()) {
				seen.push(addr.as_str());
			}
		}
		seen
	}

	/// Add another primary recipient.
	pub fn add_recipient(&mut self, recipient: impl Into<String>) {
		self.recipients.push(recipient.into());
	}

	/// Add an attachment.
	pub fn attach(&mut self, attachment: Attachment) {
		self.attachments.push(attachment);
	}
}

/// Builder enumerating every recognized message field with its default.
#[derive(Debug, Default)]
pub struct MessageBuilder {
	subject: String,
	sender: Option<Sender>,
	recipients: Vec<String>,
	cc: Vec<String>,
	bcc: Vec<String>,
	reply_to: Option<String>,
	body: Option<String>,
	html: Option<String>,
	date: Option<DateTime<Utc>>,
	charset: Option<String>,
	extra_headers: Vec<(String, String)>,
	attachments: Vec<Attachment>,
	message_id: Option<String>,
}

impl MessageBuilder {
	pub fn subject(mut self, subject: impl Into<String>) -> Self {
		self.subject = subject.into();
		self
	}

	pub fn sender(mut self, sender: impl Into<Sender>) -> Self {
		self.sender = Some(sender.into());
		self
	}

	pub fn to(mut self, recipients: Vec<String>) -> Self {
		self.recipients = recipients;
		self
	}

	/// Add a single primary recipient.
	pub fn recipient(mut self, recipient: impl Into<String>) -> Self {
		self.recipients.push(recipient.into());
		self
	}

	pub fn cc(mut self, cc: Vec<String>) -> Self {
		self.cc = cc;
		self
	}

	pub fn bcc(mut self, bcc: Vec<String>) -> Self {
		self.bcc = bcc;
		self
	}

	pub fn reply_to(mut self, reply_to: impl Into<String>) -> Self {
		self.reply_to = Some(reply_to.into());
		self
	}

	pub fn body(mut self, body: impl Into<String>) -> Self {
		self.body = Some(body.into());
		self
	}

	pub fn html(mut self, html: impl Into<String>) -> Self {
		self.html = Some(html.into());
		self
	}

	/// Set the Date header value; defaults to the dispatch time.
	pub fn date(mut self, date: DateTime<Utc>) -> Self {
		self.date = Some(date);
		self
	}

	pub fn charset(mut self, charset: impl Into<String>) -> Self {
		self.charset = Some(charset.into());
		self
	}

	pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.extra_headers.push((name.into(), value.into()));
		self
	}

	pub fn attachment(mut self, attachment: Attachment) -> Self {
		self.attachments.push(attachment);
		self
	}

	/// Supply a Message-ID; a globally unique one is generated otherwise.
	pub fn message_id(mut self, message_id: impl Into<String>) -> Self {
		self.message_id = Some(message_id.into());
		self
	}

	/// Build the message. Never fails; validation happens at send time.
	pub fn build(self) -> Message {
		Message {
			subject: self.subject,
			sender: self.sender,
			recipients: self.recipients,
			cc: self.cc,
			bcc: self.bcc,
			reply_to: self.reply_to,
			body: self.body,
			html: self.html,
			date: self.date,
			charset: self.charset.unwrap_or_else(|| "utf-8".to_string()),
			extra_headers: self.extra_headers,
			attachments: self.attachments,
			message_id: self.message_id.unwrap_or_else(generate_message_id),
		}
	}
}

fn generate_message_id() -> String {
	format!(
		"<{}.{}@mailroom>",
		Uuid::new_v4().simple(),
		Utc::now().timestamp()
	)
}
