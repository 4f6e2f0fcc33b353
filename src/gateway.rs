//! Mail gateway abstraction.
//!
//! The extractor never talks to a mail service directly; it goes through the
//! [`MailGateway`] trait so the remote side can be swapped for an in-memory
//! fake in tests. The production implementation is
//! [`ImapMailGateway`](crate::ImapMailGateway).

use crate::error::Result;
use async_trait::async_trait;

/// Opaque, service-assigned message identifier.
///
/// For IMAP this is a UID rendered as a string; the extractor treats it as an
/// opaque token and uses it verbatim as the processed-ledger record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageId(String);

impl MessageId {
    /// Wraps a raw identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MessageId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for MessageId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A raw attachment payload: filename plus decoded bytes.
#[derive(Debug, Clone)]
pub struct Attachment {
    /// Filename as carried by the message part. May be empty or contain
    /// path separators; the store sanitizes before writing.
    pub filename: String,
    /// Decoded binary content.
    pub content: Vec<u8>,
}

impl Attachment {
    /// Creates an attachment from a filename and its decoded content.
    pub fn new(filename: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content,
        }
    }
}

/// A fetched message: identifier, subject, and its attachments in message
/// order. Immutable once fetched.
#[derive(Debug, Clone)]
pub struct Message {
    /// Service-assigned identifier.
    pub id: MessageId,
    /// Subject line (empty string if the header is absent).
    pub subject: String,
    /// Ordered attachment payloads.
    pub attachments: Vec<Attachment>,
}

/// Remote mail service interface.
///
/// Implementations own authentication, transport, and any result paging:
/// [`list_attachment_message_ids`](Self::list_attachment_message_ids) is one
/// logical call that returns the complete, order-preserving id sequence.
#[async_trait]
pub trait MailGateway: Send {
    /// Lists the ids of candidate messages matching `query`.
    ///
    /// # Errors
    ///
    /// Returns an error if the remote listing fails; the extractor treats
    /// this as fatal to the run (no ids means nothing can be processed).
    async fn list_attachment_message_ids(&mut self, query: &str) -> Result<Vec<MessageId>>;

    /// Fetches a message with its subject and fully resolved attachment
    /// payloads, including parts the service returns by reference.
    ///
    /// # Errors
    ///
    /// Returns an error if the fetch or payload resolution fails; the
    /// extractor records the failure and moves on to the next message.
    async fn fetch_message(&mut self, id: &MessageId) -> Result<Message>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_id_roundtrip() {
        let id = MessageId::from("abc123");
        assert_eq!(id.as_str(), "abc123");
        assert_eq!(id.to_string(), "abc123");
        assert_eq!(id, MessageId::new(String::from("abc123")));
    }

    #[test]
    fn test_attachment_holds_raw_bytes() {
        let att = Attachment::new("report.pdf", vec![0x25, 0x50, 0x44, 0x46]);
        assert_eq!(att.filename, "report.pdf");
        assert_eq!(att.content.len(), 4);
    }
}
