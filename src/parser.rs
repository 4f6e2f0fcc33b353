//! Internal module for parsing fetched messages.
//!
//! Turns raw RFC 2822 bytes into the crate's [`Message`] value: the Subject
//! header plus every attachment part with its payload decoded from the
//! part's transfer encoding.

use crate::error::{Error, Result};
use crate::gateway::{Attachment, Message, MessageId};
use mailparse::{parse_mail, DispositionType, MailHeaderMap, ParsedMail};
use tracing::{debug, warn};

/// Parses a raw message body into a [`Message`].
///
/// Individual malformed attachment parts are logged and skipped so one bad
/// part does not lose the rest of the message; a body that fails to parse at
/// all is an error the caller records against the message id.
pub(crate) fn parse_message(id: &MessageId, raw: &[u8]) -> Result<Message> {
    let parsed = parse_mail(raw).map_err(|source| Error::ParseMessage {
        message_id: id.to_string(),
        source,
    })?;

    let subject = parsed
        .headers
        .get_first_value("Subject")
        .unwrap_or_default();

    let mut attachments = Vec::new();
    collect_attachments(&parsed, id, &mut attachments);

    debug!(
        message_id = %id,
        subject_len = subject.len(),
        attachment_count = attachments.len(),
        "Parsed message"
    );

    Ok(Message {
        id: id.clone(),
        subject,
        attachments,
    })
}

/// Recursively collects attachment parts in message order.
///
/// A part counts as an attachment when its Content-Disposition is
/// `attachment`, or when it carries a filename (some senders mark real
/// attachments `inline`, or omit the disposition and only set the
/// Content-Type `name` parameter).
fn collect_attachments(part: &ParsedMail<'_>, id: &MessageId, out: &mut Vec<Attachment>) {
    for subpart in &part.subparts {
        collect_attachments(subpart, id, out);
    }

    if !part.subparts.is_empty() {
        // Multipart containers carry no payload of their own
        return;
    }

    let disposition = part.get_content_disposition();
    let filename = attachment_filename(part, &disposition);

    let is_attachment = disposition.disposition == DispositionType::Attachment
        || (filename.is_some() && disposition.disposition != DispositionType::Inline)
        || (filename.is_some() && !part.ctype.mimetype.starts_with("text/"));

    if !is_attachment {
        return;
    }

    match part.get_body_raw() {
        Ok(content) => {
            out.push(Attachment::new(filename.unwrap_or_default(), content));
        }
        Err(e) => {
            warn!(
                message_id = %id,
                filename = filename.as_deref().unwrap_or(""),
                error = %e,
                "Failed to decode attachment part, skipping"
            );
        }
    }
}

/// Resolves a part's filename from Content-Disposition, falling back to the
/// Content-Type `name` parameter.
fn attachment_filename(
    part: &ParsedMail<'_>,
    disposition: &mailparse::ParsedContentDisposition,
) -> Option<String> {
    disposition
        .params
        .get("filename")
        .cloned()
        .or_else(|| part.ctype.params.get("name").cloned())
}
