//! Subject and plain-text body extraction from Gmail `format=full` messages
//!
//! Only `text/plain` and `text/html` parts with inline data contribute to the
//! body, concatenated in document order; attachments and container parts add
//! nothing themselves. HTML is reduced to text with tags stripped and entities
//! decoded.
//!
//! Nested multipart trees (e.g. `multipart/alternative` inside
//! `multipart/mixed`) are walked depth-first when `recurse_nested_parts` is on.
//! With it off only the payload's direct children are read, which silently
//! drops text from deeper levels.

use google_gmail1::api::{Message, MessagePart};
use nanohtml2text::html2text;
use tracing::trace;

use crate::models::ExtractedText;

const TEXT_PLAIN: &str = "text/plain";
const TEXT_HTML: &str = "text/html";

/// Pulls (subject, body) out of a Gmail message payload
#[derive(Debug, Clone, Copy)]
pub struct BodyExtractor {
    recurse_nested_parts: bool,
}

impl Default for BodyExtractor {
    fn default() -> Self {
        Self::new(true)
    }
}

impl BodyExtractor {
    pub fn new(recurse_nested_parts: bool) -> Self {
        Self {
            recurse_nested_parts,
        }
    }

    pub fn recurses(&self) -> bool {
        self.recurse_nested_parts
    }

    pub fn extract(&self, message: &Message) -> ExtractedText {
        let subject = subject(message).unwrap_or_default();

        let mut body = String::new();
        if let Some(payload) = message.payload.as_ref() {
            if self.recurse_nested_parts {
                collect_tree(payload, &mut body);
            } else {
                for part in payload.parts.iter().flatten() {
                    append_part_text(part, &mut body);
                }
            }
        }

        trace!(
            "Extracted {} subject chars and {} body chars from message {:?}",
            subject.chars().count(),
            body.chars().count(),
            message.id
        );

        ExtractedText { subject, body }
    }
}

/// Value of the top-level header named exactly `Subject`
pub fn subject(message: &Message) -> Option<String> {
    header_value(message, "Subject")
}

/// Extract header value from message (exact, case-sensitive name match)
pub fn header_value(message: &Message, header_name: &str) -> Option<String> {
    message
        .payload
        .as_ref()?
        .headers
        .as_ref()?
        .iter()
        .find(|h| h.name.as_deref() == Some(header_name))
        .and_then(|h| h.value.clone())
}

fn collect_tree(part: &MessagePart, out: &mut String) {
    append_part_text(part, out);
    for child in part.parts.iter().flatten() {
        collect_tree(child, out);
    }
}

fn append_part_text(part: &MessagePart, out: &mut String) {
    let data = match part.body.as_ref().and_then(|b| b.data.as_ref()) {
        Some(data) if !data.is_empty() => data,
        _ => return,
    };

    let text = match part.mime_type.as_deref() {
        Some(TEXT_PLAIN) => decode_text(data),
        Some(TEXT_HTML) => html2text(&decode_text(data)),
        _ => return,
    };
    push_text(out, &text);
}

/// Append `text`, inserting a line break only where two parts would otherwise
/// fuse into one word
fn push_text(out: &mut String, text: &str) {
    let fused = out.ends_with(|c: char| !c.is_whitespace())
        && text.starts_with(|c: char| !c.is_whitespace());
    if fused {
        out.push('\n');
    }
    out.push_str(text);
}

/// Best-effort UTF-8 decode that drops undecodable byte sequences
///
/// Only the invalid bytes go; characters that were validly encoded, a literal
/// U+FFFD included, are kept.
pub fn decode_text(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    let mut rest = bytes;

    loop {
        match std::str::from_utf8(rest) {
            Ok(valid) => {
                out.push_str(valid);
                break;
            }
            Err(e) => {
                let (valid, after) = rest.split_at(e.valid_up_to());
                out.push_str(std::str::from_utf8(valid).unwrap_or_default());
                match e.error_len() {
                    Some(invalid) => rest = &after[invalid..],
                    // Truncated sequence at the end of the data
                    None => break,
                }
            }
        }
    }

    out
}
