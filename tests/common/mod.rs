//! Common test utilities and fixtures
#![allow(dead_code)]

use google_gmail1::api::{Message, MessagePart, MessagePartBody, MessagePartHeader};
use job_mail_labeler::client::GmailClient;
use job_mail_labeler::error::Result;
use job_mail_labeler::models::{LabelInfo, MessagePage};
use mockall::mock;

/// A single header
pub fn header(name: &str, value: &str) -> MessagePartHeader {
    MessagePartHeader {
        name: Some(name.to_string()),
        value: Some(value.to_string()),
    }
}

/// A leaf part with inline data (already decoded, as the SDK hands it over)
pub fn leaf_part(mime_type: &str, data: &str) -> MessagePart {
    MessagePart {
        mime_type: Some(mime_type.to_string()),
        body: Some(MessagePartBody {
            data: Some(data.as_bytes().to_vec()),
            size: Some(data.len() as i32),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn text_part(data: &str) -> MessagePart {
    leaf_part("text/plain", data)
}

pub fn html_part(data: &str) -> MessagePart {
    leaf_part("text/html", data)
}

/// An attachment: body carries only an attachment id, never inline data
pub fn attachment_part(filename: &str, mime_type: &str) -> MessagePart {
    MessagePart {
        mime_type: Some(mime_type.to_string()),
        filename: Some(filename.to_string()),
        body: Some(MessagePartBody {
            attachment_id: Some(format!("att-{}", filename)),
            size: Some(2048),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn multipart(mime_type: &str, parts: Vec<MessagePart>) -> MessagePart {
    MessagePart {
        mime_type: Some(mime_type.to_string()),
        parts: Some(parts),
        ..Default::default()
    }
}

/// A `format=full` message with a Subject header and the given top-level payload
pub fn create_test_message(id: &str, subject: &str, payload: MessagePart) -> Message {
    Message {
        id: Some(id.to_string()),
        thread_id: Some(format!("thread_{}", id)),
        payload: Some(MessagePart {
            headers: Some(vec![
                header("From", "recruiting@example.com"),
                header("Subject", subject),
                header("To", "me@example.com"),
            ]),
            ..payload
        }),
        ..Default::default()
    }
}

/// The usual shape of recruiter mail: multipart/alternative with plain and HTML bodies
pub fn create_alternative_message(id: &str, subject: &str, plain: &str, html: &str) -> Message {
    create_test_message(
        id,
        subject,
        multipart("multipart/alternative", vec![text_part(plain), html_part(html)]),
    )
}

pub fn create_test_label_info(id: &str, name: &str) -> LabelInfo {
    LabelInfo {
        id: id.to_string(),
        name: name.to_string(),
    }
}

pub fn create_test_page(ids: &[&str], next_page_token: Option<&str>) -> MessagePage {
    MessagePage {
        ids: ids.iter().map(|s| s.to_string()).collect(),
        next_page_token: next_page_token.map(String::from),
    }
}

// Mock implementation of GmailClient for testing
mock! {
    pub GmailClient {}

    #[async_trait::async_trait]
    impl GmailClient for GmailClient {
        async fn list_messages_page(&self, query: &str, page_token: Option<String>) -> Result<MessagePage>;
        async fn get_message(&self, id: &str) -> Result<Message>;
        async fn list_labels(&self) -> Result<Vec<LabelInfo>>;
        async fn create_label(&self, name: &str) -> Result<String>;
        async fn apply_label(&self, message_id: &str, label_id: &str) -> Result<()>;
    }
}
