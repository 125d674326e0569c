//! Gmail API client with retry logic
//!
//! [`GmailClient`] is the seam the rest of the crate talks to; tests swap in a
//! `mockall` mock. [`ProductionGmailClient`] wraps the `google-gmail1` hub and
//! retries transient failures according to a [`RetryPolicy`].

use async_trait::async_trait;
use google_gmail1::api::{Label, Message, ModifyMessageRequest};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::auth::{GmailHub, GMAIL_SCOPE};
use crate::config::RetryConfig;
use crate::error::{LabelerError, Result};
use crate::models::{LabelInfo, MessagePage};

/// Gmail's own per-page ceiling for messages.list
pub const MAX_PAGE_SIZE: u32 = 500;

/// Trait defining the Gmail operations the labeler needs
#[async_trait]
pub trait GmailClient: Send + Sync {
    /// List one page of message IDs matching a query
    async fn list_messages_page(
        &self,
        query: &str,
        page_token: Option<String>,
    ) -> Result<MessagePage>;

    /// Get a full message (headers and every MIME part)
    async fn get_message(&self, id: &str) -> Result<Message>;

    /// Every label visible to the account, system labels included
    async fn list_labels(&self) -> Result<Vec<LabelInfo>>;

    /// Create a label shown in both the label list and the message list
    async fn create_label(&self, name: &str) -> Result<String>;

    /// Add a label to a message, leaving its other labels untouched
    async fn apply_label(&self, message_id: &str, label_id: &str) -> Result<()>;
}

/// Exponential backoff for transient Gmail failures
///
/// `max_retries = 0` disables retrying: the first error is returned as is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Delay before retry number `retry` (1-based), doubling each time up to `max_delay`
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        std::cmp::min(self.initial_delay.saturating_mul(factor), self.max_delay)
    }

    /// Check if an error is worth another attempt
    pub fn should_retry(error: &LabelerError) -> bool {
        error.is_transient()
    }

    /// Wait before retry number `retry` after `error`
    ///
    /// A rate-limit answer's `Retry-After` is a floor, honoured even beyond
    /// `max_delay`.
    pub fn delay_after(&self, retry: u32, error: &LabelerError) -> Duration {
        let backoff = self.delay_for(retry);
        match error {
            LabelerError::RateLimitExceeded { retry_after } => {
                backoff.max(Duration::from_secs(*retry_after))
            }
            _ => backoff,
        }
    }

    /// Execute an async operation, retrying transient errors
    pub async fn run<T, F, Fut>(&self, operation_name: &str, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut retries = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if Self::should_retry(&e) && retries < self.max_retries => {
                    retries += 1;
                    let delay = self.delay_after(retries, &e);
                    warn!(
                        "{} failed (attempt {}/{}): {}. Retrying in {:?}...",
                        operation_name,
                        retries,
                        self.max_retries + 1,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Production Gmail client backed by the `google-gmail1` hub
pub struct ProductionGmailClient {
    hub: GmailHub,
    retry: RetryPolicy,
    request_timeout: Duration,
    page_size: u32,
}

impl ProductionGmailClient {
    pub fn new(hub: GmailHub, retry: RetryPolicy) -> Self {
        Self {
            hub,
            retry,
            request_timeout: Duration::from_secs(30),
            page_size: 100,
        }
    }

    /// Per-request timeout; a timed-out call counts as a network error
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    /// Email address of the authorised account
    pub async fn account_email(&self) -> Result<String> {
        self.retry
            .run("get_profile", || async move {
                let (_, profile) = self
                    .timed(
                        "get_profile",
                        self.hub.users().get_profile("me").add_scope(GMAIL_SCOPE).doit(),
                    )
                    .await?;
                Ok(profile.email_address.unwrap_or_default())
            })
            .await
    }

    /// Wrap an API call in the request timeout to prevent indefinite hangs
    async fn timed<T, Fut>(&self, operation_name: &str, call: Fut) -> Result<T>
    where
        Fut: Future<Output = std::result::Result<T, google_gmail1::Error>>,
    {
        match tokio::time::timeout(self.request_timeout, call).await {
            Ok(result) => result.map_err(LabelerError::from),
            Err(_) => {
                warn!(
                    "Gmail API {} call timed out after {:?}",
                    operation_name, self.request_timeout
                );
                Err(LabelerError::NetworkError(format!(
                    "API call timed out after {:?}",
                    self.request_timeout
                )))
            }
        }
    }
}

#[async_trait]
impl GmailClient for ProductionGmailClient {
    async fn list_messages_page(
        &self,
        query: &str,
        page_token: Option<String>,
    ) -> Result<MessagePage> {
        self.retry
            .run("list_messages", move || {
                let page_token = page_token.clone();
                async move {
                    let mut call = self
                        .hub
                        .users()
                        .messages_list("me")
                        .q(query)
                        .max_results(self.page_size);

                    if let Some(token) = page_token.as_deref() {
                        call = call.page_token(token);
                    }

                    let (_, response) = self
                        .timed("list_messages", call.add_scope(GMAIL_SCOPE).doit())
                        .await?;

                    let ids: Vec<String> = response
                        .messages
                        .unwrap_or_default()
                        .into_iter()
                        .filter_map(|msg_ref| msg_ref.id)
                        .collect();

                    debug!(
                        "Listed {} message IDs (more pages: {})",
                        ids.len(),
                        response.next_page_token.is_some()
                    );

                    Ok(MessagePage {
                        ids,
                        next_page_token: response.next_page_token,
                    })
                }
            })
            .await
    }

    async fn get_message(&self, id: &str) -> Result<Message> {
        self.retry
            .run("get_message", || async move {
                let (_, message) = self
                    .timed(
                        "get_message",
                        self.hub
                            .users()
                            .messages_get("me", id)
                            .format("full")
                            .add_scope(GMAIL_SCOPE)
                            .doit(),
                    )
                    .await?;

                if message.payload.is_none() {
                    return Err(LabelerError::InvalidMessageFormat(format!(
                        "Message {} has no payload",
                        id
                    )));
                }
                Ok(message)
            })
            .await
    }

    async fn list_labels(&self) -> Result<Vec<LabelInfo>> {
        self.retry
            .run("list_labels", || async move {
                debug!("Listing Gmail labels");
                let (_, response) = self
                    .timed(
                        "list_labels",
                        self.hub.users().labels_list("me").add_scope(GMAIL_SCOPE).doit(),
                    )
                    .await?;

                let labels: Vec<LabelInfo> = response
                    .labels
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|label| match (label.id, label.name) {
                        (Some(id), Some(name)) => Some(LabelInfo { id, name }),
                        _ => None,
                    })
                    .collect();

                debug!("Gmail returned {} labels", labels.len());
                Ok(labels)
            })
            .await
    }

    async fn create_label(&self, name: &str) -> Result<String> {
        self.retry
            .run("create_label", || async move {
                let label = Label {
                    name: Some(name.to_string()),
                    message_list_visibility: Some("show".to_string()),
                    label_list_visibility: Some("labelShow".to_string()),
                    ..Default::default()
                };

                let (_, created_label) = self
                    .timed(
                        "create_label",
                        self.hub
                            .users()
                            .labels_create(label, "me")
                            .add_scope(GMAIL_SCOPE)
                            .doit(),
                    )
                    .await?;

                created_label
                    .id
                    .ok_or_else(|| LabelerError::LabelError("Created label has no ID".to_string()))
            })
            .await
    }

    async fn apply_label(&self, message_id: &str, label_id: &str) -> Result<()> {
        self.retry
            .run("apply_label", || async move {
                let modify_request = ModifyMessageRequest {
                    add_label_ids: Some(vec![label_id.to_string()]),
                    remove_label_ids: None,
                };

                self.timed(
                    "apply_label",
                    self.hub
                        .users()
                        .messages_modify(modify_request, "me", message_id)
                        .add_scope(GMAIL_SCOPE)
                        .doit(),
                )
                .await?;

                Ok(())
            })
            .await
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;

    mockall::mock! {
        pub Gmail {}

        #[async_trait]
        impl GmailClient for Gmail {
            async fn list_messages_page(&self, query: &str, page_token: Option<String>) -> Result<MessagePage>;
            async fn get_message(&self, id: &str) -> Result<Message>;
            async fn list_labels(&self) -> Result<Vec<LabelInfo>>;
            async fn create_label(&self, name: &str) -> Result<String>;
            async fn apply_label(&self, message_id: &str, label_id: &str) -> Result<()>;
        }
    }
}
