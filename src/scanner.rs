//! Retention-window message listing with transparent pagination

use async_stream::stream;
use futures::stream::Stream;
use std::sync::Arc;
use tracing::{debug, info};

use crate::client::GmailClient;
use crate::error::Result;

/// Gmail search query selecting messages newer than `days` days
pub fn retention_query(days: u32) -> String {
    format!("newer_than:{}d", days)
}

/// Lists message IDs, following `next_page_token` until the listing is exhausted
pub struct MessageScanner {
    client: Arc<dyn GmailClient>,
}

impl MessageScanner {
    pub fn new(client: Arc<dyn GmailClient>) -> Self {
        Self { client }
    }

    /// All message IDs newer than the retention window, in listing order
    pub async fn list_recent_ids(&self, window_days: u32) -> Result<Vec<String>> {
        self.list_all_ids(&retention_query(window_days)).await
    }

    /// All message IDs matching `query`, in listing order
    ///
    /// Each page is requested exactly once. An empty page that still carries a
    /// token is followed; the listing ends only when no token is returned.
    pub async fn list_all_ids(&self, query: &str) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let page = self.client.list_messages_page(query, page_token).await?;
            pages += 1;
            debug!("Page {}: {} message IDs", pages, page.ids.len());
            ids.extend(page.ids);

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        info!(
            "Listed {} messages for query '{}' across {} page(s)",
            ids.len(),
            query,
            pages
        );
        Ok(ids)
    }

    /// Lazily yield message IDs matching `query`, fetching pages on demand
    ///
    /// The stream ends after the first error.
    pub fn stream_ids<'a>(&'a self, query: &'a str) -> impl Stream<Item = Result<String>> + Send + 'a {
        stream! {
            let mut page_token: Option<String> = None;

            loop {
                let page = match self.client.list_messages_page(query, page_token.take()).await {
                    Ok(page) => page,
                    Err(e) => {
                        yield Err(e);
                        break;
                    }
                };

                for id in page.ids {
                    yield Ok(id);
                }

                match page.next_page_token {
                    Some(token) if !token.is_empty() => page_token = Some(token),
                    _ => break,
                }
            }
        }
    }
}
