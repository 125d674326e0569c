//! Label lookup and creation with a per-run cache
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::client::GmailClient;
use crate::error::{LabelerError, Result};

/// Resolves label names to Gmail label IDs, creating missing labels once
pub struct LabelManager {
    client: Arc<dyn GmailClient>,
    label_cache: HashMap<String, String>, // lowercase name -> id
    loaded: bool,
}

impl LabelManager {
    pub fn new(client: Arc<dyn GmailClient>) -> Self {
        Self {
            client,
            label_cache: HashMap::new(),
            loaded: false,
        }
    }

    /// Loads all existing labels from Gmail into the cache
    /// Note: Cache keys are stored lowercase for case-insensitive lookups
    pub async fn load_existing_labels(&mut self) -> Result<usize> {
        let labels = self.client.list_labels().await?;
        let count = labels.len();

        for label in labels {
            self.cache_insert(&label.name, label.id);
        }
        self.loaded = true;

        debug!("Loaded {} existing labels into cache", count);
        Ok(count)
    }

    fn cache_get(&self, name: &str) -> Option<&String> {
        self.label_cache.get(&name.to_lowercase())
    }

    fn cache_insert(&mut self, name: &str, id: String) {
        self.label_cache.insert(name.to_lowercase(), id);
    }

    /// Cached label ID, without touching the API
    pub fn get_label_id(&self, name: &str) -> Option<String> {
        self.cache_get(name.trim()).cloned()
    }

    /// Looks a label up by name (case-insensitive) without ever creating it
    pub async fn find_label(&mut self, name: &str) -> Result<Option<String>> {
        if !self.loaded {
            self.load_existing_labels().await?;
        }
        Ok(self.get_label_id(name))
    }

    /// Gets label ID by name (case-insensitive), creating the label if necessary
    ///
    /// Repeated calls for the same name return the same ID and create at most
    /// one label.
    pub async fn get_or_create_label(&mut self, name: &str) -> Result<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LabelerError::LabelError("Label name cannot be empty".to_string()));
        }

        if !self.loaded {
            self.load_existing_labels().await?;
        }

        if let Some(id) = self.cache_get(name) {
            debug!("Label '{}' already exists with ID {}", name, id);
            return Ok(id.clone());
        }

        info!("Creating label: {}", name);
        let label_id = match self.client.create_label(name).await {
            Ok(id) => id,
            Err(e) if e.is_permanent() => {
                // Someone may have created it since our listing; a refreshed
                // listing settles it before giving up
                warn!("Creating label '{}' failed ({}), refreshing label list", name, e);
                self.load_existing_labels().await?;
                match self.cache_get(name) {
                    Some(id) => return Ok(id.clone()),
                    None => {
                        return Err(LabelerError::LabelError(format!(
                            "Failed to create label '{}': {}",
                            name, e
                        )))
                    }
                }
            }
            Err(e) => return Err(e),
        };

        self.cache_insert(name, label_id.clone());

        info!("Created label '{}' with ID: {}", name, label_id);
        Ok(label_id)
    }
}
