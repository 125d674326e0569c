//! Run orchestration: list recent mail, classify each message, apply labels
//!
//! Messages are processed strictly one after another. Every selected category
//! is evaluated independently against each fetched message, so a message that
//! reads as both a rejection and an interview receives both labels. The first
//! error aborts the run.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::classifier::JobMailClassifier;
use crate::client::GmailClient;
use crate::config::{Config, LabelConfig};
use crate::error::Result;
use crate::extractor::BodyExtractor;
use crate::label_manager::LabelManager;
use crate::models::{CategoryTally, JobCategory, LabelEvent, RunReport};
use crate::scanner::MessageScanner;

/// Receives progress notifications while a run is in flight
pub trait LabelObserver: Send {
    /// The retention-window listing finished with `total` message IDs
    fn on_listed(&mut self, _total: usize) {}

    /// One message has been fully processed
    fn on_message_processed(&mut self) {}

    /// A message matched a category (and was labeled unless this is a dry run)
    fn on_labeled(&mut self, _event: &LabelEvent) {}
}

/// Observer that ignores every notification
#[derive(Debug, Default)]
pub struct NoopObserver;

impl LabelObserver for NoopObserver {}

/// Run parameters that don't affect classification
#[derive(Debug, Clone)]
pub struct LabelerSettings {
    pub retention_days: u32,
    pub labels: LabelConfig,
    pub dry_run: bool,
}

impl Default for LabelerSettings {
    fn default() -> Self {
        Self {
            retention_days: 30,
            labels: LabelConfig::default(),
            dry_run: false,
        }
    }
}

impl From<&Config> for LabelerSettings {
    fn from(config: &Config) -> Self {
        Self {
            retention_days: config.scan.retention_days,
            labels: config.labels.clone(),
            dry_run: config.execution.dry_run,
        }
    }
}

struct PassTarget {
    category: JobCategory,
    label_name: String,
    label_id: Option<String>,
    labeled: usize,
}

pub struct JobLabeler {
    client: Arc<dyn GmailClient>,
    classifier: JobMailClassifier,
    extractor: BodyExtractor,
    settings: LabelerSettings,
}

impl JobLabeler {
    pub fn new(
        client: Arc<dyn GmailClient>,
        classifier: JobMailClassifier,
        extractor: BodyExtractor,
        settings: LabelerSettings,
    ) -> Self {
        Self {
            client,
            classifier,
            extractor,
            settings,
        }
    }

    /// Build a labeler from configuration, compiling the configured phrase lists
    pub fn from_config(client: Arc<dyn GmailClient>, config: &Config) -> Result<Self> {
        let classifier = JobMailClassifier::new(
            &config.phrases.rejection_phrases(),
            &config.phrases.interview_phrases(),
        )?;

        Ok(Self::new(
            client,
            classifier,
            BodyExtractor::new(config.extraction.recurse_nested_parts),
            LabelerSettings::from(config),
        ))
    }

    pub fn settings(&self) -> &LabelerSettings {
        &self.settings
    }

    /// Label every message in the retention window that matches a selected category
    pub async fn run(
        &self,
        categories: &[JobCategory],
        observer: &mut dyn LabelObserver,
    ) -> Result<RunReport> {
        let started_at = Utc::now();
        let run_id = Uuid::new_v4().to_string();
        let dry_run = self.settings.dry_run;

        info!(
            run_id = %run_id,
            dry_run,
            retention_days = self.settings.retention_days,
            nested_parts = self.extractor.recurses(),
            "Starting labeling run for {:?}",
            categories
        );

        let mut targets = self.resolve_targets(categories).await?;

        let scanner = MessageScanner::new(Arc::clone(&self.client));
        let ids = scanner.list_recent_ids(self.settings.retention_days).await?;
        observer.on_listed(ids.len());

        for id in &ids {
            let message = self.client.get_message(id).await?;
            let text = self.extractor.extract(&message);

            for target in targets.iter_mut() {
                let Some(phrase) =
                    self.classifier
                        .matching_phrase(target.category, &text.subject, &text.body)
                else {
                    continue;
                };
                debug!(
                    message_id = %id,
                    category = %target.category,
                    "Matched phrase '{}'",
                    phrase
                );

                let applied = match (&target.label_id, dry_run) {
                    (Some(label_id), false) => {
                        self.client.apply_label(id, label_id).await?;
                        true
                    }
                    _ => false,
                };
                target.labeled += 1;

                observer.on_labeled(&LabelEvent {
                    message_id: id.clone(),
                    category: target.category,
                    label_name: target.label_name.clone(),
                    subject: text.subject.clone(),
                    applied,
                });
            }

            observer.on_message_processed();
        }

        let report = RunReport {
            run_id,
            started_at,
            completed_at: Utc::now(),
            retention_days: self.settings.retention_days,
            messages_scanned: ids.len(),
            tallies: targets
                .into_iter()
                .map(|t| CategoryTally {
                    category: t.category,
                    label_name: t.label_name,
                    label_id: t.label_id,
                    messages_labeled: t.labeled,
                })
                .collect(),
            dry_run,
        };

        info!(
            run_id = %report.run_id,
            messages_scanned = report.messages_scanned,
            rejections = report.labeled(JobCategory::Rejection),
            interviews = report.labeled(JobCategory::Interview),
            "Labeling run complete in {}s",
            report.duration_seconds()
        );
        Ok(report)
    }

    /// Make sure every selected category has its label; a dry run only looks them up
    async fn resolve_targets(&self, categories: &[JobCategory]) -> Result<Vec<PassTarget>> {
        let mut labels = LabelManager::new(Arc::clone(&self.client));
        let mut targets: Vec<PassTarget> = Vec::with_capacity(categories.len());

        for &category in categories {
            if targets.iter().any(|t| t.category == category) {
                continue;
            }

            let label_name = self.settings.labels.name_for(category).to_string();
            let label_id = if self.settings.dry_run {
                labels.find_label(&label_name).await?
            } else {
                Some(labels.get_or_create_label(&label_name).await?)
            };
            debug!("Label for {} pass: '{}' ({:?})", category, label_name, label_id);

            targets.push(PassTarget {
                category,
                label_name,
                label_id,
                labeled: 0,
            });
        }

        Ok(targets)
    }
}
