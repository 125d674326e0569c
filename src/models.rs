use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The two kinds of job mail the labeler recognises
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum JobCategory {
    Rejection,
    Interview,
}

impl JobCategory {
    pub const ALL: [JobCategory; 2] = [JobCategory::Rejection, JobCategory::Interview];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobCategory::Rejection => "rejection",
            JobCategory::Interview => "interview",
        }
    }
}

impl fmt::Display for JobCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of running both predicates over one message
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub rejection: bool,
    pub interview: bool,
}

/// Subject and plain-text body pulled out of a Gmail message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedText {
    pub subject: String,
    pub body: String,
}

/// One page of a message listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessagePage {
    pub ids: Vec<String>,
    pub next_page_token: Option<String>,
}

/// Label info returned from Gmail API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelInfo {
    pub id: String,
    pub name: String,
}

/// A message that matched a category during a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelEvent {
    pub message_id: String,
    pub category: JobCategory,
    pub label_name: String,
    pub subject: String,
    /// False when the run was a dry run and the label was only planned
    pub applied: bool,
}

/// Maximum subject characters shown in a progress line
pub const SUBJECT_PREVIEW_CHARS: usize = 60;

impl LabelEvent {
    /// Operator-facing progress line, e.g. `Labeled as 'Unfortunately Jobs': Your application...`
    pub fn progress_line(&self) -> String {
        let preview: String = self.subject.chars().take(SUBJECT_PREVIEW_CHARS).collect();
        if self.applied {
            format!("Labeled as '{}': {}...", self.label_name, preview)
        } else {
            format!("Would label as '{}': {}...", self.label_name, preview)
        }
    }
}

/// Per-category counters for a run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryTally {
    pub category: JobCategory,
    pub label_name: String,
    /// None when a dry run found no existing label of that name
    pub label_id: Option<String>,
    pub messages_labeled: usize,
}

/// Summary of a completed labeling run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub retention_days: u32,
    pub messages_scanned: usize,
    pub tallies: Vec<CategoryTally>,
    pub dry_run: bool,
}

impl RunReport {
    pub fn duration_seconds(&self) -> i64 {
        (self.completed_at - self.started_at).num_seconds()
    }

    pub fn labeled(&self, category: JobCategory) -> usize {
        self.tallies
            .iter()
            .filter(|t| t.category == category)
            .map(|t| t.messages_labeled)
            .sum()
    }
}
