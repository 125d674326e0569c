//! Job Mail Labeler
//!
//! Scans recent Gmail messages, recognises job-application rejections and
//! interview invitations by phrase matching, and files them under Gmail labels.
//!
//! # Overview
//!
//! - **Matching**: literal phrases compiled into case-insensitive, whitespace-tolerant,
//!   word-bounded regexes
//! - **Classification**: two independent predicates over (subject, body)
//! - **Extraction**: subject and plain text pulled from `text/plain` and `text/html` parts
//! - **Gmail access**: OAuth2 with token caching, paginated listing, label lookup and creation
//! - **Orchestration**: list → fetch → extract → classify → label, one message at a time
//!
//! # Example Usage
//!
//! ```no_run
//! use job_mail_labeler::{auth, Config, JobCategory, JobLabeler, NoopObserver};
//! use job_mail_labeler::client::{ProductionGmailClient, RetryPolicy};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml".as_ref()).await?;
//!
//!     let hub = auth::initialize_gmail_hub(
//!         "credentials.json".as_ref(),
//!         ".job-mail-labeler/token.json".as_ref(),
//!     )
//!     .await?;
//!
//!     let client = ProductionGmailClient::new(hub, RetryPolicy::from(&config.retry));
//!     let labeler = JobLabeler::from_config(Arc::new(client), &config)?;
//!
//!     let report = labeler.run(&JobCategory::ALL, &mut NoopObserver).await?;
//!     println!("{} rejections labeled", report.labeled(JobCategory::Rejection));
//!     Ok(())
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`matcher`] - Phrase to regex compilation
//! - [`phrases`] - Built-in rejection and interview phrase lists
//! - [`classifier`] - Rejection/interview predicates
//! - [`extractor`] - Subject and body extraction from Gmail payloads
//! - [`auth`] - OAuth2 authentication and Gmail API initialization
//! - [`client`] - Gmail API client trait and retrying production client
//! - [`scanner`] - Paginated retention-window listing
//! - [`label_manager`] - Label lookup and creation
//! - [`labeler`] - Run orchestration
//! - [`cli`] - Command-line interface
//! - [`config`] - Configuration management
//! - [`error`] - Error types and result aliases
//! - [`models`] - Core data structures

pub mod auth;
pub mod classifier;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod extractor;
pub mod label_manager;
pub mod labeler;
pub mod matcher;
pub mod models;
pub mod phrases;
pub mod scanner;

// Re-export commonly used types for convenience
pub use error::{LabelerError, Result};

// Core data models
pub use models::{
    CategoryTally, Classification, ExtractedText, JobCategory, LabelEvent, LabelInfo,
    MessagePage, RunReport,
};

// Matching and classification
pub use classifier::JobMailClassifier;
pub use extractor::BodyExtractor;
pub use matcher::PhraseMatcher;

// Config types
pub use config::{
    Config, ExecutionConfig, ExtractionConfig, LabelConfig, PhrasesConfig, RetryConfig, ScanConfig,
};

// Client traits
pub use client::{GmailClient, ProductionGmailClient, RetryPolicy};

// Gmail helpers
pub use label_manager::LabelManager;
pub use scanner::MessageScanner;

// Orchestration
pub use labeler::{JobLabeler, LabelObserver, LabelerSettings, NoopObserver};

// CLI types (for binary usage)
pub use cli::{Cli, Commands, ProgressReporter};
