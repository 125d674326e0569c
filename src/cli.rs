//! Command-line surface: argument parsing, progress display and the run pipeline

use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::auth;
use crate::classifier::JobMailClassifier;
use crate::client::{ProductionGmailClient, RetryPolicy};
use crate::config::Config;
use crate::error::Result;
use crate::extractor::BodyExtractor;
use crate::labeler::{JobLabeler, LabelObserver, LabelerSettings};
use crate::models::{Classification, JobCategory, LabelEvent, RunReport};

#[derive(Parser, Debug)]
#[command(name = "job-mail-labeler")]
#[command(version)]
#[command(about = "Label job rejections and interview invitations in Gmail", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Path to OAuth2 client registration file
    #[arg(long, default_value = "credentials.json")]
    pub credentials: PathBuf,

    /// Path to token cache file
    #[arg(long, default_value = ".job-mail-labeler/token.json")]
    pub token_cache: PathBuf,

    /// Log at debug level
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit log lines as JSON
    #[arg(long)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Authenticate with Gmail API
    Auth {
        /// Discard the cached token and ask for a fresh grant
        #[arg(long)]
        force: bool,
    },

    /// Scan recent mail and apply labels
    Run(RunArgs),

    /// Classify a subject/body pair without touching Gmail
    Classify {
        #[arg(short, long, default_value = "")]
        subject: String,

        #[arg(short, long, default_value = "")]
        body: String,
    },

    /// Generate example configuration file
    InitConfig {
        /// Path to create config file
        #[arg(short, long, default_value = "config.toml")]
        output: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Which categories to label
    #[arg(long, value_enum, default_value_t = PassSelection::Both)]
    pub pass: PassSelection,

    /// Retention window in days (overrides scan.retention_days)
    #[arg(long)]
    pub days: Option<u32>,

    /// Label for rejections (overrides labels.rejection)
    #[arg(long)]
    pub rejection_label: Option<String>,

    /// Label for interview invitations (overrides labels.interview)
    #[arg(long)]
    pub interview_label: Option<String>,

    /// Report what would be labeled without creating or applying labels
    #[arg(long)]
    pub dry_run: bool,

    /// Write a Markdown report of the run to this path
    #[arg(long)]
    pub report: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PassSelection {
    Rejection,
    Interview,
    #[default]
    Both,
}

impl PassSelection {
    /// Categories in the order their passes run
    pub fn categories(&self) -> Vec<JobCategory> {
        match self {
            PassSelection::Rejection => vec![JobCategory::Rejection],
            PassSelection::Interview => vec![JobCategory::Interview],
            PassSelection::Both => JobCategory::ALL.to_vec(),
        }
    }
}

impl RunArgs {
    /// Fold command-line overrides into the loaded configuration
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(days) = self.days {
            config.scan.retention_days = days;
        }
        if let Some(label) = &self.rejection_label {
            config.labels.rejection = label.clone();
        }
        if let Some(label) = &self.interview_label {
            config.labels.interview = label.clone();
        }
        if self.dry_run {
            config.execution.dry_run = true;
        }
    }
}

/// Spinners and the per-message bar, drawn through one `MultiProgress`
pub struct ProgressReporter {
    multi: MultiProgress,
    spinner_style: ProgressStyle,
    bar_style: ProgressStyle,
}

impl ProgressReporter {
    /// Share a MultiProgress with the log writer so log lines print above the bars
    pub fn with_multi_progress(multi: MultiProgress) -> Self {
        let spinner_style = ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed:>6}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ");

        let bar_style = ProgressStyle::default_bar()
            .template("[{elapsed:>6}] {bar:40.cyan/blue} {pos:>7}/{len:7} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-");

        Self {
            multi,
            spinner_style,
            bar_style,
        }
    }

    pub fn add_spinner(&self, msg: &str) -> ProgressBar {
        let pb = self.multi.add(ProgressBar::new_spinner());
        pb.set_style(self.spinner_style.clone());
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }

    pub fn add_progress_bar(&self, len: u64, msg: &str) -> ProgressBar {
        let pb = self.multi.add(ProgressBar::new(len));
        pb.set_style(self.bar_style.clone());
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }

    /// Finish a spinner and clear it from the multi-progress display
    pub fn finish_spinner(&self, pb: &ProgressBar, msg: &str) {
        pb.finish_and_clear();
        self.println(&format!("  ✓ {}", msg));
    }

    /// Print a line above any active bars (plain stdout when bars are hidden)
    pub fn println(&self, line: &str) {
        if self.multi.is_hidden() || self.multi.println(line).is_err() {
            println!("{}", line);
        }
    }
}

/// Drives a progress bar from orchestrator notifications and prints one
/// line per labeled message
pub struct ProgressObserver<'a> {
    reporter: &'a ProgressReporter,
    bar: Option<ProgressBar>,
}

impl<'a> ProgressObserver<'a> {
    pub fn new(reporter: &'a ProgressReporter) -> Self {
        Self {
            reporter,
            bar: None,
        }
    }

    pub fn finish(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

impl LabelObserver for ProgressObserver<'_> {
    fn on_listed(&mut self, total: usize) {
        self.reporter
            .println(&format!("  ✓ Found {} messages in the retention window", total));
        self.bar = Some(
            self.reporter
                .add_progress_bar(total as u64, "Classifying messages..."),
        );
    }

    fn on_message_processed(&mut self) {
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }

    fn on_labeled(&mut self, event: &LabelEvent) {
        self.reporter.println(&event.progress_line());
    }
}

/// Authenticate, then run the selected labeling passes
pub async fn run_pipeline(cli: &Cli, args: &RunArgs, multi: MultiProgress) -> Result<RunReport> {
    let reporter = ProgressReporter::with_multi_progress(multi);

    let config_spinner = reporter.add_spinner("Loading configuration...");
    let mut config = Config::load(&cli.config).await?;
    args.apply_to(&mut config);
    config.validate()?;
    reporter.finish_spinner(&config_spinner, &format!("Configuration loaded from {:?}", cli.config));

    // Compile phrases before authenticating so a bad override fails fast
    let classifier = JobMailClassifier::new(
        &config.phrases.rejection_phrases(),
        &config.phrases.interview_phrases(),
    )?;

    let auth_spinner = reporter.add_spinner("Authenticating with Gmail API...");
    let hub = auth::initialize_gmail_hub(&cli.credentials, &cli.token_cache).await?;
    reporter.finish_spinner(&auth_spinner, "Gmail API authenticated successfully");

    let client = ProductionGmailClient::new(hub, RetryPolicy::from(&config.retry))
        .with_request_timeout(Duration::from_secs(config.retry.request_timeout_secs))
        .with_page_size(config.scan.page_size);
    let labeler = JobLabeler::new(
        Arc::new(client),
        classifier,
        BodyExtractor::new(config.extraction.recurse_nested_parts),
        LabelerSettings::from(&config),
    );

    let mut observer = ProgressObserver::new(&reporter);
    let result = labeler.run(&args.pass.categories(), &mut observer).await;
    observer.finish();
    let report = result?;

    if let Some(path) = &args.report {
        tokio::fs::write(path, report_markdown(&report)).await?;
        reporter.println(&format!("  ✓ Report written to {:?}", path));
    }

    Ok(report)
}

/// Offline classification using the configured phrase lists
pub async fn classify_text(cli: &Cli, subject: &str, body: &str) -> Result<Classification> {
    let config = Config::load(&cli.config).await?;
    let classifier = JobMailClassifier::new(
        &config.phrases.rejection_phrases(),
        &config.phrases.interview_phrases(),
    )?;

    for category in JobCategory::ALL {
        if let Some(phrase) = classifier.matching_phrase(category, subject, body) {
            tracing::info!("{} phrase matched: '{}'", category, phrase);
        }
    }

    Ok(classifier.classify(subject, body))
}

/// Plain-text summary printed after a run
pub fn render_summary(report: &RunReport) -> String {
    let mut out = String::new();
    out.push_str("\n========================================\n");
    if report.dry_run {
        out.push_str("Labeling Summary (DRY RUN)\n");
    } else {
        out.push_str("Labeling Summary\n");
    }
    out.push_str("========================================\n");
    out.push_str(&format!("Run ID: {}\n", report.run_id));
    out.push_str(&format!("Duration: {} seconds\n", report.duration_seconds()));
    out.push_str(&format!(
        "Messages scanned (last {} days): {}\n",
        report.retention_days, report.messages_scanned
    ));
    for tally in &report.tallies {
        let verb = if report.dry_run { "would be labeled" } else { "labeled" };
        out.push_str(&format!(
            "{} '{}': {} {}\n",
            capitalize(tally.category.as_str()),
            tally.label_name,
            tally.messages_labeled,
            verb
        ));
    }
    out.push_str("========================================");
    out
}

/// Markdown report of a run
pub fn report_markdown(report: &RunReport) -> String {
    let mut md = String::new();

    if report.dry_run {
        md.push_str("# Job Mail Labeling Report (DRY RUN)\n\n");
        md.push_str("> No labels were applied. This report shows what WOULD happen.\n\n");
    } else {
        md.push_str("# Job Mail Labeling Report\n\n");
    }
    md.push_str(&format!(
        "Generated: {}\n\n",
        report.completed_at.format("%Y-%m-%d %H:%M:%S")
    ));

    md.push_str("## Summary\n\n");
    md.push_str(&format!("- **Run ID:** {}\n", report.run_id));
    md.push_str(&format!(
        "- **Retention window:** {} days\n",
        report.retention_days
    ));
    md.push_str(&format!("- **Messages scanned:** {}\n", report.messages_scanned));
    md.push_str(&format!(
        "- **Processing time:** {} minutes {} seconds\n\n",
        report.duration_seconds() / 60,
        report.duration_seconds() % 60
    ));

    md.push_str("## Labels\n\n");
    md.push_str("| Category | Label | Messages |\n");
    md.push_str("|----------|-------|----------|\n");
    for tally in &report.tallies {
        md.push_str(&format!(
            "| {} | {} | {} |\n",
            tally.category,
            tally.label_name.replace('|', "\\|"),
            tally.messages_labeled
        ));
    }

    if report.dry_run {
        md.push_str("\n---\n\n");
        md.push_str("_To apply these labels, run the command again without the `--dry-run` flag._\n");
    }

    md
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CategoryTally;
    use chrono::Utc;

    fn report(dry_run: bool) -> RunReport {
        let now = Utc::now();
        RunReport {
            run_id: "run-1".to_string(),
            started_at: now,
            completed_at: now + chrono::Duration::seconds(75),
            retention_days: 30,
            messages_scanned: 12,
            tallies: vec![
                CategoryTally {
                    category: JobCategory::Rejection,
                    label_name: "Unfortunately Jobs".to_string(),
                    label_id: Some("Label_1".to_string()),
                    messages_labeled: 3,
                },
                CategoryTally {
                    category: JobCategory::Interview,
                    label_name: "Interview Scheduled".to_string(),
                    label_id: None,
                    messages_labeled: 1,
                },
            ],
            dry_run,
        }
    }

    #[test]
    fn test_parse_run_defaults() {
        let cli = Cli::try_parse_from(["job-mail-labeler", "run"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("config.toml"));
        assert_eq!(cli.token_cache, PathBuf::from(".job-mail-labeler/token.json"));
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.pass, PassSelection::Both);
                assert_eq!(args.days, None);
                assert!(!args.dry_run);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_run_with_overrides() {
        let cli = Cli::try_parse_from([
            "job-mail-labeler",
            "--verbose",
            "run",
            "--pass",
            "interview",
            "--days",
            "14",
            "--interview-label",
            "Jobs/Interviews",
            "--dry-run",
        ])
        .unwrap();
        assert!(cli.verbose);

        let Commands::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.pass.categories(), vec![JobCategory::Interview]);

        let mut config = Config::default();
        args.apply_to(&mut config);
        assert_eq!(config.scan.retention_days, 14);
        assert_eq!(config.labels.interview, "Jobs/Interviews");
        assert_eq!(config.labels.rejection, "Unfortunately Jobs");
        assert!(config.execution.dry_run);
    }

    #[test]
    fn test_invalid_pass_rejected() {
        assert!(Cli::try_parse_from(["job-mail-labeler", "run", "--pass", "offers"]).is_err());
    }

    #[test]
    fn test_pass_selection_order() {
        assert_eq!(
            PassSelection::Both.categories(),
            vec![JobCategory::Rejection, JobCategory::Interview]
        );
        assert_eq!(PassSelection::Rejection.categories(), vec![JobCategory::Rejection]);
    }

    #[test]
    fn test_parse_classify() {
        let cli = Cli::try_parse_from([
            "job-mail-labeler",
            "classify",
            "--subject",
            "Interview invitation",
        ])
        .unwrap();
        match cli.command {
            Commands::Classify { subject, body } => {
                assert_eq!(subject, "Interview invitation");
                assert_eq!(body, "");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_classify_text_uses_builtin_lists_without_config() {
        let dir = tempfile::TempDir::new().unwrap();
        let config_path = dir.path().join("missing.toml");
        let cli = Cli::try_parse_from([
            "job-mail-labeler",
            "--config",
            config_path.to_str().unwrap(),
            "classify",
        ])
        .unwrap();

        let result = classify_text(&cli, "Update", "Sadly you were not selected.")
            .await
            .unwrap();
        assert!(result.rejection);
        assert!(!result.interview);
    }

    #[test]
    fn test_render_summary() {
        let summary = render_summary(&report(false));
        assert!(summary.contains("Run ID: run-1"));
        assert!(summary.contains("Duration: 75 seconds"));
        assert!(summary.contains("Messages scanned (last 30 days): 12"));
        assert!(summary.contains("Rejection 'Unfortunately Jobs': 3 labeled"));
        assert!(summary.contains("Interview 'Interview Scheduled': 1 labeled"));

        let dry = render_summary(&report(true));
        assert!(dry.contains("(DRY RUN)"));
        assert!(dry.contains("3 would be labeled"));
    }

    #[test]
    fn test_report_markdown() {
        let md = report_markdown(&report(false));
        assert!(md.starts_with("# Job Mail Labeling Report\n"));
        assert!(md.contains("| rejection | Unfortunately Jobs | 3 |"));
        assert!(md.contains("1 minutes 15 seconds"));
        assert!(!md.contains("DRY RUN"));

        let dry = report_markdown(&report(true));
        assert!(dry.contains("DRY RUN"));
        assert!(dry.contains("without the `--dry-run` flag"));
    }
}
