use anyhow::Result;
use clap::Parser;
use indicatif::MultiProgress;
use job_mail_labeler::auth;
use job_mail_labeler::cli::{self, Cli, Commands};
use job_mail_labeler::client::{ProductionGmailClient, RetryPolicy};
use job_mail_labeler::config::Config;
use job_mail_labeler::error::LabelerError;
use std::io::Write;
use std::process;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

/// Buffers one log record and prints it above any live progress bars
#[derive(Clone)]
struct MultiProgressWriter {
    multi: Arc<MultiProgress>,
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl MultiProgressWriter {
    fn new(multi: Arc<MultiProgress>) -> Self {
        Self {
            multi,
            buffer: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl Write for MultiProgressWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if let Ok(mut buffer) = self.buffer.lock() {
            buffer.extend_from_slice(buf);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        let Ok(mut buffer) = self.buffer.lock() else {
            return Ok(());
        };
        if !buffer.is_empty() {
            let msg = String::from_utf8_lossy(&buffer);
            let msg = msg.trim_end_matches('\n');
            if !msg.is_empty() && (self.multi.is_hidden() || self.multi.println(msg).is_err()) {
                eprintln!("{}", msg);
            }
            buffer.clear();
        }
        Ok(())
    }
}

impl Drop for MultiProgressWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

/// Hands tracing a fresh [`MultiProgressWriter`] per record
#[derive(Clone)]
struct MultiProgressMakeWriter {
    multi: Arc<MultiProgress>,
}

impl MultiProgressMakeWriter {
    fn new(multi: Arc<MultiProgress>) -> Self {
        Self { multi }
    }
}

impl<'a> MakeWriter<'a> for MultiProgressMakeWriter {
    type Writer = MultiProgressWriter;

    fn make_writer(&'a self) -> Self::Writer {
        MultiProgressWriter::new(Arc::clone(&self.multi))
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        display_error(&e);
        eprintln!("\nFor help, run: job-mail-labeler --help");
        process::exit(1);
    }
}

fn init_tracing(cli: &Cli, multi: Arc<MultiProgress>) {
    let filter = if cli.verbose {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("job_mail_labeler=debug,warn"))
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("job_mail_labeler=info,warn"))
    };

    let make_writer = MultiProgressMakeWriter::new(multi);

    // Logs print above progress bars
    if cli.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(make_writer)
            .with_current_span(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(make_writer)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .init();
    }
}

async fn run() -> Result<()> {
    // Several dependencies pull in different rustls crypto providers; pick one
    #[cfg(not(windows))]
    rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install default crypto provider"))?;

    #[cfg(windows)]
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install default crypto provider"))?;

    let cli = Cli::parse();

    let multi_progress = Arc::new(MultiProgress::new());
    init_tracing(&cli, Arc::clone(&multi_progress));

    tracing::debug!("job-mail-labeler starting...");

    match &cli.command {
        Commands::Auth { force } => {
            tracing::info!("Authenticating with Gmail API...");

            if *force && auth::clear_token_cache(&cli.token_cache).await? {
                println!("Removed existing token cache");
            }

            // Triggers the browser consent flow when no usable token is cached
            let hub = auth::initialize_gmail_hub(&cli.credentials, &cli.token_cache).await?;

            println!("Successfully authenticated with Gmail API");
            println!("Token cached at: {:?}", cli.token_cache);

            let config = Config::load(&cli.config).await?;
            let client = ProductionGmailClient::new(hub, RetryPolicy::from(&config.retry));
            println!("Connected to account: {}", client.account_email().await?);

            Ok(())
        }

        Commands::Run(args) => {
            if args.dry_run {
                println!("Running in DRY RUN mode - no labels will be created or applied");
            }

            let report = cli::run_pipeline(&cli, args, (*multi_progress).clone()).await?;
            println!("{}", cli::render_summary(&report));

            Ok(())
        }

        Commands::Classify { subject, body } => {
            let result = cli::classify_text(&cli, subject, body).await?;
            println!("Rejection: {}", if result.rejection { "yes" } else { "no" });
            println!("Interview: {}", if result.interview { "yes" } else { "no" });

            Ok(())
        }

        Commands::InitConfig { output, force } => {
            if output.exists() && !force {
                return Err(LabelerError::ConfigError(format!(
                    "Configuration file already exists at {:?}. Use --force to overwrite.",
                    output
                ))
                .into());
            }

            Config::create_example(output).await?;

            println!("Created example configuration file at: {:?}", output);
            println!("\nEdit it to adjust the scan window, label names or phrase lists.");
            println!("Key settings to review:");
            println!("  - scan.retention_days: How many days of mail to scan");
            println!("  - labels.rejection / labels.interview: Label names to apply");
            println!("  - phrases.rejection / phrases.interview: Replace the built-in phrase lists");

            Ok(())
        }
    }
}

fn display_error(error: &anyhow::Error) {
    eprintln!("Error: {}", error);

    let mut cause = error.source();
    while let Some(e) = cause {
        eprintln!("  Caused by: {}", e);
        cause = e.source();
    }

    if let Some(labeler_err) = error.downcast_ref::<LabelerError>() {
        match labeler_err {
            LabelerError::AuthError(_) => {
                eprintln!("\nHint: Make sure credentials.json is valid, or set GMAIL_CLIENT_ID and GMAIL_CLIENT_SECRET.");
                eprintln!("      You can download credentials from Google Cloud Console.");
                eprintln!("      Try running: job-mail-labeler auth --force");
            }
            LabelerError::ApiError(_)
            | LabelerError::ServerError { .. }
            | LabelerError::NetworkError(_) => {
                eprintln!("\nHint: This may be a temporary API error.");
                eprintln!("      Try running the command again.");
            }
            LabelerError::RateLimitExceeded { .. } => {
                eprintln!("\nHint: Gmail is throttling this account.");
                eprintln!("      Wait a few minutes and try again.");
            }
            LabelerError::Forbidden(_) => {
                eprintln!("\nHint: The cached token may lack the gmail.modify scope.");
                eprintln!("      Try running: job-mail-labeler auth --force");
            }
            LabelerError::ConfigError(_) | LabelerError::InvalidPhrase { .. } => {
                eprintln!("\nHint: Check your configuration file for errors.");
                eprintln!("      Run: job-mail-labeler init-config --force");
            }
            _ => {}
        }
    }
}
