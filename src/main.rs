use anyhow::{Context, Result};
use clap::Parser;
use release_digest::config::CliOverrides;
use release_digest::error::error_report;
use release_digest::{Config, DigestClient, DigestError};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_DESCRIBE"),
    " ",
    env!("GIT_COMMIT_HASH"),
    ", built ",
    env!("BUILD_TIMESTAMP"),
    ")"
);

/// Summarize the commits of a release tag into release notes
#[derive(Debug, Parser)]
#[command(name = "release-digest", version, long_version = LONG_VERSION)]
struct Cli {
    /// Release tag to describe
    tag: String,

    /// Path inside the git repository
    #[arg(long, default_value = ".")]
    repo: PathBuf,

    /// Compare against this tag instead of the previous one
    #[arg(long, env = "RELEASE_DIGEST_PREVIOUS_TAG")]
    previous_tag: Option<String>,

    /// Configuration file (defaults to the platform config location)
    #[arg(long, env = "RELEASE_DIGEST_CONFIG")]
    config: Option<PathBuf>,

    /// File with extra context appended to the prompt
    #[arg(long)]
    context_file: Option<PathBuf>,

    /// Write the digest here instead of stdout
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Print the prompt instead of calling the summarizer
    #[arg(long)]
    dry_run: bool,

    /// Print the batch plan as JSON instead of calling the summarizer
    #[arg(long, conflicts_with = "dry_run")]
    plan_json: bool,

    #[arg(long)]
    max_commits: Option<usize>,

    #[arg(long)]
    max_diff_lines: Option<usize>,

    #[arg(long)]
    max_stage_chars: Option<usize>,
}

impl Cli {
    /// Resolve configuration: command line over environment over file
    fn config(&self) -> Result<Config, DigestError> {
        let overrides = CliOverrides {
            previous_tag: self.previous_tag.clone(),
            max_commits: self.max_commits,
            max_diff_lines: self.max_diff_lines,
            max_stage_chars: self.max_stage_chars,
        };
        Config::resolve(self.config.as_ref(), &overrides)
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = cli.config()?;

    let context = match &cli.context_file {
        Some(path) => Some(
            std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read context file {}", path.display()))?,
        ),
        None => None,
    };

    let client = DigestClient::open(config, &cli.repo)?;

    let document = if cli.plan_json {
        let prepared = client.prepare(&cli.tag, context.as_deref())?;
        serde_json::to_string_pretty(&prepared.plan_report())?
    } else if cli.dry_run {
        let prepared = client.prepare(&cli.tag, context.as_deref())?;
        tracing::info!(
            "Dry run: {} commits, {} prompt chars, {} batches",
            prepared.records.len(),
            prepared.prompt_chars(),
            prepared.chunks.len()
        );
        prepared.prompt
    } else {
        let digest = client.generate(&cli.tag, context.as_deref())?;
        tracing::info!(
            "Digest for {} ({} commits since {}) via {:?}",
            digest.current,
            digest.commit_count,
            digest.previous,
            digest.outcome.mode
        );
        digest.outcome.text
    };

    match &cli.output {
        Some(path) => std::fs::write(path, format!("{}\n", document.trim_end()))
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => println!("{}", document.trim_end()),
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", error_report(&err));
            let user_error = err
                .downcast_ref::<DigestError>()
                .is_some_and(DigestError::is_user_error);
            ExitCode::from(if user_error { 2 } else { 1 })
        }
    }
}
