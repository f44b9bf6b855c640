/// Configuration system for release-digest
///
/// Supports loading from multiple sources with priority:
/// CLI args > Environment variables > Config file > Defaults
use crate::error::{ConfigError, DigestError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Prefix shared by every environment override
pub const ENV_PREFIX: &str = "RELEASE_DIGEST_";

/// Smallest stage budget that still leaves room for the merge-overhead reserve
pub const MIN_STAGE_CHARS: usize = 4000;

/// Smallest per-line cap that leaves room for the ellipsis marker
pub const MIN_LINE_CHARS: usize = 4;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Commit range selection
    #[serde(default)]
    pub range: RangeConfig,

    /// Per-commit diff extraction limits
    #[serde(default)]
    pub diff: DiffConfig,

    /// Staged summarization budget
    #[serde(default)]
    pub staging: StagingConfig,

    /// Remote summarization endpoint
    #[serde(default)]
    pub summarizer: SummarizerConfig,
}

/// Commit range configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangeConfig {
    /// Maximum commits per run; the oldest are dropped beyond this
    #[serde(default = "default_max_commits")]
    pub max_commits: usize,

    /// Explicit comparison tag instead of the nearest older tag
    #[serde(default)]
    pub previous_tag: Option<String>,
}

/// Diff extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffConfig {
    /// Maximum change lines kept per commit
    #[serde(default = "default_max_diff_lines")]
    pub max_lines: usize,

    /// Maximum characters per change line before truncation
    #[serde(default = "default_max_line_chars")]
    pub max_line_chars: usize,

    /// Extensions diffed at line granularity (no leading dot)
    #[serde(default = "default_source_extensions")]
    pub source_extensions: Vec<String>,
}

/// Staged summarization configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagingConfig {
    /// Maximum characters submitted in one summarization stage
    #[serde(default = "default_max_stage_chars")]
    pub max_stage_chars: usize,
}

/// Summarization endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizerConfig {
    /// Model identifier sent with every request
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL of an OpenAI-style Responses API
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Instructions for the direct and final stages
    #[serde(default = "default_instructions")]
    pub instructions: String,

    /// Instructions for each batch stage
    #[serde(default = "default_batch_instructions")]
    pub batch_instructions: String,
}

// Default value functions
fn default_max_commits() -> usize {
    200
}

fn default_max_diff_lines() -> usize {
    120
}

fn default_max_line_chars() -> usize {
    300
}

fn default_max_stage_chars() -> usize {
    400_000
}

fn default_model() -> String {
    "gpt-4.1-mini".to_string()
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_instructions() -> String {
    "You write release notes. Using the commits and summaries provided, produce \
     concise Markdown release notes grouped under headings such as Features, Fixes, \
     and Maintenance. Mention breaking changes first. Do not invent changes that \
     are not supported by the input."
        .to_string()
}

fn default_batch_instructions() -> String {
    "Summarize the following commits into short bullet points describing \
     user-visible changes, fixes, and notable internal work. One bullet per \
     change; keep commit intent, drop noise."
        .to_string()
}

/// Built-in source extensions: programming languages, web sources and build scripts
pub fn default_source_extensions() -> Vec<String> {
    [
        // Systems and compiled languages
        "rs", "c", "h", "cc", "cpp", "cxx", "hpp", "hh", "go", "zig", "swift", "m", "mm",
        // JVM and .NET
        "java", "kt", "kts", "scala", "groovy", "clj", "cs", "fs", "vb",
        // Scripting
        "py", "rb", "php", "pl", "pm", "lua", "r", "jl", "dart", "ex", "exs", "erl", "hrl",
        "hs", "ml", "mli", "elm", "nim", "cr",
        // Web
        "js", "mjs", "cjs", "jsx", "ts", "mts", "cts", "tsx", "vue", "svelte", "astro", "css",
        "scss", "sass", "less", "html", "htm",
        // Shell, data access and build logic
        "sh", "bash", "zsh", "fish", "ps1", "sql", "proto", "graphql", "gradle", "cmake", "tf",
        "nix",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for RangeConfig {
    fn default() -> Self {
        Self {
            max_commits: default_max_commits(),
            previous_tag: None,
        }
    }
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            max_lines: default_max_diff_lines(),
            max_line_chars: default_max_line_chars(),
            source_extensions: default_source_extensions(),
        }
    }
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            max_stage_chars: default_max_stage_chars(),
        }
    }
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_base: default_api_base(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
            instructions: default_instructions(),
            batch_instructions: default_batch_instructions(),
        }
    }
}

/// Lower-case an extension and strip any leading dots
pub fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_lowercase()
}

fn invalid(key: &str, reason: impl Into<String>) -> DigestError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        reason: reason.into(),
    }
    .into()
}

fn parse_count(key: &str, raw: &str) -> Result<usize, DigestError> {
    raw.trim()
        .parse::<usize>()
        .map_err(|e| invalid(key, format!("expected a non-negative integer, got '{}': {}", raw, e)))
}

impl Config {
    /// Load configuration from file
    pub fn from_file(path: &Path) -> Result<Self, DigestError> {
        let mut config = Self::read_file(path)?;
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    /// Parse a config file without validating it
    fn read_file(path: &Path) -> Result<Self, DigestError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()).into());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::LoadFailed(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| ConfigError::ParseFailed(format!("Invalid TOML: {}", e)))?;
        Ok(config)
    }

    /// Parse the default config file, or start from defaults when there is none
    fn read_default() -> Result<Self, DigestError> {
        let config_path = crate::paths::PlatformPaths::default_config_path();

        if config_path.exists() {
            tracing::info!("Loading config from: {}", config_path.display());
            Self::read_file(&config_path)
        } else {
            tracing::debug!("No config file found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration from default location or fall back to defaults
    pub fn load_or_default() -> Result<Self, DigestError> {
        let mut config = Self::read_default()?;
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<(), DigestError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConfigError::SaveFailed(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SaveFailed(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| ConfigError::SaveFailed(format!("Failed to write config file: {}", e)))?;

        tracing::info!("Saved config to: {}", path.display());
        Ok(())
    }

    /// Normalize free-form values (extension spelling, blank override)
    pub fn normalize(&mut self) {
        let mut extensions: Vec<String> = self
            .diff
            .source_extensions
            .iter()
            .map(|e| normalize_extension(e))
            .filter(|e| !e.is_empty())
            .collect();
        extensions.sort();
        extensions.dedup();
        self.diff.source_extensions = extensions;

        if let Some(tag) = &self.range.previous_tag {
            let trimmed = tag.trim();
            self.range.previous_tag = Some(trimmed.to_string());
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), DigestError> {
        if self.range.max_commits == 0 {
            return Err(invalid("range.max_commits", "must be greater than 0"));
        }

        if let Some(tag) = &self.range.previous_tag
            && tag.trim().is_empty()
        {
            return Err(invalid("range.previous_tag", "must not be blank"));
        }

        if self.diff.max_lines == 0 {
            return Err(invalid("diff.max_lines", "must be greater than 0"));
        }

        if self.diff.max_line_chars < MIN_LINE_CHARS {
            return Err(invalid(
                "diff.max_line_chars",
                format!(
                    "must be at least {}, got {}",
                    MIN_LINE_CHARS, self.diff.max_line_chars
                ),
            ));
        }

        if self
            .diff
            .source_extensions
            .iter()
            .all(|e| normalize_extension(e).is_empty())
        {
            return Err(invalid(
                "diff.source_extensions",
                "must contain at least one extension",
            ));
        }

        if self.staging.max_stage_chars < MIN_STAGE_CHARS {
            return Err(invalid(
                "staging.max_stage_chars",
                format!(
                    "must be at least {}, got {}",
                    MIN_STAGE_CHARS, self.staging.max_stage_chars
                ),
            ));
        }

        if self.summarizer.model.trim().is_empty() {
            return Err(invalid("summarizer.model", "must not be empty"));
        }

        if self.summarizer.timeout_secs == 0 {
            return Err(invalid("summarizer.timeout_secs", "must be greater than 0"));
        }

        Ok(())
    }

    /// Apply environment variable overrides
    ///
    /// A malformed numeric override is an error rather than being ignored.
    pub fn apply_env_overrides(&mut self) -> Result<(), DigestError> {
        self.apply_overrides_from(|name| std::env::var(name).ok())
    }

    /// Apply overrides using an arbitrary variable lookup
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<(), DigestError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |suffix: &str| lookup(&format!("{}{}", ENV_PREFIX, suffix));

        if let Some(raw) = var("MAX_COMMITS") {
            self.range.max_commits = parse_count("RELEASE_DIGEST_MAX_COMMITS", &raw)?;
        }

        if let Some(raw) = var("MAX_DIFF_LINES") {
            self.diff.max_lines = parse_count("RELEASE_DIGEST_MAX_DIFF_LINES", &raw)?;
        }

        if let Some(raw) = var("MAX_LINE_CHARS") {
            self.diff.max_line_chars = parse_count("RELEASE_DIGEST_MAX_LINE_CHARS", &raw)?;
        }

        if let Some(raw) = var("MAX_STAGE_CHARS") {
            self.staging.max_stage_chars = parse_count("RELEASE_DIGEST_MAX_STAGE_CHARS", &raw)?;
        }

        if let Some(raw) = var("SOURCE_EXTENSIONS") {
            self.diff.source_extensions = raw
                .split(',')
                .map(normalize_extension)
                .filter(|e| !e.is_empty())
                .collect();
        }

        if let Some(tag) = var("PREVIOUS_TAG")
            && !tag.trim().is_empty()
        {
            self.range.previous_tag = Some(tag.trim().to_string());
        }

        if let Some(model) = var("MODEL") {
            self.summarizer.model = model;
        }

        if let Some(base) = var("API_BASE") {
            self.summarizer.api_base = base;
        }

        Ok(())
    }

    /// Apply command-line values; they take precedence over everything else
    pub fn apply_cli_overrides(&mut self, cli: &CliOverrides) {
        if let Some(tag) = &cli.previous_tag {
            self.range.previous_tag = Some(tag.clone());
        }
        if let Some(n) = cli.max_commits {
            self.range.max_commits = n;
        }
        if let Some(n) = cli.max_diff_lines {
            self.diff.max_lines = n;
        }
        if let Some(n) = cli.max_stage_chars {
            self.staging.max_stage_chars = n;
        }
    }

    /// Layer file (or defaults), environment and command line, then validate once
    pub fn resolve_from<F>(
        path: Option<&PathBuf>,
        lookup: F,
        cli: &CliOverrides,
    ) -> Result<Self, DigestError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match path {
            Some(path) => Self::read_file(path)?,
            None => Self::read_default()?,
        };
        config.apply_overrides_from(lookup)?;
        config.apply_cli_overrides(cli);
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    /// [`resolve_from`](Self::resolve_from) with the process environment
    pub fn resolve(path: Option<&PathBuf>, cli: &CliOverrides) -> Result<Self, DigestError> {
        Self::resolve_from(path, |name| std::env::var(name).ok(), cli)
    }

    /// Load from the default location, apply environment overrides and validate
    pub fn new() -> Result<Self, DigestError> {
        Self::load(None)
    }

    /// Load from an explicit path, apply environment overrides and validate
    pub fn load(path: Option<&PathBuf>) -> Result<Self, DigestError> {
        Self::resolve(path, &CliOverrides::default())
    }
}

/// Limits given on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub previous_tag: Option<String>,
    pub max_commits: Option<usize>,
    pub max_diff_lines: Option<usize>,
    pub max_stage_chars: Option<usize>,
}
