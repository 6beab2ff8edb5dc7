use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::Level;

use crate::convert::ConversionDirection;
use crate::detect::DETECTION_SAMPLE_CHARS;
use crate::error::{CaptionError, Result};
use crate::terms::TermMap;

/// Config file picked up from the working directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "caption-polish.toml";

fn default_corrector_kind() -> CorrectorKind {
    CorrectorKind::Ollama
}

fn default_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "llama3.2:3b".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_cue_extensions() -> Vec<String> {
    vec!["srt".to_string()]
}

fn default_text_extensions() -> Vec<String> {
    vec!["txt".to_string()]
}

fn default_jobs() -> usize {
    1
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub corrector: CorrectorConfig,
    #[serde(default)]
    pub converter: ConverterConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrectorKind {
    /// Ask an Ollama model to fix spelling
    Ollama,
    /// Pipe each unit through an external program
    Command,
    /// Return text unchanged; correction explicitly disabled
    Passthrough,
}

impl std::str::FromStr for CorrectorKind {
    type Err = CaptionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "command" => Ok(Self::Command),
            "passthrough" | "none" => Ok(Self::Passthrough),
            _ => Err(CaptionError::Config(format!(
                "Invalid corrector '{}'. Valid correctors: ollama, command, passthrough",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectorConfig {
    /// Which correction service to call
    #[serde(default = "default_corrector_kind")]
    pub kind: CorrectorKind,
    /// Ollama endpoint URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Ollama model used for correction
    #[serde(default = "default_model")]
    pub model: String,
    /// Upper bound for a single correction call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Program for the command corrector
    #[serde(default)]
    pub program: Option<String>,
    /// Arguments for the command corrector
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for CorrectorConfig {
    fn default() -> Self {
        Self {
            kind: default_corrector_kind(),
            endpoint: default_endpoint(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
            program: None,
            args: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConverterConfig {
    #[serde(default)]
    pub direction: ConversionDirection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Extensions enumerated as subtitle files
    #[serde(default = "default_cue_extensions")]
    pub cue_extensions: Vec<String>,
    /// Extensions enumerated as transcripts
    #[serde(default = "default_text_extensions")]
    pub text_extensions: Vec<String>,
    /// Files processed concurrently in batch mode
    #[serde(default = "default_jobs")]
    pub jobs: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            cue_extensions: default_cue_extensions(),
            text_extensions: default_text_extensions(),
            jobs: default_jobs(),
        }
    }
}

impl BatchConfig {
    /// True when the file's extension is one of the enumerated ones
    pub fn matches<P: AsRef<Path>>(&self, path: P) -> bool {
        let Some(ext) = path.as_ref().extension().and_then(|e| e.to_str()) else {
            return false;
        };
        let ext = ext.to_lowercase();
        self.cue_extensions
            .iter()
            .chain(self.text_extensions.iter())
            .any(|known| known.trim_start_matches('.').eq_ignore_ascii_case(&ext))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Also write a daily-rotated log file into this directory
    #[serde(default)]
    pub file_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_dir: None,
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CaptionError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| CaptionError::Config(format!("Failed to parse config file: {}", e)))
    }

    /// Explicit path, else `caption-polish.toml` in the working directory, else defaults
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::from_file(DEFAULT_CONFIG_FILE),
            None => Ok(Self::default()),
        }
    }
}

/// Map a log level name to a tracing level; unknown names fall back to INFO.
pub fn parse_log_level(level: &str) -> Level {
    match level.trim().to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" | "critical" | "fatal" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Settings resolved once at startup and shared read-only by every file.
///
/// The term map is shared with the normalization pipeline, never copied.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub terms: Arc<TermMap>,
    pub sample_chars: usize,
    pub log_level: Level,
    pub show_progress: bool,
    pub jobs: usize,
    pub batch: BatchConfig,
}

impl RunConfig {
    pub fn new(log_level: Level, batch: BatchConfig) -> Self {
        let jobs = batch.jobs.max(1);
        Self {
            terms: Arc::new(TermMap::new()),
            sample_chars: DETECTION_SAMPLE_CHARS,
            log_level,
            show_progress: true,
            jobs,
            batch,
        }
    }

    pub fn with_terms(mut self, terms: TermMap) -> Self {
        self.terms = Arc::new(terms);
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self::new(Level::INFO, BatchConfig::default())
    }
}
