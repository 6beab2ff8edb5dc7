use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use super::SpellingCorrector;
use crate::config::CorrectorConfig;
use crate::error::{CaptionError, Result};

/// Spelling correction through an external program.
///
/// Each unit is written to the program's stdin and the corrected text is read
/// back from stdout, with a single trailing newline removed.
#[derive(Debug, Clone)]
pub struct CommandCorrector {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandCorrector {
    pub fn new<S: Into<String>>(program: S) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: Duration::from_secs(120),
        }
    }

    pub fn from_config(config: &CorrectorConfig) -> Result<Self> {
        let program = config.program.clone().ok_or_else(|| {
            CaptionError::Config("The command corrector needs `program` in [corrector]".to_string())
        })?;
        Ok(Self::new(program)
            .args(config.args.iter().cloned())
            .timeout(Duration::from_secs(config.timeout_secs)))
    }

    /// Add multiple arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(|s| s.into()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn run(&self, text: &str) -> Result<String> {
        debug!("Executing correction command: {} {:?}", self.program, self.args);

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| CaptionError::Correction(format!("Failed to start {}: {}", self.program, e)))?;

        // Feed stdin while draining stdout so large units cannot fill both pipes
        let stdin = child.stdin.take();
        let feed = async move {
            if let Some(mut stdin) = stdin {
                stdin.write_all(text.as_bytes()).await?;
            }
            Ok::<(), std::io::Error>(())
        };
        let (written, output) = tokio::join!(feed, child.wait_with_output());

        // A program that exits without reading stdin is judged by its exit status
        if let Err(e) = written {
            if e.kind() != std::io::ErrorKind::BrokenPipe {
                return Err(CaptionError::Correction(format!(
                    "Failed to write to {}: {}",
                    self.program, e
                )));
            }
        }

        let output = output
            .map_err(|e| CaptionError::Correction(format!("Failed to wait for {}: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CaptionError::Correction(format!(
                "{} failed ({}): {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8(output.stdout).map_err(|e| {
            CaptionError::Correction(format!("{} produced non UTF-8 output: {}", self.program, e))
        })?;

        Ok(strip_one_newline(stdout))
    }
}

fn strip_one_newline(mut text: String) -> String {
    if text.ends_with('\n') {
        text.pop();
        if text.ends_with('\r') {
            text.pop();
        }
    }
    text
}

#[async_trait]
impl SpellingCorrector for CommandCorrector {
    async fn correct(&self, text: &str) -> Result<String> {
        tokio::time::timeout(self.timeout, self.run(text))
            .await
            .map_err(|_| {
                CaptionError::Correction(format!(
                    "{} did not finish within {}s",
                    self.program,
                    self.timeout.as_secs()
                ))
            })?
    }

    fn name(&self) -> &str {
        "command"
    }
}
