// Spelling correction services
//
// Correction itself is delegated to an external engine; this module only
// defines the request/response boundary and adapters for the engines we call:
// - Ollama: an LLM asked to fix spelling and return JSON
// - Command: any program that reads text on stdin and writes the fix to stdout
// - Passthrough: identity, used when correction is explicitly turned off

pub mod command;
pub mod ollama;
pub mod passthrough;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

pub use command::CommandCorrector;
pub use ollama::OllamaCorrector;
pub use passthrough::PassthroughCorrector;

use crate::config::{CorrectorConfig, CorrectorKind};
use crate::error::Result;

/// External spelling corrector: `correct(text) -> text`
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SpellingCorrector: Send + Sync {
    /// Return the corrected form of `text`
    async fn correct(&self, text: &str) -> Result<String>;

    /// Short name for logging
    fn name(&self) -> &str;

    /// Verify the service can be reached before any file is touched
    async fn check_availability(&self) -> Result<()> {
        Ok(())
    }
}

/// Factory for creating corrector instances
pub struct CorrectorFactory;

impl CorrectorFactory {
    /// Create a corrector based on the configured kind
    pub fn create_corrector(config: &CorrectorConfig) -> Result<Box<dyn SpellingCorrector>> {
        match config.kind {
            CorrectorKind::Ollama => Ok(Box::new(OllamaCorrector::new(config)?)),
            CorrectorKind::Command => Ok(Box::new(CommandCorrector::from_config(config)?)),
            CorrectorKind::Passthrough => Ok(Box::new(PassthroughCorrector)),
        }
    }
}
