use async_trait::async_trait;

use super::SpellingCorrector;
use crate::error::Result;

/// Returns every unit unchanged.
pub struct PassthroughCorrector;

#[async_trait]
impl SpellingCorrector for PassthroughCorrector {
    async fn correct(&self, text: &str) -> Result<String> {
        Ok(text.to_string())
    }

    fn name(&self) -> &str {
        "passthrough"
    }
}
