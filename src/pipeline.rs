use std::sync::Arc;
use tracing::debug;

use crate::convert::ScriptConverter;
use crate::correct::SpellingCorrector;
use crate::error::Result;
use crate::terms::TermMap;

/// Terminology -> spelling correction -> script conversion, applied per unit.
///
/// Terms are locked in before the corrector sees the text, and conversion
/// runs last so it sees corrected characters. Built once per run and shared
/// by reference with every file processor.
pub struct NormalizationPipeline {
    terms: Arc<TermMap>,
    corrector: Box<dyn SpellingCorrector>,
    converter: Box<dyn ScriptConverter>,
}

impl NormalizationPipeline {
    pub fn new(
        terms: impl Into<Arc<TermMap>>,
        corrector: Box<dyn SpellingCorrector>,
        converter: Box<dyn ScriptConverter>,
    ) -> Self {
        Self {
            terms: terms.into(),
            corrector,
            converter,
        }
    }

    /// Normalize one unit of text (a cue's text or a single line).
    pub async fn normalize(&self, text: &str) -> Result<String> {
        let termed = self.terms.apply(text);
        let corrected = self.corrector.correct(&termed).await?;
        let converted = self.converter.convert(&corrected);

        if converted != text {
            debug!("Normalized '{}' -> '{}'", text, converted);
        }
        Ok(converted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::{ConversionDirection, OpenCcConverter};
    use crate::correct::{MockSpellingCorrector, PassthroughCorrector};
    use crate::error::CaptionError;
    use mockall::predicate::eq;

    fn s2t() -> Box<dyn ScriptConverter> {
        Box::new(OpenCcConverter::new(ConversionDirection::S2t).unwrap())
    }

    #[tokio::test]
    async fn test_terms_then_conversion() {
        let terms: TermMap = [("AI", "人工智慧")].into_iter().collect();
        let pipeline = NormalizationPipeline::new(terms, Box::new(PassthroughCorrector), s2t());

        assert_eq!(pipeline.normalize("AI and ML").await.unwrap(), "人工智慧 and ML");
        let chained = pipeline.normalize("AI漢字").await.unwrap();
        assert!(chained.contains("人工智慧") && chained.contains("漢字"));
    }

    #[tokio::test]
    async fn test_corrector_sees_replaced_terms() {
        let terms: TermMap = [("AI", "人工智慧")].into_iter().collect();
        let mut corrector = MockSpellingCorrector::new();
        corrector
            .expect_correct()
            .with(eq("人工智慧 teh 汉字"))
            .times(1)
            .returning(|_| Ok("人工智慧 the 汉字".to_string()));

        let pipeline = NormalizationPipeline::new(terms, Box::new(corrector), s2t());
        assert_eq!(pipeline.normalize("AI teh 汉字").await.unwrap(), "人工智慧 the 漢字");
    }

    #[tokio::test]
    async fn test_conversion_runs_on_corrected_text() {
        // The corrector swaps in a simplified character that must still be converted.
        let mut corrector = MockSpellingCorrector::new();
        corrector
            .expect_correct()
            .returning(|text| Ok(text.replace("X", "语")));

        let pipeline = NormalizationPipeline::new(TermMap::new(), Box::new(corrector), s2t());
        assert_eq!(pipeline.normalize("汉X").await.unwrap(), "漢語");
    }

    #[tokio::test]
    async fn test_corrector_failure_propagates() {
        let mut corrector = MockSpellingCorrector::new();
        corrector
            .expect_correct()
            .returning(|_| Err(CaptionError::Correction("service down".to_string())));

        let pipeline = NormalizationPipeline::new(TermMap::new(), Box::new(corrector), s2t());
        assert!(matches!(
            pipeline.normalize("汉字").await,
            Err(CaptionError::Correction(_))
        ));
    }
}
