use assert_fs::prelude::*;
use assert_fs::TempDir;
use async_trait::async_trait;

use caption_polish::config::RunConfig;
use caption_polish::convert::{ConversionDirection, OpenCcConverter};
use caption_polish::correct::{PassthroughCorrector, SpellingCorrector};
use caption_polish::detect::TextFormat;
use caption_polish::error::{CaptionError, Result};
use caption_polish::terms::TermMap;
use caption_polish::workflow::Workflow;

const SRT: &str = "1\n00:00:01,000 --> 00:00:02,000\n汉字\n\n2\n00:00:03,000 --> 00:00:04,250\nAI 说明\n\n";

/// Fixes one known typo and refuses text containing "FAIL"
struct TypoCorrector;

#[async_trait]
impl SpellingCorrector for TypoCorrector {
    async fn correct(&self, text: &str) -> Result<String> {
        if text.contains("FAIL") {
            return Err(CaptionError::Correction("refused".to_string()));
        }
        Ok(text.replace("teh", "the"))
    }

    fn name(&self) -> &str {
        "typo"
    }
}

fn workflow_with(terms: TermMap, corrector: Box<dyn SpellingCorrector>) -> Workflow {
    let run = RunConfig::default().with_terms(terms).with_progress(false);
    Workflow::new(
        run,
        corrector,
        Box::new(OpenCcConverter::new(ConversionDirection::S2t).unwrap()),
    )
}

#[tokio::test]
async fn batch_without_output_overwrites_in_place() {
    let temp = TempDir::new().unwrap();
    let srt = temp.child("episode.srt");
    let txt = temp.child("notes.txt");
    srt.write_str(SRT).unwrap();
    txt.write_str("AI and ML\n汉字\n").unwrap();

    let terms: TermMap = [("AI", "人工智慧")].into_iter().collect();
    let report = workflow_with(terms, Box::new(PassthroughCorrector))
        .process_batch(temp.path(), None)
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(report.processed.len(), 2);
    assert_eq!(
        std::fs::read_to_string(srt.path()).unwrap(),
        "1\n00:00:01,000 --> 00:00:02,000\n漢字\n\n2\n00:00:03,000 --> 00:00:04,250\n人工智慧 說明\n\n"
    );
    assert_eq!(std::fs::read_to_string(txt.path()).unwrap(), "人工智慧 and ML\n漢字\n");
}

#[tokio::test]
async fn batch_dispatches_by_content_not_extension() {
    let temp = TempDir::new().unwrap();
    let out = temp.child("out");
    temp.child("cues.txt").write_str(SRT).unwrap();
    temp.child("prose.srt").write_str("teh 汉字\nline two\n").unwrap();

    let report = workflow_with(TermMap::new(), Box::new(TypoCorrector))
        .process_batch(temp.path(), Some(out.path()))
        .await
        .unwrap();

    let formats: Vec<(String, TextFormat)> = report
        .processed
        .iter()
        .map(|(path, format)| (path.file_name().unwrap().to_string_lossy().to_string(), *format))
        .collect();
    assert_eq!(
        formats,
        vec![
            ("cues.txt".to_string(), TextFormat::TimedCue),
            ("prose.srt".to_string(), TextFormat::PlainText),
        ]
    );
    assert_eq!(
        std::fs::read_to_string(out.child("prose.srt").path()).unwrap(),
        "the 漢字\nline two\n"
    );
    assert!(std::fs::read_to_string(out.child("cues.txt").path())
        .unwrap()
        .starts_with("1\n00:00:01,000 --> 00:00:02,000\n漢字\n"));
}

#[tokio::test]
async fn failing_file_is_untouched_and_batch_continues() {
    let temp = TempDir::new().unwrap();
    let bad = temp.child("bad.srt");
    let good = temp.child("good.srt");
    let bad_content = "1\n00:00:01,000 --> 00:00:02,000\n汉字\n\n2\n00:00:03,000 --> 00:00:04,000\nFAIL here\n\n";
    bad.write_str(bad_content).unwrap();
    good.write_str(SRT).unwrap();
    temp.child("ignored.vtt").write_str("WEBVTT\n").unwrap();

    let report = workflow_with(TermMap::new(), Box::new(TypoCorrector))
        .process_batch(temp.path(), None)
        .await
        .unwrap();

    assert_eq!(report.failed.len(), 1);
    assert!(report.failed[0].0.ends_with("bad.srt"));
    assert!(report.failed[0].1.contains("refused"));
    assert_eq!(report.processed.len(), 1);
    assert_eq!(std::fs::read_to_string(bad.path()).unwrap(), bad_content);
    assert!(std::fs::read_to_string(good.path()).unwrap().contains("漢字"));
    assert_eq!(std::fs::read_to_string(temp.child("ignored.vtt").path()).unwrap(), "WEBVTT\n");
}

#[tokio::test]
async fn yaml_terms_apply_end_to_end() {
    let temp = TempDir::new().unwrap();
    let terms_file = temp.child("terms.yaml");
    terms_file.write_str("AI: 人工智慧\n人工智慧 and ML: 人工智慧與機器學習\n").unwrap();
    let input = temp.child("talk.txt");
    let output = temp.child("talk.fixed.txt");
    input.write_str("AI and ML\r\nteh end\r\n").unwrap();

    // The second key matches text produced by the first replacement
    let terms = TermMap::load(terms_file.path()).unwrap();
    let format = workflow_with(terms, Box::new(TypoCorrector))
        .process_file(input.path(), output.path())
        .await
        .unwrap();

    assert_eq!(format, TextFormat::PlainText);
    assert_eq!(
        std::fs::read_to_string(output.path()).unwrap(),
        "人工智慧與機器學習\nthe end\n"
    );
}
