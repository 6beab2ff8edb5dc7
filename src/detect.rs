use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

use crate::error::Result;

/// Number of leading characters inspected when classifying a file.
pub const DETECTION_SAMPLE_CHARS: usize = 2000;

static CUE_TIMING_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[0-9]{2}:[0-9]{2}:[0-9]{2},[0-9]{3} --> [0-9]{2}:[0-9]{2}:[0-9]{2},[0-9]{3}")
        .expect("cue timing pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextFormat {
    /// Subtitle-style file made of timed cues (SRT)
    TimedCue,
    /// Anything else, processed line by line
    PlainText,
}

impl std::fmt::Display for TextFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TimedCue => write!(f, "timed-cue"),
            Self::PlainText => write!(f, "plain-text"),
        }
    }
}

/// Classify a text sample by looking for an SRT timing range anywhere in it.
pub fn detect_format(sample: &str) -> TextFormat {
    if CUE_TIMING_REGEX.is_match(sample) {
        TextFormat::TimedCue
    } else {
        TextFormat::PlainText
    }
}

/// Read at most `max_chars` characters from the head of a file.
///
/// Only the first `max_chars * 4` bytes are read, which always covers
/// `max_chars` UTF-8 characters. Invalid sequences are replaced rather than
/// rejected; decoding errors surface later when the file is processed.
pub async fn read_detection_sample<P: AsRef<Path>>(path: P, max_chars: usize) -> Result<String> {
    let file = File::open(path.as_ref()).await?;
    let mut head = Vec::with_capacity(max_chars * 4);
    file.take((max_chars * 4) as u64).read_to_end(&mut head).await?;

    Ok(String::from_utf8_lossy(&head).chars().take(max_chars).collect())
}
