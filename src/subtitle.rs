use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use tracing::warn;

use crate::error::{CaptionError, Result};

static TIMING_LINE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{2,}):(\d{2}):(\d{2}),(\d{3}) --> (\d{2,}):(\d{2}):(\d{2}),(\d{3})(.*)$")
        .expect("timing line pattern is valid")
});

/// Position in a subtitle track, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// `None` when the total does not fit in a `u64` of milliseconds
    pub fn from_parts(hours: u64, minutes: u64, seconds: u64, millis: u64) -> Option<Self> {
        hours
            .checked_mul(3_600_000)?
            .checked_add(minutes * 60_000 + seconds * 1_000 + millis)
            .map(Self)
    }
}

/// Format as SRT time (HH:MM:SS,mmm)
impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total_milliseconds = self.0;
        let hours = total_milliseconds / 3_600_000;
        let minutes = (total_milliseconds % 3_600_000) / 60_000;
        let secs = (total_milliseconds % 60_000) / 1_000;
        let millis = total_milliseconds % 1_000;

        write!(f, "{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
    }
}

/// One timed subtitle entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    pub index: u64,
    pub start: Timestamp,
    pub end: Timestamp,
    /// Anything after the end time on the timing line (e.g. `X1:40 X2:600`)
    pub position: String,
    /// Text lines joined with `\n`
    pub text: String,
}

impl Cue {
    pub fn new<S: Into<String>>(index: u64, start: Timestamp, end: Timestamp, text: S) -> Self {
        Self {
            index,
            start,
            end,
            position: String::new(),
            text: text.into(),
        }
    }
}

/// A parsed timed-cue file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleFile {
    pub cues: Vec<Cue>,
    /// Line ending used when writing the file back
    pub line_ending: &'static str,
}

impl SubtitleFile {
    pub fn new(cues: Vec<Cue>) -> Self {
        Self {
            cues,
            line_ending: "\n",
        }
    }

    /// Parse SRT content into cues.
    ///
    /// Blocks are separated by blank lines. Each block is an index line, a
    /// timing line and zero or more text lines. Index and timing errors are
    /// reported with the 1-based line number.
    ///
    /// Hours need at least two digits. Timestamps are written back zero
    /// padded and surrounding whitespace on the timing line is not kept.
    pub fn parse(content: &str) -> Result<Self> {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        let line_ending = if content.contains("\r\n") { "\r\n" } else { "\n" };

        let mut cues: Vec<Cue> = Vec::new();
        let mut block: Vec<(usize, &str)> = Vec::new();

        for (number, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                if !block.is_empty() {
                    cues.push(parse_block(&block)?);
                    block.clear();
                }
                continue;
            }
            block.push((number + 1, line));
        }
        if !block.is_empty() {
            cues.push(parse_block(&block)?);
        }

        check_sequence(&cues);

        Ok(Self { cues, line_ending })
    }

    /// Serialize back to SRT, one blank line after every cue.
    pub fn serialize(&self) -> String {
        let eol = self.line_ending;
        let mut out = String::new();

        for cue in &self.cues {
            out.push_str(&cue.index.to_string());
            out.push_str(eol);
            out.push_str(&format!("{} --> {}{}", cue.start, cue.end, cue.position));
            out.push_str(eol);
            // A blank line inside the text would end the cue early
            for line in cue.text.lines().filter(|line| !line.trim().is_empty()) {
                out.push_str(line);
                out.push_str(eol);
            }
            out.push_str(eol);
        }

        out
    }
}

fn parse_block(block: &[(usize, &str)]) -> Result<Cue> {
    let (index_line_no, index_line) = block[0];
    let index: u64 = index_line.trim().parse().map_err(|_| {
        CaptionError::parse(index_line_no, format!("expected cue index, found '{}'", index_line.trim()))
    })?;
    if index == 0 {
        return Err(CaptionError::parse(index_line_no, "cue index must be positive"));
    }

    let Some(&(timing_line_no, timing_line)) = block.get(1) else {
        return Err(CaptionError::parse(index_line_no, format!("cue {} has no timing line", index)));
    };
    let (start, end, position) = parse_timing_line(timing_line_no, timing_line)?;

    let text = block[2..]
        .iter()
        .map(|(_, line)| *line)
        .collect::<Vec<_>>()
        .join("\n");

    Ok(Cue {
        index,
        start,
        end,
        position,
        text,
    })
}

fn parse_timing_line(line_no: usize, line: &str) -> Result<(Timestamp, Timestamp, String)> {
    let caps = TIMING_LINE_REGEX.captures(line.trim_start()).ok_or_else(|| {
        CaptionError::parse(line_no, format!("malformed timing line '{}'", line.trim()))
    })?;

    let field = |i: usize| -> Result<u64> {
        caps[i]
            .parse::<u64>()
            .map_err(|_| CaptionError::parse(line_no, format!("timestamp field '{}' out of range", &caps[i])))
    };

    let (h1, m1, s1, ms1) = (field(1)?, field(2)?, field(3)?, field(4)?);
    let (h2, m2, s2, ms2) = (field(5)?, field(6)?, field(7)?, field(8)?);
    if m1 >= 60 || s1 >= 60 || m2 >= 60 || s2 >= 60 {
        return Err(CaptionError::parse(line_no, "minutes and seconds must be below 60"));
    }

    let too_large = || CaptionError::parse(line_no, "timestamp is too large");
    let start = Timestamp::from_parts(h1, m1, s1, ms1).ok_or_else(too_large)?;
    let end = Timestamp::from_parts(h2, m2, s2, ms2).ok_or_else(too_large)?;
    if end < start {
        return Err(CaptionError::parse(
            line_no,
            format!("cue ends ({}) before it starts ({})", end, start),
        ));
    }

    Ok((start, end, caps[9].trim_end().to_string()))
}

fn check_sequence(cues: &[Cue]) {
    for pair in cues.windows(2) {
        if pair[1].index <= pair[0].index {
            warn!(
                "Cue index {} follows {}; keeping the original numbering",
                pair[1].index, pair[0].index
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "1\n00:00:01,000 --> 00:00:02,000\n汉字\n\n2\n00:00:02,500 --> 00:01:05,123\nfirst line\nsecond line\n\n";

    #[test]
    fn test_format_srt_time() {
        assert_eq!(Timestamp(0).to_string(), "00:00:00,000");
        assert_eq!(Timestamp(65_123).to_string(), "00:01:05,123");
        assert_eq!(Timestamp(3_661_500).to_string(), "01:01:01,500");
        assert_eq!(Timestamp::from_parts(123, 4, 5, 6).unwrap().to_string(), "123:04:05,006");
        assert_eq!(Timestamp::from_parts(u64::MAX / 1_000, 0, 0, 0), None);
    }

    #[test]
    fn test_parse_cues() {
        let file = SubtitleFile::parse(SAMPLE).unwrap();
        assert_eq!(file.cues.len(), 2);
        assert_eq!(file.cues[0], Cue::new(1, Timestamp(1_000), Timestamp(2_000), "汉字"));
        assert_eq!(file.cues[1].start, Timestamp(2_500));
        assert_eq!(file.cues[1].end, Timestamp(65_123));
        assert_eq!(file.cues[1].text, "first line\nsecond line");
    }

    #[test]
    fn test_serialize_is_lossless() {
        let file = SubtitleFile::parse(SAMPLE).unwrap();
        assert_eq!(file.serialize(), SAMPLE);
    }

    #[test]
    fn test_reparse_keeps_index_and_timing() {
        let input = "3\n00:00:01,000 --> 00:00:01,000 X1:40 X2:600 Y1:20 Y2:50\n\n\n7\n10:00:00,000 --> 10:00:01,999\n<i>text</i>\n";
        let first = SubtitleFile::parse(input).unwrap();
        let second = SubtitleFile::parse(&first.serialize()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.cues[0].text, "");
        assert_eq!(first.cues[0].position, " X1:40 X2:600 Y1:20 Y2:50");
        assert_eq!(first.cues[1].index, 7);
    }

    #[test]
    fn test_blank_lines_in_text_do_not_split_cue() {
        let mut file = SubtitleFile::parse(SAMPLE).unwrap();
        file.cues[0].text = "top\n\nbottom\n".to_string();
        let reparsed = SubtitleFile::parse(&file.serialize()).unwrap();
        assert_eq!(reparsed.cues.len(), 2);
        assert_eq!(reparsed.cues[0].text, "top\nbottom");
    }

    #[test]
    fn test_crlf_and_bom() {
        let input = "\u{feff}1\r\n00:00:01,000 --> 00:00:02,000\r\nHello\r\n\r\n";
        let file = SubtitleFile::parse(input).unwrap();
        assert_eq!(file.line_ending, "\r\n");
        assert_eq!(file.cues[0].text, "Hello");
        assert_eq!(file.serialize(), "1\r\n00:00:01,000 --> 00:00:02,000\r\nHello\r\n\r\n");
    }

    #[test]
    fn test_missing_trailing_blank_line() {
        let file = SubtitleFile::parse("1\n00:00:01,000 --> 00:00:02,000\nlast").unwrap();
        assert_eq!(file.cues.len(), 1);
        assert_eq!(file.cues[0].text, "last");
    }

    #[test]
    fn test_empty_content() {
        let file = SubtitleFile::parse("").unwrap();
        assert!(file.cues.is_empty());
        assert_eq!(file.serialize(), "");
    }

    #[test]
    fn test_malformed_timing_reports_line() {
        let err = SubtitleFile::parse("1\n00:00:01,000 --> 00:00:02,000\nok\n\n2\n00:00:03 --> 00:00:04\nbad\n")
            .unwrap_err();
        match err {
            CaptionError::Parse { line, .. } => assert_eq!(line, 6),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_non_numeric_index() {
        let err = SubtitleFile::parse("one\n00:00:01,000 --> 00:00:02,000\ntext\n").unwrap_err();
        assert!(matches!(err, CaptionError::Parse { line: 1, .. }));
    }

    #[test]
    fn test_missing_timing_line() {
        let err = SubtitleFile::parse("1\n\n").unwrap_err();
        assert!(matches!(err, CaptionError::Parse { line: 1, .. }));
    }

    #[test]
    fn test_out_of_range_components() {
        assert!(SubtitleFile::parse("1\n00:61:00,000 --> 00:62:00,000\nx\n").is_err());
        assert!(SubtitleFile::parse("0\n00:00:01,000 --> 00:00:02,000\nx\n").is_err());
    }

    #[test]
    fn test_huge_hours_are_parse_error() {
        let input = "1\n9999999999999999:00:00,000 --> 9999999999999999:00:01,000\nx\n";
        let err = SubtitleFile::parse(input).unwrap_err();
        assert!(matches!(err, CaptionError::Parse { line: 2, .. }));

        let digits = "9".repeat(25);
        let input = format!("1\n{d}:00:00,000 --> {d}:00:01,000\nx\n", d = digits);
        assert!(matches!(SubtitleFile::parse(&input), Err(CaptionError::Parse { line: 2, .. })));
    }

    #[test]
    fn test_single_digit_hours_rejected() {
        let err = SubtitleFile::parse("1\n0:00:01,000 --> 0:00:02,000\nx\n").unwrap_err();
        assert!(matches!(err, CaptionError::Parse { line: 2, .. }));
    }

    #[test]
    fn test_end_before_start() {
        let err = SubtitleFile::parse("1\n00:00:05,000 --> 00:00:02,000\nx\n").unwrap_err();
        assert!(matches!(err, CaptionError::Parse { line: 2, .. }));
    }

    #[test]
    fn test_out_of_order_indices_are_kept() {
        let input = "2\n00:00:01,000 --> 00:00:02,000\nb\n\n1\n00:00:03,000 --> 00:00:04,000\na\n";
        let file = SubtitleFile::parse(input).unwrap();
        let indices: Vec<u64> = file.cues.iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![2, 1]);
    }
}
