use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::{CaptionError, Result};
use crate::pipeline::NormalizationPipeline;
use crate::subtitle::SubtitleFile;

/// Normalize every cue's text in a timed-cue file.
///
/// Index, timing and cue order are left untouched. The output is written
/// only after every cue succeeded. Returns the number of cues processed.
pub async fn process_cue_file<P: AsRef<Path>, Q: AsRef<Path>>(
    input_path: P,
    output_path: Q,
    pipeline: &NormalizationPipeline,
    show_progress: bool,
) -> Result<usize> {
    let input_path = input_path.as_ref();
    let output_path = output_path.as_ref();

    let content = read_text(input_path).await?;
    let mut subtitles = SubtitleFile::parse(&content)?;
    debug!("Parsed {} cues from {}", subtitles.cues.len(), input_path.display());

    let pb = progress_bar(subtitles.cues.len(), input_path, show_progress);
    for cue in subtitles.cues.iter_mut() {
        cue.text = pipeline.normalize(&cue.text).await?;
        pb.inc(1);
    }
    pb.finish_and_clear();

    write_atomically(output_path, subtitles.serialize().as_bytes())?;

    info!("Processed {} -> {}", input_path.display(), output_path.display());
    Ok(subtitles.cues.len())
}

/// Normalize a plain text file line by line.
///
/// Line terminators (`\n` or `\r\n`) are stripped before normalization and
/// every output line ends with `\n`. Returns the number of lines processed.
pub async fn process_text_file<P: AsRef<Path>, Q: AsRef<Path>>(
    input_path: P,
    output_path: Q,
    pipeline: &NormalizationPipeline,
    show_progress: bool,
) -> Result<usize> {
    let input_path = input_path.as_ref();
    let output_path = output_path.as_ref();

    let content = read_text(input_path).await?;
    let lines: Vec<&str> = content.lines().collect();

    let pb = progress_bar(lines.len(), input_path, show_progress);
    let mut output = String::with_capacity(content.len());
    for line in &lines {
        output.push_str(&pipeline.normalize(line).await?);
        output.push('\n');
        pb.inc(1);
    }
    pb.finish_and_clear();

    write_atomically(output_path, output.as_bytes())?;

    info!("Processed {} -> {}", input_path.display(), output_path.display());
    Ok(lines.len())
}

/// Read a whole file as UTF-8.
async fn read_text(path: &Path) -> Result<String> {
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => CaptionError::FileNotFound(path.display().to_string()),
        _ => CaptionError::Io(e),
    })?;

    String::from_utf8(bytes).map_err(|e| {
        CaptionError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("{} is not valid UTF-8: {}", path.display(), e),
        ))
    })
}

/// Replace `path` with `contents` in one step.
///
/// The data goes to a temporary file next to the target which is then
/// renamed over it, so the target is never left half-written. An existing
/// target keeps its permissions.
pub fn write_atomically(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(contents)?;
    temp.flush()?;

    if let Ok(metadata) = std::fs::metadata(path) {
        temp.as_file().set_permissions(metadata.permissions())?;
    }

    temp.persist(path).map_err(|e| CaptionError::Io(e.error))?;
    Ok(())
}

fn progress_bar(len: usize, path: &Path, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} {msg} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb.set_message(
        path.file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default(),
    );
    pb
}
