use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::RunConfig;
use crate::convert::ScriptConverter;
use crate::correct::SpellingCorrector;
use crate::detect::{detect_format, read_detection_sample, TextFormat};
use crate::error::{CaptionError, Result};
use crate::pipeline::NormalizationPipeline;
use crate::processor::{process_cue_file, process_text_file};

/// Outcome of one batch run
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Files written, with the format they were processed as
    pub processed: Vec<(PathBuf, TextFormat)>,
    /// Files that failed, with the error message
    pub failed: Vec<(PathBuf, String)>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct Workflow {
    run: RunConfig,
    pipeline: NormalizationPipeline,
}

impl Workflow {
    /// The pipeline applies the run's own term map.
    pub fn new(
        run: RunConfig,
        corrector: Box<dyn SpellingCorrector>,
        converter: Box<dyn ScriptConverter>,
    ) -> Self {
        let pipeline = NormalizationPipeline::new(run.terms.clone(), corrector, converter);
        Self { run, pipeline }
    }

    /// Classify a file by its head and run the matching processor.
    pub async fn process_file<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input_path: P,
        output_path: Q,
    ) -> Result<TextFormat> {
        let input_path = input_path.as_ref();
        let output_path = output_path.as_ref();

        if !input_path.is_file() {
            return Err(CaptionError::FileNotFound(input_path.display().to_string()));
        }

        let sample = read_detection_sample(input_path, self.run.sample_chars).await?;
        let format = detect_format(&sample);
        info!("Processing {} as {}", input_path.display(), format);

        match format {
            TextFormat::TimedCue => {
                process_cue_file(input_path, output_path, &self.pipeline, self.run.show_progress).await?;
            }
            TextFormat::PlainText => {
                process_text_file(input_path, output_path, &self.pipeline, self.run.show_progress).await?;
            }
        }

        Ok(format)
    }

    /// Files directly under `input_dir` with a subtitle or transcript extension
    pub fn collect_batch_files<P: AsRef<Path>>(&self, input_dir: P) -> Vec<PathBuf> {
        let input_dir = input_dir.as_ref();
        WalkDir::new(input_dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Skipping unreadable entry in {}: {}", input_dir.display(), e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| self.run.batch.matches(entry.path()))
            .map(|entry| entry.into_path())
            .collect()
    }

    /// Process every matching file in a directory.
    ///
    /// Without `output_dir` each file is overwritten in place. A failing file
    /// is logged and recorded; the remaining files are still processed.
    pub async fn process_batch<P: AsRef<Path>>(
        &self,
        input_dir: P,
        output_dir: Option<&Path>,
    ) -> Result<BatchReport> {
        let input_dir = input_dir.as_ref();
        info!("Processing directory: {}", input_dir.display());

        if !input_dir.is_dir() {
            return Err(CaptionError::Config(format!(
                "Batch input {} is not a directory",
                input_dir.display()
            )));
        }

        match output_dir {
            Some(dir) => fs::create_dir_all(dir).await?,
            None => warn!(
                "No output directory given; files in {} will be overwritten in place",
                input_dir.display()
            ),
        }

        let files = self.collect_batch_files(input_dir);
        info!("Found {} files to process", files.len());

        let mut outcomes: Vec<(PathBuf, Result<TextFormat>)> = stream::iter(files)
            .map(|path| async move {
                let destination = destination_for(&path, output_dir);
                debug!("{} -> {}", path.display(), destination.display());
                let outcome = self.process_file(&path, &destination).await;
                (path, outcome)
            })
            .buffer_unordered(self.run.jobs)
            .collect()
            .await;
        outcomes.sort_by(|a, b| a.0.cmp(&b.0));

        let mut report = BatchReport::default();
        for (path, outcome) in outcomes {
            match outcome {
                Ok(format) => {
                    info!("Successfully processed: {}", path.display());
                    report.processed.push((path, format));
                }
                Err(e) => {
                    warn!("Failed to process {}: {}", path.display(), e);
                    report.failed.push((path, e.to_string()));
                }
            }
        }

        info!(
            "Batch finished: {} processed, {} failed",
            report.processed.len(),
            report.failed.len()
        );
        Ok(report)
    }
}

/// Output directory joined with the file name, or the source itself
pub fn destination_for(input_path: &Path, output_dir: Option<&Path>) -> PathBuf {
    match (output_dir, input_path.file_name()) {
        (Some(dir), Some(name)) => dir.join(name),
        _ => input_path.to_path_buf(),
    }
}
