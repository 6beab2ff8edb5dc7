use clap::Parser;
use std::path::PathBuf;

/// Fix terminology, spelling and Han script in subtitles and transcripts
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Input subtitle or text file (single-file mode)
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Output file in single-file mode, output directory in batch mode
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Directory whose .srt/.txt files are processed (batch mode)
    #[arg(long)]
    pub batch_dir: Option<PathBuf>,

    /// JSON or YAML mapping of terms to force before correction
    #[arg(long)]
    pub special_terms_config: Option<PathBuf>,

    /// Log level (trace, debug, info, warning, error)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Spelling corrector to use (ollama, command, passthrough)
    #[arg(long)]
    pub corrector: Option<String>,

    /// Number of files processed at the same time in batch mode
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Hide per-file progress bars
    #[arg(long)]
    pub no_progress: bool,
}

/// What the command line asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    Single { input: PathBuf, output: PathBuf },
    Batch { dir: PathBuf, output_dir: Option<PathBuf> },
}

impl Args {
    /// Batch mode wins when `--batch-dir` is given; otherwise both
    /// `--input` and `--output` are required.
    pub fn run_mode(&self) -> Option<RunMode> {
        if let Some(dir) = &self.batch_dir {
            return Some(RunMode::Batch {
                dir: dir.clone(),
                output_dir: self.output.clone(),
            });
        }
        match (&self.input, &self.output) {
            (Some(input), Some(output)) => Some(RunMode::Single {
                input: input.clone(),
                output: output.clone(),
            }),
            _ => None,
        }
    }
}
