//! caption-polish - terminology, spelling and script normalization for
//! subtitles and transcripts
//!
//! Single-file mode rewrites one file into `--output`; batch mode walks a
//! directory and writes into `--output` or back over each source.

use anyhow::Result;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use tracing::{info, warn, Level};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use caption_polish::cli::{Args, RunMode};
use caption_polish::config::{parse_log_level, Config, RunConfig};
use caption_polish::convert::OpenCcConverter;
use caption_polish::correct::CorrectorFactory;
use caption_polish::terms::TermMap;
use caption_polish::workflow::Workflow;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let Some(mode) = args.run_mode() else {
        Args::command()
            .error(
                ErrorKind::MissingRequiredArgument,
                "Provide --input and --output, or --batch-dir",
            )
            .exit();
    };

    let mut config = Config::discover(args.config.as_deref())?;
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    if let Some(kind) = &args.corrector {
        config.corrector.kind = kind.parse()?;
    }

    let mut run = RunConfig::new(parse_log_level(&config.logging.level), config.batch.clone())
        .with_progress(!args.no_progress);
    if let Some(jobs) = args.jobs {
        run = run.with_jobs(jobs);
    }
    setup_logging(run.log_level, config.logging.file_dir.as_deref())?;

    if let Some(path) = &args.special_terms_config {
        run = run.with_terms(TermMap::load(path)?);
    }

    let corrector = CorrectorFactory::create_corrector(&config.corrector)?;
    corrector.check_availability().await?;
    info!("Spelling corrector: {}", corrector.name());

    let converter = OpenCcConverter::new(config.converter.direction)?;
    info!("Script conversion: {}", config.converter.direction);

    let workflow = Workflow::new(run, corrector, Box::new(converter));

    match mode {
        RunMode::Single { input, output } => {
            workflow.process_file(&input, &output).await?;
        }
        RunMode::Batch { dir, output_dir } => {
            let report = workflow.process_batch(&dir, output_dir.as_deref()).await?;
            if !report.is_success() {
                for (path, error) in &report.failed {
                    warn!("{}: {}", path.display(), error);
                }
                anyhow::bail!("{} of {} files failed", report.failed.len(),
                    report.failed.len() + report.processed.len());
            }
        }
    }

    info!("caption-polish completed successfully");
    Ok(())
}

/// Setup console logging, plus a daily log file when a directory is configured
fn setup_logging(level: Level, file_dir: Option<&std::path::Path>) -> Result<()> {
    let console_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let file_layer = match file_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let file_appender = rolling::daily(dir, "caption-polish.log");
            let (non_blocking_file, guard) = non_blocking(file_appender);
            // Keep the guard alive for the duration of the program
            std::mem::forget(guard);

            Some(
                fmt::layer()
                    .with_writer(non_blocking_file)
                    .with_target(false)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_ansi(false),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    match file_dir {
        Some(dir) => info!("Logging initialized - console: {}, file: {}", level,
            dir.join("caption-polish.log").display()),
        None => info!("Logging initialized - console: {}", level),
    }

    Ok(())
}
