use anyhow::{bail, Context, Result};
use bytemap::config::DEFAULT_LOG_FILE;
use bytemap::worker::{self, Event, Job};
use bytemap::{DiagnosticLog, Settings, Summary};
use clap::{Parser, Subcommand};
use log::info;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(version, about = "Convert files to lossless PNG images and back", long_about = None)]
struct Cli {
    /// File that failures are appended to
    #[arg(long, global = true, default_value = DEFAULT_LOG_FILE)]
    log_file: PathBuf,

    /// Print the result as JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a file into a .bytemap.png image
    Encode {
        /// The file to convert
        #[arg(short, long)]
        input: PathBuf,

        /// Directory the image is saved in
        #[arg(short, long)]
        output_dir: PathBuf,
    },
    /// Convert a .bytemap.png image back into a file
    Decode {
        /// The image to convert
        #[arg(short, long)]
        input: PathBuf,

        /// Directory the recovered file is saved in
        #[arg(short, long)]
        output_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logger
    env_logger::init();

    let cli = Cli::parse();
    let settings = Arc::new(Settings {
        log_file: cli.log_file.clone(),
        ..Settings::default()
    });
    let log = Arc::new(
        DiagnosticLog::open(&settings.log_file)
            .with_context(|| format!("cannot open log file '{}'", settings.log_file.display()))?,
    );
    info!("Appending failures to '{}'", log.path().display());

    let job = match cli.command {
        Commands::Encode { input, output_dir } => Job::Encode { input, output_dir },
        Commands::Decode { input, output_dir } => Job::Decode { input, output_dir },
    };

    let result = run(job, settings, Arc::clone(&log), cli.json).await;
    log.flush()?;
    result
}

async fn run(job: Job, settings: Arc<Settings>, log: Arc<DiagnosticLog>, json: bool) -> Result<()> {
    let (input, output_dir) = match &job {
        Job::Encode { input, output_dir } | Job::Decode { input, output_dir } => {
            (input.clone(), output_dir.clone())
        }
    };
    if let Err(e) = check_paths(&input, &output_dir) {
        log.record(job.name(), &e.to_string());
        return Err(e);
    }

    let mut conversion = worker::spawn(job, settings, Some(log));
    while let Some(event) = conversion.next_event().await {
        match event {
            Event::Finished(summary) => print_summary(&summary, json)?,
            other => {
                if let Some(line) = status_line(&other, json) {
                    eprintln!("{}", line);
                }
            }
        }
    }

    // A failed job surfaces here and is printed once by `main`.
    conversion.finish().await?;
    Ok(())
}

/// Progress line for stderr. `Failed` has none: the same error comes back
/// from `Conversion::finish`.
fn status_line(event: &Event, json: bool) -> Option<String> {
    match event {
        Event::Progress(checkpoint) if !json => {
            Some(format!("[{:>3}%] {:?}", checkpoint.percent(), checkpoint))
        }
        _ => None,
    }
}

fn check_paths(input: &Path, output_dir: &Path) -> Result<()> {
    if !input.is_file() {
        bail!("Please select a file and output location: '{}' is not a file", input.display());
    }
    if !output_dir.is_dir() {
        bail!(
            "Please select a file and output location: '{}' is not a directory",
            output_dir.display()
        );
    }
    Ok(())
}

fn print_summary(summary: &Summary, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
    } else {
        println!("{}", summary);
    }
    Ok(())
}
