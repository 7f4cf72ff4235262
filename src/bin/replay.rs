use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use qcount::replay::{ReplayAssociator, ReplayDetector, ReplaySource};
use qcount::{Config, SessionController};

#[derive(Parser, Debug)]
#[command(name = "qcount-replay", about = "Count confirmed people in a recorded detection dump")]
struct Args {
    /// Dump with one `index:json` frame per line
    dump: PathBuf,
    /// Lab the count is reported for
    #[arg(long)]
    lab: Option<String>,
    /// JSON config file, missing keys keep their defaults
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Print the final status as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::default(),
    };

    let controller = SessionController::new(config)?;
    let handle = controller.start(
        args.lab.as_deref(),
        ReplaySource::new(args.dump.clone()),
        ReplayDetector,
        ReplayAssociator::default(),
    )?;

    let label = handle.label().to_string();
    let summary = handle
        .join()
        .with_context(|| format!("replaying {}", args.dump.display()))?;
    let status = controller.status();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!(
            "{label}: {} confirmed ({} of {} frames processed)",
            status.count(&label),
            summary.frames_processed,
            summary.frames_read
        );
    }

    Ok(())
}
