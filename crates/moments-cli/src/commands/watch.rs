use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::time::Duration;

use chrono::Local;
use clap::Args;
use log::debug;
use moments_core::{
    distance_m, run_pass, Config, ConsoleNotifier, Database, JsonlFeed, LocationFeed,
};

/// Foreground watch loop: consume a JSONL location feed and evaluate after
/// every fix. Fixes also land in the durable fix log, so a later `check`
/// pass can run without explicit coordinates.
#[derive(Args)]
pub struct WatchArgs {
    /// Read fixes from this JSONL file instead of stdin
    #[arg(long)]
    pub input: Option<PathBuf>,
    /// Pace replayed fixes at the configured feed interval
    #[arg(long)]
    pub paced: bool,
}

pub fn run(args: WatchArgs) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let config = Config::load_or_default();
    let notifier = ConsoleNotifier::new(config.notifications.clone());

    let reader: Box<dyn BufRead> = match &args.input {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(BufReader::new(io::stdin())),
    };
    let mut feed = JsonlFeed::new(reader);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;

    runtime.block_on(async {
        let interval = Duration::from_secs(config.location.min_interval_secs);
        let mut last_evaluated = None;

        while let Some(fix) = feed.next_fix()? {
            db.record_fix(&fix)?;

            // Honor the feed's minimum-distance hint: tiny moves are noise.
            if let Some(prev) = last_evaluated {
                if distance_m(prev, fix.coordinates()) < config.location.min_distance_m {
                    debug!("skipping fix within min_distance_m of the last evaluation");
                    continue;
                }
            }
            last_evaluated = Some(fix.coordinates());

            let events = run_pass(&db, &config, &notifier, &fix, Local::now().time())?;
            for event in &events {
                println!("{}", serde_json::to_string_pretty(event)?);
            }

            if args.paced {
                tokio::time::sleep(interval).await;
            }
        }

        Ok::<(), Box<dyn std::error::Error>>(())
    })?;

    Ok(())
}
