use chrono::{Local, NaiveTime};
use clap::Args;
use log::debug;
use moments_core::{run_pass, snapshot, Config, ConsoleNotifier, Database, LocationFix};

/// One evaluation pass. This is the background-task entry point: wire it to
/// a cron/systemd timer and it shares all state (alarms, fired set) with the
/// foreground watch loop through the database.
#[derive(Args)]
pub struct CheckArgs {
    /// Position latitude; defaults to the last ingested fix
    #[arg(long, allow_hyphen_values = true, requires = "longitude")]
    pub latitude: Option<f64>,
    /// Position longitude
    #[arg(long, allow_hyphen_values = true, requires = "latitude")]
    pub longitude: Option<f64>,
    /// Evaluate as if the time of day were HH:MM (default: now)
    #[arg(long)]
    pub at: Option<String>,
    /// Print a state snapshot after the pass
    #[arg(long)]
    pub snapshot: bool,
}

pub fn run(args: CheckArgs) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let config = Config::load_or_default();

    let fix = match (args.latitude, args.longitude) {
        (Some(latitude), Some(longitude)) => LocationFix::new(latitude, longitude),
        _ => match db.latest_fix()? {
            Some(fix) => fix,
            None => {
                eprintln!("no position: pass --latitude/--longitude or ingest fixes first");
                std::process::exit(1);
            }
        },
    };

    let now = match args.at {
        Some(at) => NaiveTime::parse_from_str(&at, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(&at, "%H:%M:%S"))?,
        None => Local::now().time(),
    };

    debug!(
        "check pass at ({}, {}) time {}",
        fix.latitude, fix.longitude, now
    );

    let notifier = ConsoleNotifier::new(config.notifications.clone());
    let events = run_pass(&db, &config, &notifier, &fix, now)?;
    for event in &events {
        println!("{}", serde_json::to_string_pretty(event)?);
    }

    if args.snapshot {
        println!("{}", serde_json::to_string_pretty(&snapshot(&db)?)?);
    }

    Ok(())
}
