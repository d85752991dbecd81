use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

use clap::Args;
use moments_core::{Database, JsonlFeed, LocationFeed};

/// Append fixes to the durable fix log without evaluating. This is the
/// background location task's job in the original design: store what the
/// platform hands over, let the next check pass read the latest position.
#[derive(Args)]
pub struct IngestArgs {
    /// Read fixes from this JSONL file instead of stdin
    #[arg(long)]
    pub input: Option<PathBuf>,
}

pub fn run(args: IngestArgs) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    let reader: Box<dyn BufRead> = match &args.input {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(BufReader::new(io::stdin())),
    };
    let mut feed = JsonlFeed::new(reader);

    let mut count = 0usize;
    while let Some(fix) = feed.next_fix()? {
        db.record_fix(&fix)?;
        count += 1;
    }

    println!("ingested {count} fixes ({} stored)", db.fix_count()?);
    Ok(())
}
