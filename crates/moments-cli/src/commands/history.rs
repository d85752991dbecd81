use clap::Subcommand;
use moments_core::Database;

#[derive(Subcommand)]
pub enum HistoryAction {
    /// Recent firings, newest first
    List {
        #[arg(long, default_value = "20")]
        limit: usize,
    },
    /// Trigger counts
    Stats,
    /// Delete all history rows
    Clear,
}

pub fn run(action: HistoryAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        HistoryAction::List { limit } => {
            let history = db.history(limit)?;
            println!("{}", serde_json::to_string_pretty(&history)?);
        }
        HistoryAction::Stats => {
            let stats = db.stats()?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        HistoryAction::Clear => {
            let n = db.clear_history()?;
            println!("cleared {n} rows");
        }
    }

    Ok(())
}
