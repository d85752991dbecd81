use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "moments", version, about = "Location/time alarms from the command line")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Alarm management
    Alarm {
        #[command(subcommand)]
        action: commands::alarm::AlarmAction,
    },
    /// Run one evaluation pass (background wake-up)
    Check(commands::check::CheckArgs),
    /// Follow a location feed and evaluate continuously
    Watch(commands::watch::WatchArgs),
    /// Append location fixes to the durable fix log
    Ingest(commands::ingest::IngestArgs),
    /// Trigger history
    History {
        #[command(subcommand)]
        action: commands::history::HistoryAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Alarm { action } => commands::alarm::run(action),
        Commands::Check(args) => commands::check::run(args),
        Commands::Watch(args) => commands::watch::run(args),
        Commands::Ingest(args) => commands::ingest::run(args),
        Commands::History { action } => commands::history::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
