use chrono::NaiveTime;
use clap::Subcommand;
use moments_core::{Alarm, AlarmSound, AlarmStore, Config, Database};

#[derive(Subcommand)]
pub enum AlarmAction {
    /// Create a new alarm
    Add {
        /// User label
        name: String,
        /// Target latitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        latitude: f64,
        /// Target longitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        longitude: f64,
        /// Trigger radius in meters (default from config)
        #[arg(long)]
        radius: Option<f64>,
        /// Time-of-day gate, HH:MM (makes the alarm time-based)
        #[arg(long)]
        time: Option<String>,
        /// Sound to play: default, chime, bell, or a file path
        #[arg(long)]
        sound: Option<String>,
        /// Deactivate after firing once
        #[arg(long)]
        one_time: bool,
    },
    /// List all alarms as JSON
    List,
    /// Print one alarm as JSON
    Show { id: String },
    /// Delete an alarm
    Remove { id: String },
    /// Re-activate an alarm
    Enable { id: String },
    /// Deactivate an alarm without deleting it
    Disable { id: String },
}

pub fn run(action: AlarmAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let store = AlarmStore::new(&db);

    match action {
        AlarmAction::Add {
            name,
            latitude,
            longitude,
            radius,
            time,
            sound,
            one_time,
        } => {
            let config = Config::load_or_default();
            let radius = radius.unwrap_or(config.evaluator.default_radius_m);

            let mut alarm = Alarm::new(name, latitude, longitude, radius);
            if let Some(time) = time {
                let time = NaiveTime::parse_from_str(&time, "%H:%M")
                    .or_else(|_| NaiveTime::parse_from_str(&time, "%H:%M:%S"))?;
                alarm = alarm.with_time(time);
            }
            if let Some(sound) = sound {
                alarm.sound = sound.parse::<AlarmSound>()?;
            }
            if one_time {
                alarm = alarm.one_shot();
            }

            let created = store.add(alarm)?;
            println!("{}", serde_json::to_string_pretty(&created)?);
        }
        AlarmAction::List => {
            let alarms = store.load()?;
            println!("{}", serde_json::to_string_pretty(&alarms)?);
        }
        AlarmAction::Show { id } => match store.get(&id)? {
            Some(alarm) => println!("{}", serde_json::to_string_pretty(&alarm)?),
            None => {
                eprintln!("no alarm with id {id}");
                std::process::exit(1);
            }
        },
        AlarmAction::Remove { id } => {
            if store.remove(&id)? {
                println!("removed {id}");
            } else {
                eprintln!("no alarm with id {id}");
                std::process::exit(1);
            }
        }
        AlarmAction::Enable { id } => set_active(&store, &id, true)?,
        AlarmAction::Disable { id } => set_active(&store, &id, false)?,
    }

    Ok(())
}

fn set_active(
    store: &AlarmStore,
    id: &str,
    active: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if store.set_active(id, active)? {
        println!("{} {id}", if active { "enabled" } else { "disabled" });
        Ok(())
    } else {
        eprintln!("no alarm with id {id}");
        std::process::exit(1);
    }
}
