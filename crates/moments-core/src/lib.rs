//! # Moments Core Library
//!
//! This library provides the core business logic for Moments, a
//! location/time alarm engine: the user defines "moments" -- reminders tied
//! to a place and optionally a time of day -- and an alarm fires when the
//! live position enters the target radius while the time gate is open.
//! It implements a CLI-first philosophy where all operations are available
//! via a standalone CLI binary; any GUI shell is a thin layer over the same
//! core library.
//!
//! ## Architecture
//!
//! - **Evaluator**: a pure, single-pass filter over the alarm list; the
//!   caller feeds it position fixes and persists the returned fired set
//! - **Store**: the alarm list as a JSON array under a fixed key in the
//!   SQLite key-value table, plus trigger history and the ingested fix log
//! - **Trigger handler**: notification, one-shot deactivation, history
//! - **Feeds**: foreground watch loop and background check passes share all
//!   state through the store, never through an ambient in-memory handle
//!
//! ## Key Components
//!
//! - [`Evaluator`]: decides which alarms cross their trigger condition
//! - [`AlarmStore`]: alarm CRUD and the fired set
//! - [`TriggerHandler`]: carries out the side effects of a firing
//! - [`Database`]: SQLite persistence
//! - [`Config`]: application configuration management

pub mod alarm;
pub mod error;
pub mod events;
pub mod geo;
pub mod location;
pub mod notify;
pub mod storage;

pub use alarm::{
    run_pass, snapshot, Alarm, AlarmSound, AlarmStore, EvalPolicy, Evaluation, Evaluator,
    FiredSet, TriggerHandler, TriggerReport,
};
pub use error::{ConfigError, CoreError, StoreError, ValidationError};
pub use events::Event;
pub use geo::{distance_m, Coordinates};
pub use location::{JsonlFeed, LocationFeed, LocationFix};
pub use notify::{ConsoleNotifier, Notifier};
pub use storage::{data_dir, Config, Database, Stats, TriggerRecord};
