pub mod capture;
pub mod clock;
pub mod config;
pub mod constraints;
pub mod database;
pub mod error;
pub mod events;
pub mod model;
pub mod parser;
pub mod period;
pub mod recurrence;
pub mod services;
pub mod store;
pub mod urgency;

pub use capture::TaskInput;
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{AppConfig, StorageMode};
pub use constraints::{Warning, WarningKind};
pub use database::Database;
pub use error::{UpkeepError, UpkeepResult};
pub use events::{ChangeEvent, ChangeSink, NoopSink, RecordingSink, TracingSink};
pub use model::*;
pub use period::{Period, PeriodUnit};
pub use services::{BoardEntry, BoardSnapshot, TasksService};
pub use store::{MemoryStore, TaskStore};
pub use urgency::Urgency;
