//! Records exchanged with the remote experiment-log server.

mod error;
pub use error::ModelError;

mod timestamp;
pub use timestamp::Timestamp;

mod status;
pub use status::{ConfigStatus, RunStatus};

mod elapsed;
pub use elapsed::Elapsed;

mod run;
pub use run::{ConfigExecution, CurrentStep, ExperimentRun};

mod experiment;
pub use experiment::{Experiment, RunSummary};

mod log_entry;
pub use log_entry::{LogEntry, LogLevel};

mod page;
pub use page::{DEFAULT_LIMIT, LogQuery, Page};

mod user;
pub use user::{AuthToken, Credentials, User};

/// Server-side primary key of an experiment.
pub type ExperimentId = i64;

/// Server-side primary key of an experiment run.
pub type RunId = i64;
