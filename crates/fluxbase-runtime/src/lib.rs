pub mod cluster;
pub mod db;
pub mod env;
pub mod execution;
pub mod identity;
pub mod migrations;
pub mod observability;
pub mod output;
pub mod rate_limit;
pub mod wrapper;

pub use cluster::{new_elector, Elector, ElectorConfig};
pub use db::Database;
pub use env::EnvBuilder;
pub use execution::{
    new_cancel_signal, CancelSignal, ChildError, ExecutionEngine, FinalMarker, GraceConfig,
    StderrOutcome, StdoutOutcome,
};
pub use identity::{IdentityMinter, SigningKey};
pub use migrations::{ApplyPendingOutcome, MigrationExecutor, MigrationStore};
pub use observability::init_logging;
pub use rate_limit::KeyedLimiter;
pub use wrapper::CodeWrapper;
