pub mod cluster;
pub mod config;
pub mod error;
pub mod execution;
pub mod identity;
pub mod migration;
pub mod rate_limit;

pub use cluster::{LeaderInfo, LockRole, NodeId};
pub use config::FluxbaseConfig;
pub use error::{ExecutionError, ExecutionErrorKind, FluxbaseError, Result};
pub use execution::{
    ClassifiedLine, ExecutionKind, ExecutionRequest, ExecutionRequestBuilder, ExecutionResult,
    LineLevel,
};
pub use identity::{ExecutionClaims, ExecutionSubject, TokenType};
pub use migration::{
    ExecutionLog, LogAction, LogStatus, Migration, MigrationEdit, MigrationStatus, NewExecutionLog,
    NewMigration,
};
pub use rate_limit::{RateLimitConfig, RateLimitHeaders, RateLimitKey, RateLimitResult};
