mod cancel;
mod config;
mod engine;
mod pumps;
mod spawn;

pub use cancel::{new_cancel_signal, CancelSignal};
pub use config::GraceConfig;
pub use engine::ExecutionEngine;
pub use pumps::{ChildError, FinalMarker, StderrOutcome, StdoutOutcome};
