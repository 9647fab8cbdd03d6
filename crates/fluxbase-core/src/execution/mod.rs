mod request;
mod result;

pub use request::{ExecutionKind, ExecutionRequest, ExecutionRequestBuilder};
pub use result::{ClassifiedLine, ExecutionResult, LineLevel};
