mod claims;

pub use claims::{ExecutionClaims, ExecutionSubject, TokenType};
