//! Advisory-lock-based leader election (spec §4.H, §6).

mod elector;

pub use elector::{new_elector, Elector, ElectorConfig};
