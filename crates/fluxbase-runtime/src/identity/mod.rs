mod minter;

pub use minter::{IdentityMinter, SigningKey};
