mod node;
mod roles;

pub use node::NodeId;
pub use roles::{LeaderInfo, LockRole};
