use chrono::{DateTime, Utc};

use super::node::NodeId;

/// The named singleton roles that contend for a cluster-wide advisory
/// lock (spec §6). High 32 bits are the shared `"Flux"` prefix
/// (`0x466C7578`); low 32 bits are unique per role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockRole {
    JobsScheduler,
    FunctionsScheduler,
    RpcScheduler,
}

const FLUX_PREFIX: i64 = 0x466C7578_00000000u64 as i64;

impl LockRole {
    /// The 64-bit advisory-lock id for this role.
    pub fn lock_id(&self) -> i64 {
        FLUX_PREFIX
            | match self {
                Self::JobsScheduler => 0x1,
                Self::FunctionsScheduler => 0x2,
                Self::RpcScheduler => 0x3,
            }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::JobsScheduler => "jobs_scheduler",
            Self::FunctionsScheduler => "functions_scheduler",
            Self::RpcScheduler => "rpc_scheduler",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "jobs_scheduler" => Some(Self::JobsScheduler),
            "functions_scheduler" => Some(Self::FunctionsScheduler),
            "rpc_scheduler" => Some(Self::RpcScheduler),
            _ => None,
        }
    }
}

impl std::fmt::Display for LockRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Leadership information for a role, mirrored locally by an elector.
#[derive(Debug, Clone)]
pub struct LeaderInfo {
    pub role: LockRole,
    pub node_id: NodeId,
    pub acquired_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_ids_share_the_flux_prefix() {
        let jobs = LockRole::JobsScheduler.lock_id();
        let functions = LockRole::FunctionsScheduler.lock_id();
        let rpc = LockRole::RpcScheduler.lock_id();

        assert_eq!(jobs, 0x466C7578_00000001u64 as i64);
        assert_eq!(functions, 0x466C7578_00000002u64 as i64);
        assert_eq!(rpc, 0x466C7578_00000003u64 as i64);

        assert_ne!(jobs, functions);
        assert_ne!(functions, rpc);
    }

    #[test]
    fn role_name_round_trips() {
        assert_eq!(
            LockRole::from_str("jobs_scheduler"),
            Some(LockRole::JobsScheduler)
        );
        assert_eq!(LockRole::from_str("bogus"), None);
        assert_eq!(LockRole::JobsScheduler.as_str(), "jobs_scheduler");
    }
}
