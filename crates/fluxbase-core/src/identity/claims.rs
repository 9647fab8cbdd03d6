use serde::{Deserialize, Serialize};

/// `token_type` claim. Only `"access"` is minted today; kept as an enum
/// (rather than a bare string) so a future refresh-token flow is a
/// non-breaking addition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    Access,
}

/// Which execution this token is scoped to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionSubject {
    Function(String),
    Job(String),
}

/// Claims minted for a single execution (spec §3 "Identity Token").
///
/// Two tokens are minted per execution — a user-scoped one and a
/// service-scoped one — and the service-scoped token never carries the
/// `user_id`/`email`/non-`service_role` `role` fields, regardless of the
/// request that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionClaims {
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
    pub token_type: TokenType,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,

    pub sub: String,
    pub role: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl ExecutionClaims {
    pub fn is_service_scoped(&self) -> bool {
        self.sub == "service_role" && self.role == "service_role"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_type_serializes_as_access() {
        assert_eq!(
            serde_json::to_string(&TokenType::Access).unwrap(),
            "\"access\""
        );
    }

    #[test]
    fn service_scoped_detection() {
        let claims = ExecutionClaims {
            iss: "fluxbase".into(),
            iat: 0,
            exp: 60,
            jti: "x".into(),
            token_type: TokenType::Access,
            execution_id: Some("e1".into()),
            job_id: None,
            sub: "service_role".into(),
            role: "service_role".into(),
            user_id: None,
            email: None,
        };
        assert!(claims.is_service_scoped());
    }
}
