use std::time::Duration;

use chrono::Utc;
use fluxbase_core::identity::{ExecutionClaims, ExecutionSubject, TokenType};
use fluxbase_core::{ExecutionError, ExecutionErrorKind, ExecutionRequest};
use jsonwebtoken::{encode, EncodingKey, Header};
use uuid::Uuid;

/// A signing secret, newtyped so it can never be accidentally `Display`ed
/// or interpolated into a log line.
#[derive(Clone)]
pub struct SigningKey(String);

impl SigningKey {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SigningKey(..)")
    }
}

/// Mints the two short-lived tokens an execution carries (spec §4.A).
pub struct IdentityMinter {
    issuer: String,
}

impl Default for IdentityMinter {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityMinter {
    pub fn new() -> Self {
        Self {
            issuer: "fluxbase".to_string(),
        }
    }

    /// User-scoped token: carries the caller's identity unless the request
    /// is anonymous, in which case no user claims are attached.
    pub fn mint_user(
        &self,
        secret: &SigningKey,
        req: &ExecutionRequest,
        timeout: Duration,
    ) -> Result<String, ExecutionError> {
        if secret.is_empty() {
            return Err(ExecutionError::new(
                ExecutionErrorKind::Config,
                "signing key is empty",
            ));
        }

        let (sub, role, user_id, email) = if req.is_anonymous() {
            ("anonymous".to_string(), "anon".to_string(), None, None)
        } else {
            let user_id = req.user_id.clone().unwrap_or_default();
            let role = req.user_role.clone().unwrap_or_else(|| "authenticated".to_string());
            (user_id.clone(), role, Some(user_id), req.user_email.clone())
        };

        let claims = self.build_claims(req, timeout, sub, role, user_id, email);
        self.sign(secret, claims)
    }

    /// Service-scoped token: never carries user claims, regardless of the
    /// request that produced it (spec §3 "Identity Token" invariant).
    pub fn mint_service(
        &self,
        secret: &SigningKey,
        req: &ExecutionRequest,
        timeout: Duration,
    ) -> Result<String, ExecutionError> {
        if secret.is_empty() {
            return Err(ExecutionError::new(
                ExecutionErrorKind::Config,
                "signing key is empty",
            ));
        }

        let claims = self.build_claims(
            req,
            timeout,
            "service_role".to_string(),
            "service_role".to_string(),
            None,
            None,
        );
        self.sign(secret, claims)
    }

    fn build_claims(
        &self,
        req: &ExecutionRequest,
        timeout: Duration,
        sub: String,
        role: String,
        user_id: Option<String>,
        email: Option<String>,
    ) -> ExecutionClaims {
        let iat = Utc::now().timestamp();
        let exp = iat + timeout.as_secs() as i64;

        let subject = match req.kind {
            fluxbase_core::ExecutionKind::Function => ExecutionSubject::Function(req.id.to_string()),
            fluxbase_core::ExecutionKind::Job => ExecutionSubject::Job(req.id.to_string()),
        };
        let (execution_id, job_id) = match subject {
            ExecutionSubject::Function(id) => (Some(id), None),
            ExecutionSubject::Job(id) => (None, Some(id)),
        };

        ExecutionClaims {
            iss: self.issuer.clone(),
            iat,
            exp,
            jti: Uuid::new_v4().to_string(),
            token_type: TokenType::Access,
            execution_id,
            job_id,
            sub,
            role,
            user_id,
            email,
        }
    }

    fn sign(&self, secret: &SigningKey, claims: ExecutionClaims) -> Result<String, ExecutionError> {
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .map_err(|e| ExecutionError::new(ExecutionErrorKind::Config, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn req(anonymous: bool) -> ExecutionRequest {
        let mut builder = ExecutionRequest::builder(fluxbase_core::ExecutionKind::Function, "echo")
            .timeout(Duration::from_secs(30));
        if !anonymous {
            builder = builder.user("u-1", Some("u@example.com".into()), None);
        }
        builder.build()
    }

    #[test]
    fn empty_secret_is_rejected() {
        let minter = IdentityMinter::new();
        let key = SigningKey::new("");
        let err = minter.mint_user(&key, &req(false), Duration::from_secs(30)).unwrap_err();
        assert_eq!(err.kind, ExecutionErrorKind::Config);
    }

    #[test]
    fn distinct_calls_yield_distinct_tokens() {
        let minter = IdentityMinter::new();
        let key = SigningKey::new("s3cr3t");
        let a = minter.mint_user(&key, &req(false), Duration::from_secs(30)).unwrap();
        let b = minter.mint_user(&key, &req(false), Duration::from_secs(30)).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn service_token_never_carries_user_claims() {
        let minter = IdentityMinter::new();
        let key = SigningKey::new("s3cr3t");
        let token = minter
            .mint_service(&key, &req(false), Duration::from_secs(30))
            .unwrap();

        let decoded = jsonwebtoken::decode::<ExecutionClaims>(
            &token,
            &jsonwebtoken::DecodingKey::from_secret(b"s3cr3t"),
            &jsonwebtoken::Validation::default(),
        )
        .unwrap();

        assert_eq!(decoded.claims.sub, "service_role");
        assert_eq!(decoded.claims.role, "service_role");
        assert!(decoded.claims.user_id.is_none());
        assert!(decoded.claims.email.is_none());
    }

    #[test]
    fn anonymous_user_token_has_no_user_id() {
        let minter = IdentityMinter::new();
        let key = SigningKey::new("s3cr3t");
        let token = minter.mint_user(&key, &req(true), Duration::from_secs(30)).unwrap();
        assert!(!token.is_empty());
    }
}
