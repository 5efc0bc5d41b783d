//! JWT authentication.
//!
//! Every route except `/health` takes an [`AuthUser`], which is built from
//! the `Authorization: Bearer <JWT>` header. The token's claims decide the
//! tenant, the acting user and the role; nothing in a request body or path
//! can override them.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use till_core::{Permission, Role};
use till_db::TenantScope;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,

    pub tenant_id: String,

    pub role: Role,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID
    pub jti: String,
}

/// Signs and validates HS256 tokens.
pub struct JwtManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
    lifetime_secs: i64,
}

impl JwtManager {
    pub fn new(secret: &str, lifetime_secs: i64) -> Self {
        JwtManager {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            lifetime_secs,
        }
    }

    /// Issues a token for `user_id` acting in `tenant_id`.
    ///
    /// Login lives outside this service; this is for operators and tests.
    pub fn issue(&self, user_id: &str, tenant_id: &str, role: Role) -> ApiResult<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.lifetime_secs);

        let claims = Claims {
            sub: user_id.to_string(),
            tenant_id: tenant_id.to_string(),
            role,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| ApiError::internal(format!("Failed to generate token: {}", e)))
    }

    /// Validates signature and expiry, and decodes the claims.
    pub fn validate(&self, token: &str) -> ApiResult<Claims> {
        let token_data: TokenData<Claims> = decode(token, &self.decoding, &Validation::default())
            .map_err(|e| ApiError::unauthorized(format!("Invalid token: {}", e)))?;

        Ok(token_data.claims)
    }
}

fn extract_bearer(headers: &HeaderMap) -> ApiResult<&str> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| ApiError::unauthorized("Missing Authorization header"))?;

    let header = header
        .to_str()
        .map_err(|_| ApiError::unauthorized("Malformed Authorization header"))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::unauthorized("Expected a Bearer token"))?
        .trim();

    if token.is_empty() {
        return Err(ApiError::unauthorized("Empty bearer token"));
    }

    Ok(token)
}

// =============================================================================
// AuthUser
// =============================================================================

/// The authenticated caller of a request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub tenant_id: String,
    pub role: Role,
}

impl AuthUser {
    /// 403 unless the caller's role grants `permission`.
    pub fn require(&self, permission: Permission) -> ApiResult<()> {
        if self.role.has_permission(permission) {
            Ok(())
        } else {
            Err(ApiError::forbidden(format!(
                "Role '{}' lacks permission '{}'",
                self.role.as_str(),
                permission.as_str()
            )))
        }
    }

    /// The caller's tenant view of the database.
    pub fn scope(&self, state: &AppState) -> TenantScope {
        state.db.tenant(&self.tenant_id)
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = extract_bearer(&parts.headers)?;
        let claims = state.jwt.validate(token)?;

        Ok(AuthUser {
            user_id: claims.sub,
            tenant_id: claims.tenant_id,
            role: claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const SECRET: &str = "test-secret-at-least-16";

    #[test]
    fn test_jwt_roundtrip() {
        let manager = JwtManager::new(SECRET, 3600);
        let token = manager.issue("user-001", "tenant-001", Role::Cashier).unwrap();

        let claims = manager.validate(&token).unwrap();
        assert_eq!(claims.sub, "user-001");
        assert_eq!(claims.tenant_id, "tenant-001");
        assert_eq!(claims.role, Role::Cashier);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = JwtManager::new(SECRET, 3600)
            .issue("user-001", "tenant-001", Role::Owner)
            .unwrap();

        let err = JwtManager::new("some-other-secret-value", 3600)
            .validate(&token)
            .unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_expired_token_rejected() {
        // Default validation allows 60s of leeway.
        let manager = JwtManager::new(SECRET, -120);
        let token = manager.issue("user-001", "tenant-001", Role::Owner).unwrap();
        assert!(manager.validate(&token).is_err());
    }

    #[test]
    fn test_extract_bearer() {
        let mut headers = HeaderMap::new();
        assert!(extract_bearer(&headers).is_err());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(extract_bearer(&headers).is_err());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer   "));
        assert!(extract_bearer(&headers).is_err());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(extract_bearer(&headers).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_require_permission() {
        let cashier = AuthUser {
            user_id: "u".into(),
            tenant_id: "t".into(),
            role: Role::Cashier,
        };
        assert!(cashier.require(Permission::SalesWrite).is_ok());

        let err = cashier.require(Permission::ReportsRead).unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::FORBIDDEN);
    }
}
