/**
 * Admin Authentication
 * Verifies bearer tokens issued by the external auth service
 */
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AppState;

/// Roles allowed to use the admin API.
const ADMIN_ROLES: &[&str] = &["admin", "super_admin"];

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,   // User ID
    pub email: String, // User email
    pub role: String,  // User role
    pub exp: i64,      // Expiry timestamp
    pub iat: i64,      // Issued at timestamp
}

/// Verify and decode access token
pub fn verify_access_token(
    token: &str,
    secret: &str,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

/// Extract bearer token from Authorization header
fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

pub fn verify_admin(headers: &HeaderMap, secret: &str) -> Result<Claims, AppError> {
    let token = extract_bearer_token(headers).ok_or(AppError::Unauthorized)?;
    let claims = verify_access_token(token, secret).map_err(|_| AppError::InvalidToken)?;

    if !ADMIN_ROLES
        .iter()
        .any(|role| claims.role.eq_ignore_ascii_case(role))
    {
        tracing::warn!(sub = %claims.sub, role = %claims.role, "non-admin token rejected");
        return Err(AppError::Forbidden);
    }
    Ok(claims)
}

/// Middleware guarding every `/api/admin` route.
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = verify_admin(request.headers(), &state.config.jwt_secret)?;
    tracing::debug!(sub = %claims.sub, "admin request authorized");
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::Claims;
    use chrono::{Duration, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};

    pub fn token_for(role: &str, secret: &str) -> String {
        let now = Utc::now();
        let claims = Claims {
            sub: "admin-1".to_string(),
            email: "admin@sanfinance.example".to_string(),
            role: role.to_string(),
            exp: (now + Duration::minutes(15)).timestamp(),
            iat: now.timestamp(),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    pub fn admin_token(secret: &str) -> String {
        token_for("admin", secret)
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::token_for;
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            "authorization",
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
        headers
    }

    #[test]
    fn test_verify_access_token_invalid_returns_err() {
        assert!(verify_access_token("invalid.jwt.token", "secret").is_err());
    }

    #[test]
    fn test_missing_header_is_unauthorized() {
        assert!(matches!(
            verify_admin(&HeaderMap::new(), "secret"),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn test_wrong_secret_is_invalid_token() {
        let token = token_for("admin", "issuer-secret");
        assert!(matches!(
            verify_admin(&headers_with(&token), "other-secret"),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn test_role_is_checked() {
        let token = token_for("editor", "secret");
        assert!(matches!(
            verify_admin(&headers_with(&token), "secret"),
            Err(AppError::Forbidden)
        ));

        let token = token_for("SUPER_ADMIN", "secret");
        let claims = verify_admin(&headers_with(&token), "secret").unwrap();
        assert_eq!(claims.sub, "admin-1");
    }
}
