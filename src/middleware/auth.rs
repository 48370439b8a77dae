use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::{self, AuthError, Claims};
use crate::config::SecurityConfig;
use crate::error::ApiError;

/// Authenticated user extracted from the bearer token
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: Option<String>,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
        }
    }
}

/// JWT authentication middleware that validates tokens and extracts user context
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = authenticate(&headers, &state.config.security)?;
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Verify the bearer token in `headers` and return its subject
pub fn authenticate(headers: &HeaderMap, security: &SecurityConfig) -> Result<AuthUser, ApiError> {
    let token = extract_jwt_from_headers(headers).map_err(ApiError::unauthorized)?;

    let claims = auth::verify_token(token, &security.jwt_secret, &security.jwt_audience).map_err(|e| match e {
        AuthError::MissingSecret => {
            tracing::error!("Rejecting request: JWT secret not configured");
            ApiError::internal_server_error("Authentication is not configured")
        }
        other => {
            tracing::debug!("Token rejected: {}", other);
            ApiError::unauthorized("Invalid or expired token")
        }
    })?;

    Ok(AuthUser::from(claims))
}

/// Extract JWT token from Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<&str, &'static str> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or("Missing Authorization header")?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format")?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if token.trim().is_empty() => Err("Empty JWT token"),
        Some(token) => Ok(token.trim()),
        None => Err("Authorization header must use Bearer token format"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(value: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert("authorization", value.parse().unwrap());
        h
    }

    #[test]
    fn extracts_bearer_token() {
        assert_eq!(extract_jwt_from_headers(&headers("Bearer abc.def.ghi")), Ok("abc.def.ghi"));
        assert_eq!(extract_jwt_from_headers(&headers("Bearer   ")), Err("Empty JWT token"));
        assert_eq!(
            extract_jwt_from_headers(&headers("Basic dXNlcjpwYXNz")),
            Err("Authorization header must use Bearer token format")
        );
        assert_eq!(extract_jwt_from_headers(&HeaderMap::new()), Err("Missing Authorization header"));
    }
}
