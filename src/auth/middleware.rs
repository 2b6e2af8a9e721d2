//! Authentication Middleware
//!
//! Axum middleware comparing the `Authorization: Bearer` header against the
//! configured control token.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::Response,
};

/// Token the control API expects; `None` disables the check
#[derive(Debug, Clone, Default)]
pub struct ApiToken(pub Option<String>);

pub struct AuthMiddleware;

impl AuthMiddleware {
    pub async fn validate_token(
        State(expected): State<Arc<ApiToken>>,
        req: Request,
        next: Next,
    ) -> Result<Response, StatusCode> {
        let Some(expected) = expected.0.as_deref() else {
            return Ok(next.run(req).await);
        };

        let provided = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim);

        match provided {
            Some(token) if constant_time_eq(token.as_bytes(), expected.as_bytes()) => {
                Ok(next.run(req).await)
            }
            Some(_) => {
                tracing::warn!(
                    "[AuthMiddleware] Rejected bad token for {} {}",
                    req.method(),
                    req.uri()
                );
                Err(StatusCode::UNAUTHORIZED)
            }
            None => {
                tracing::warn!(
                    "[AuthMiddleware] Missing bearer token for {} {}",
                    req.method(),
                    req.uri()
                );
                Err(StatusCode::UNAUTHORIZED)
            }
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
