use axum::response::Json;
use serde_json::json;

/// Health check endpoint handler.
///
/// # Route
/// - **Method**: GET
/// - **Path**: `/ping`
///
/// ```bash
/// curl http://localhost:3000/ping
/// # Response: {"status":"pong"}
/// ```
///
/// Never touches the RPC node or the aggregator, so it stays green while
/// upstreams are down.
pub async fn ping() -> Json<serde_json::Value> {
    Json(json!({ "status": "pong" }))
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::{app, call, test_state};
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_ping_is_public() {
        let (state, _) = test_state(&[("CONTROL_API_TOKEN", "secret")], 1.0);
        let (status, body) = call(app(&state), "GET", "/ping", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "pong" }));
    }
}
