//! Middleware for logging requests and responses.

use axum::{
    body::{Body, Bytes, to_bytes},
    extract::Request,
    http::{StatusCode, request, response},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// The number of bytes of a body that are logged at the `info` level.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is
/// truncated and the full body is logged at the `debug` level.
/// Bodies are passed on byte for byte, only the logged text is lossy.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let body = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("could not read request body: {error}");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };
    log_request(&parts, &body_text(&body));

    let request = Request::from_parts(parts, Body::from(body));
    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let body = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("could not read response body: {error}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    log_response(&parts, &body_text(&body));

    Response::from_parts(parts, Body::from(body))
}

fn body_text(body: &Bytes) -> String {
    String::from_utf8_lossy(body).to_string()
}

/// The longest prefix of `text` that fits in [LOG_BODY_LENGTH_LIMIT] bytes
/// without splitting a character.
fn truncate_body(text: &str) -> Option<&str> {
    if text.len() <= LOG_BODY_LENGTH_LIMIT {
        return None;
    }

    let end = (0..=LOG_BODY_LENGTH_LIMIT)
        .rev()
        .find(|&index| text.is_char_boundary(index))
        .unwrap_or(0);

    Some(&text[..end])
}

fn log_request(parts: &request::Parts, body: &str) {
    match truncate_body(body) {
        Some(prefix) => {
            tracing::info!(
                "Received request: {} {}\nbody: {prefix}...",
                parts.method,
                parts.uri
            );
            tracing::debug!("Full request body: {body:?}");
        }
        None => tracing::info!(
            "Received request: {} {}\nbody: {body:?}",
            parts.method,
            parts.uri
        ),
    }
    tracing::debug!("Request headers: {:#?}", parts.headers);
}

fn log_response(parts: &response::Parts, body: &str) {
    match truncate_body(body) {
        Some(prefix) => {
            tracing::info!("Sending response: {}\nbody: {prefix}...", parts.status);
            tracing::debug!("Full response body: {body:?}");
        }
        None => tracing::info!("Sending response: {}\nbody: {body:?}", parts.status),
    }
    tracing::debug!("Response headers: {:#?}", parts.headers);
}

#[cfg(test)]
mod tests {
    use axum::{
        Router,
        body::Body,
        http::Request,
        middleware,
        routing::{get, post},
    };
    use tower::ServiceExt;

    use crate::test_utils::assert_status_ok;

    use super::{LOG_BODY_LENGTH_LIMIT, logging_middleware, truncate_body};

    #[test]
    fn short_body_is_not_truncated() {
        assert_eq!(truncate_body("amount=12.5&currency=CNY"), None);
    }

    #[test]
    fn long_body_is_truncated_to_limit() {
        let body = "a".repeat(LOG_BODY_LENGTH_LIMIT + 10);

        let prefix = truncate_body(&body).unwrap();

        assert_eq!(prefix.len(), LOG_BODY_LENGTH_LIMIT);
    }

    #[test]
    fn truncation_does_not_split_characters() {
        // Each character is three bytes, so the limit falls inside a character.
        let body = "午餐".repeat(LOG_BODY_LENGTH_LIMIT);

        let prefix = truncate_body(&body).unwrap();

        assert!(prefix.len() <= LOG_BODY_LENGTH_LIMIT);
        assert!(prefix.chars().all(|c| c == '午' || c == '餐'));
    }

    #[tokio::test]
    async fn passes_binary_body_through_unchanged() {
        let bytes: &'static [u8] = b"%PDF-1.5\n\xff\xfe\x00\x9c binary";
        let app = Router::new()
            .route("/file", get(move || async move { bytes }))
            .layer(middleware::from_fn(logging_middleware));

        let response = app
            .oneshot(Request::builder().uri("/file").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_status_ok(&response);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], bytes);
    }

    #[tokio::test]
    async fn passes_body_through_unchanged() {
        let app = Router::new()
            .route("/echo", post(|body: String| async move { body }))
            .layer(middleware::from_fn(logging_middleware));
        let body = "note=".to_owned() + &"x".repeat(200);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/echo")
                    .body(Body::from(body.clone()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_status_ok(&response);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(String::from_utf8_lossy(&bytes), body);
    }
}
