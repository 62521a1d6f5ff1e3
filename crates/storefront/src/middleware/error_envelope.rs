//! Fills in the `path` of JSON error envelopes.
//!
//! [`AppError`](crate::error::AppError) cannot see the request, so it leaves
//! the path empty and attaches the envelope as a response extension. This
//! middleware rewrites the body with the request path.

use axum::{
    Json,
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::ErrorEnvelope;

pub async fn error_envelope_middleware(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    let response = next.run(request).await;

    let Some(mut envelope) = response.extensions().get::<ErrorEnvelope>().cloned() else {
        return response;
    };
    envelope.path = path;

    let (mut parts, _) = response.into_parts();
    parts.headers.remove(axum::http::header::CONTENT_LENGTH);
    (parts, Json(envelope)).into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Request as HttpRequest, StatusCode},
        middleware,
        routing::get,
    };
    use tower::ServiceExt;

    use super::*;
    use crate::error::AppError;

    #[tokio::test]
    async fn test_envelope_gets_request_path() {
        let app = Router::new()
            .route(
                "/items/{id}",
                get(|| async { Err::<(), _>(AppError::NotFound("Item not found".to_owned())) }),
            )
            .route("/ok", get(|| async { "fine" }))
            .layer(middleware::from_fn(error_envelope_middleware));

        let response = app
            .clone()
            .oneshot(HttpRequest::get("/items/7").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let envelope: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(envelope["error"], "HTTP 404");
        assert_eq!(envelope["message"], "Item not found");
        assert_eq!(envelope["path"], "/items/7");

        let response = app
            .oneshot(HttpRequest::get("/ok").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"fine");
    }
}
