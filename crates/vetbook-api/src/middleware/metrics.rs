//! HTTP 요청 metrics middleware.

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

use crate::metrics::{
    normalize_path, record_http_duration, record_http_request, record_http_response,
};

/// 요청 수, 응답 수(status 라벨), 처리 시간 히스토그램을 기록하는 미들웨어.
pub async fn metrics_layer(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = normalize_path(request.uri().path());

    record_http_request(&method, &path);

    let response = next.run(request).await;

    record_http_response(&method, &path, response.status().as_u16());
    record_http_duration(&method, &path, start.elapsed().as_secs_f64());

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Method, Request, StatusCode},
        middleware,
        routing::delete,
        Router,
    };
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_metrics_middleware_passes_through() {
        let app = Router::new()
            .route("/sessions/{id}", delete(|| async { StatusCode::NO_CONTENT }))
            .layer(middleware::from_fn(metrics_layer));

        let request = Request::builder()
            .method(Method::DELETE)
            .uri("/sessions/123e4567-e89b-12d3-a456-426614174000")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }
}
