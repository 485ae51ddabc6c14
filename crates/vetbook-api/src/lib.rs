//! 세션/인증 REST API 서버.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - argon2 비밀번호 해시와 JWT 토큰 코덱
//! - 쿠키 → 세션 레코드 확인 및 인증 게이트
//! - 역할 기반 권한 확인 (`Authorized<C>` 추출기)
//! - 로그인/세션/관리자 REST API
//! - Prometheus 메트릭
//!
//! # 모듈 구성
//!
//! - [`state`]: 애플리케이션 공유 상태 (AppState)
//! - [`routes`]: REST API 엔드포인트
//! - [`auth`]: 인증 및 권한 관리
//! - [`repository`]: 세션/클라이언트 저장소 (PostgreSQL, 인메모리)
//! - [`metrics`]: Prometheus 메트릭 수집
//! - [`middleware`]: HTTP 미들웨어
//! - [`openapi`]: OpenAPI 문서 및 Swagger UI

pub mod auth;
pub mod client_info;
pub mod error;
pub mod i18n;
pub mod metrics;
pub mod middleware;
pub mod openapi;
pub mod repository;
pub mod routes;
pub mod state;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, Method, StatusCode},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub use auth::{
    check_permission, hash_password, verify_password, AuthError, AuthSession, Authorized,
    Capability, OptionalAuthSession, ResolvedSession, SessionResolver, TokenCodec,
};
pub use error::{ApiError, ApiErrorResponse, ApiResult};
pub use i18n::Locale;
pub use metrics::setup_metrics_recorder;
pub use middleware::metrics_layer;
pub use routes::create_api_router;
pub use state::AppState;

#[cfg(any(test, feature = "test-utils"))]
pub use state::{create_test_state, create_test_state_with_store};

/// CORS 레이어 생성.
///
/// 허용 origin이 없으면 개발 모드로 간주하여 모든 origin을 허용합니다.
/// 쿠키 인증이므로 origin이 지정된 경우에만 자격 증명을 허용합니다.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let parsed: Vec<_> = origins
        .iter()
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    let base = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::ACCEPT_LANGUAGE])
        .max_age(Duration::from_secs(3600));

    if parsed.is_empty() {
        if !origins.is_empty() {
            warn!("cors_origins contains no valid origins, allowing any");
        }
        base.allow_origin(AllowOrigin::any())
    } else {
        info!("CORS configured with {} allowed origins", parsed.len());
        base.allow_origin(AllowOrigin::list(parsed))
            .allow_credentials(true)
    }
}

/// 전체 애플리케이션 라우터 생성 (메트릭 엔드포인트 제외).
pub fn create_app(state: Arc<AppState>, cors_origins: &[String]) -> Router {
    create_api_router(&state)
        .with_state(state)
        .merge(openapi::swagger_ui_router())
        .layer(axum::middleware::from_fn(metrics_layer))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(cors_layer(cors_origins))
}
