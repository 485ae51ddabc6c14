//! API 라우트.
//!
//! # 라우트 구조
//!
//! - `/health` - 헬스 체크 (liveness)
//! - `/health/ready` - 저장소 연결 확인 (readiness)
//! - `/api/v1/auth` - 로그인/로그아웃/현재 세션/비밀번호 변경
//! - `/api/v1/sessions` - 내 세션(기기) 관리
//! - `/api/v1/admin` - 클라이언트/세션 관리 (역할 필요)

pub mod admin;
pub mod auth;
pub mod health;
pub mod sessions;

pub use admin::{admin_router, ClientsListResponse, RevokeSessionsResponse, SetPermissionsRequest};
pub use auth::{
    auth_router, ChangePasswordRequest, ChangePasswordResponse, LoginRequest, LoginResponse,
    MeResponse,
};
pub use health::{health_router, ComponentHealth, ComponentStatus, HealthResponse};
pub use sessions::{sessions_router, ActivityResponse, SessionView, SessionsListResponse};

use axum::Router;
use std::sync::Arc;

use crate::state::AppState;

/// 전체 API 라우터 생성.
///
/// 로그인 rate limiter 구성을 읽기 위해 상태를 참조합니다.
pub fn create_api_router(state: &AppState) -> Router<Arc<AppState>> {
    Router::new()
        .nest("/health", health_router())
        .nest("/api/v1/auth", auth_router(state))
        .nest("/api/v1/sessions", sessions_router())
        .nest("/api/v1/admin", admin_router())
}
