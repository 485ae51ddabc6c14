//! OpenAPI 문서화 설정.
//!
//! utoipa를 사용하여 REST API의 OpenAPI 3.0 스펙을 생성합니다.
//! Swagger UI는 `/swagger-ui` 경로에서 사용 가능합니다.
//!
//! 새로운 엔드포인트를 추가할 때:
//!
//! 1. 응답/요청 타입에 `#[derive(ToSchema)]` 추가
//! 2. 핸들러에 `#[utoipa::path(...)]` 어노테이션 추가
//! 3. 이 파일의 `components(schemas(...))` 및 `paths(...)` 섹션에 추가

use axum::Router;
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;
use vetbook_core::{ClientProfile, Role};

use crate::error::ApiErrorResponse;
use crate::routes::{
    ActivityResponse, ChangePasswordRequest, ChangePasswordResponse, ClientsListResponse,
    ComponentHealth, ComponentStatus, HealthResponse, LoginRequest, LoginResponse, MeResponse,
    RevokeSessionsResponse, SessionView, SessionsListResponse, SetPermissionsRequest,
};

/// 세션 쿠키 인증 스킴 등록.
struct SessionCookieAuth;

impl Modify for SessionCookieAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "session_cookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new("auth_token"))),
        );
    }
}

// ==================== OpenAPI 문서 정의 ====================

/// Vetbook Auth API 문서.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Vetbook Auth API",
        description = r#"
# Vetbook 세션/인증 API

수의사 예약 마켓플레이스의 로그인, 세션 관리, 관리자 기능을 제공합니다.

## 인증

로그인에 성공하면 HttpOnly 쿠키(`auth_token`)가 설정됩니다.
보호된 엔드포인트는 이 쿠키와 서버의 세션 레코드가 모두 유효해야 합니다.
세션이 종료되면 토큰이 만료되지 않았더라도 즉시 거부됩니다.

## 역할

`ADMIN`, `SUPERADMIN`, `MODERATOR` 사이에 상속 관계는 없습니다.
각 관리자 엔드포인트는 허용 역할을 모두 명시합니다.
"#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT"),
    ),
    servers(
        (url = "http://localhost:3000", description = "로컬 개발 서버"),
    ),
    modifiers(&SessionCookieAuth),
    tags(
        (name = "health", description = "헬스 체크 - 서버 상태 확인"),
        (name = "auth", description = "인증 - 로그인/로그아웃/비밀번호"),
        (name = "sessions", description = "세션 - 내 기기 세션 관리"),
        (name = "admin", description = "관리자 - 클라이언트/세션 관리")
    ),
    // ==================== 스키마 등록 ====================
    components(
        schemas(
            // ===== Health =====
            HealthResponse,
            ComponentHealth,
            ComponentStatus,

            // ===== Common =====
            ApiErrorResponse,
            ClientProfile,
            Role,

            // ===== Auth =====
            LoginRequest,
            LoginResponse,
            MeResponse,
            ChangePasswordRequest,
            ChangePasswordResponse,

            // ===== Sessions =====
            SessionView,
            SessionsListResponse,
            ActivityResponse,

            // ===== Admin =====
            ClientsListResponse,
            RevokeSessionsResponse,
            SetPermissionsRequest,
        )
    ),
    // ==================== 경로 등록 ====================
    paths(
        // ===== Health =====
        crate::routes::health::health_check,
        crate::routes::health::health_ready,

        // ===== Auth =====
        crate::routes::auth::login,
        crate::routes::auth::logout,
        crate::routes::auth::me,
        crate::routes::auth::change_password,

        // ===== Sessions =====
        crate::routes::sessions::list_sessions,
        crate::routes::sessions::record_activity,
        crate::routes::sessions::terminate_session,

        // ===== Admin =====
        crate::routes::admin::list_clients,
        crate::routes::admin::client_sessions,
        crate::routes::admin::terminate_any_session,
        crate::routes::admin::revoke_client_sessions,
        crate::routes::admin::set_permissions,
    )
)]
pub struct ApiDoc;

// ==================== Swagger UI 라우터 ====================

/// Swagger UI 라우터 생성.
///
/// - `/swagger-ui` - Swagger UI 대화형 문서
/// - `/api-docs/openapi.json` - OpenAPI JSON 스펙
pub fn swagger_ui_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_spec_valid() {
        let spec = ApiDoc::openapi();
        let json = serde_json::to_string_pretty(&spec).unwrap();

        assert!(json.contains("Vetbook Auth API"));
        assert!(json.contains("session_cookie"));

        assert!(json.contains("/health/ready"));
        assert!(json.contains("/api/v1/auth/login"));
        assert!(json.contains("/api/v1/sessions/{id}"));
        assert!(json.contains("/api/v1/admin/clients/{id}/permissions"));
    }

    #[test]
    fn test_swagger_ui_router_creates() {
        let _router: Router<()> = swagger_ui_router();
    }

    #[test]
    fn test_openapi_contains_schemas() {
        let json = serde_json::to_string(&ApiDoc::openapi()).unwrap();

        assert!(json.contains("LoginRequest"));
        assert!(json.contains("SessionsListResponse"));
        assert!(json.contains("ApiErrorResponse"));
    }
}
