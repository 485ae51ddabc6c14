//! 로그인/로그아웃 endpoint.
//!
//! 로그인에 성공하면 토큰을 발급해 세션 레코드를 만들고, 토큰은
//! HttpOnly 쿠키로만 전달합니다.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use axum_extra::extract::{
    cookie::{Cookie, SameSite},
    CookieJar,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::ToSchema;
use validator::Validate;
use vetbook_core::{AuthConfig, ClientProfile, NewSession};

use crate::auth::{
    hash_password, validate_password_strength, verify_login, verify_password, AuthError,
    AuthSession,
};
use crate::client_info::{device_info, ClientIp};
use crate::error::{ApiError, ApiErrorResponse, ApiResult};
use crate::i18n::Locale;
use crate::metrics::record_login;
use crate::state::AppState;

// ==================== 요청/응답 타입 ====================

/// 로그인 요청.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "올바른 이메일 형식이 아닙니다"))]
    pub email: String,
    #[validate(length(min = 1, message = "비밀번호를 입력하세요"))]
    pub password: String,
}

/// 로그인 응답. 토큰은 본문이 아닌 쿠키로만 전달됩니다.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub client: ClientProfile,
    pub session_id: String,
}

/// 현재 세션 정보.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MeResponse {
    pub client: ClientProfile,
    pub session_id: String,
    pub last_active: chrono::DateTime<chrono::Utc>,
}

/// 비밀번호 변경 요청.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1))]
    pub current_password: String,
    #[validate(length(min = 8, max = 128, message = "비밀번호는 8-128자여야 합니다"))]
    pub new_password: String,
}

/// 비밀번호 변경 응답.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChangePasswordResponse {
    /// 종료된 다른 세션 수
    pub revoked_sessions: u64,
}

// ==================== 쿠키 ====================

/// 세션 쿠키 생성 (HttpOnly, SameSite=Lax, Path=/).
fn session_cookie(auth: &AuthConfig, token: String, max_age: chrono::Duration) -> Cookie<'static> {
    Cookie::build((auth.cookie_name.clone(), token))
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(auth.secure_cookie)
        .path("/")
        .max_age(time::Duration::seconds(max_age.num_seconds()))
        .build()
}

/// 세션 쿠키 삭제용 (같은 Path로 만료).
fn removal_cookie(auth: &AuthConfig) -> Cookie<'static> {
    Cookie::build((auth.cookie_name.clone(), "")).path("/").build()
}

// ==================== 핸들러 ====================

/// 로그인.
///
/// 계정 없음과 비밀번호 불일치는 같은 응답을 반환합니다.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "로그인 성공 (Set-Cookie)", body = LoginResponse),
        (status = 400, description = "이메일 또는 비밀번호 불일치", body = ApiErrorResponse),
        (status = 422, description = "입력값 오류", body = ApiErrorResponse),
        (status = 429, description = "로그인 시도 초과", body = ApiErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    locale: Locale,
    ClientIp(client_ip): ClientIp,
    headers: HeaderMap,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> ApiResult<(CookieJar, Json<LoginResponse>)> {
    request
        .validate()
        .map_err(|errors| ApiError::validation(&errors))?;

    let client = state.clients.find_by_email(&request.email).await?;
    let verified = verify_login(
        &request.password,
        client.as_ref().map(|c| c.password.as_str()),
    );
    let client = match client {
        Some(client) if verified => client,
        _ => {
            record_login("invalid_credential");
            info!(email = %request.email, "Login rejected");
            return Err(ApiError::from_auth(AuthError::InvalidCredential, locale));
        }
    };

    let codec = state.resolver.codec();
    let token = codec
        .issue(&client.id)
        .map_err(|e| ApiError::from_auth(AuthError::Internal(e.to_string()), locale))?;

    let session = state
        .sessions
        .create(
            NewSession::new(client.id.as_str(), token.as_str())
                .with_device(device_info(&headers, client_ip)),
        )
        .await?;

    record_login("success");
    info!(
        client_id = %client.id,
        session_id = %session.id,
        device = session.device.as_deref().unwrap_or("unknown"),
        "Client logged in"
    );

    let jar = jar.add(session_cookie(&state.auth, token, codec.ttl()));
    Ok((
        jar,
        Json(LoginResponse {
            client: client.profile(),
            session_id: session.id,
        }),
    ))
}

/// 로그아웃. 현재 세션 레코드를 삭제하고 쿠키를 지웁니다.
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    responses(
        (status = 204, description = "로그아웃 완료"),
        (status = 401, description = "세션 없음", body = ApiErrorResponse)
    ),
    tag = "auth"
)]
pub async fn logout(
    State(state): State<Arc<AppState>>,
    AuthSession(resolved): AuthSession,
    jar: CookieJar,
) -> ApiResult<(CookieJar, StatusCode)> {
    state.sessions.delete(resolved.session_id()).await?;
    info!(client_id = %resolved.client_id(), session_id = %resolved.session_id(), "Client logged out");

    Ok((jar.remove(removal_cookie(&state.auth)), StatusCode::NO_CONTENT))
}

/// 현재 클라이언트와 세션.
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    responses(
        (status = 200, description = "현재 세션", body = MeResponse),
        (status = 401, description = "세션 없음", body = ApiErrorResponse)
    ),
    tag = "auth"
)]
pub async fn me(AuthSession(resolved): AuthSession) -> Json<MeResponse> {
    Json(MeResponse {
        client: resolved.client.profile(),
        session_id: resolved.session.id,
        last_active: resolved.session.last_active,
    })
}

/// 비밀번호 변경. 성공하면 현재 세션을 제외한 모든 세션을 종료합니다.
#[utoipa::path(
    put,
    path = "/api/v1/auth/password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "변경 완료", body = ChangePasswordResponse),
        (status = 400, description = "현재 비밀번호 불일치 또는 약한 비밀번호", body = ApiErrorResponse),
        (status = 401, description = "세션 없음", body = ApiErrorResponse)
    ),
    tag = "auth"
)]
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    locale: Locale,
    AuthSession(resolved): AuthSession,
    Json(request): Json<ChangePasswordRequest>,
) -> ApiResult<Json<ChangePasswordResponse>> {
    request
        .validate()
        .map_err(|errors| ApiError::validation(&errors))?;

    if !verify_password(&request.current_password, &resolved.client.password) {
        return Err(ApiError::from_auth(AuthError::InvalidCredential, locale));
    }

    validate_password_strength(&request.new_password)
        .map_err(|reason| ApiError::bad_request("WEAK_PASSWORD", reason))?;

    let hash = hash_password(&request.new_password)
        .map_err(|e| ApiError::from_auth(AuthError::Internal(e.to_string()), locale))?;

    if !state.clients.update_password(resolved.client_id(), &hash).await? {
        warn!(client_id = %resolved.client_id(), "Client vanished during password change");
        return Err(ApiError::from_auth(AuthError::Unauthenticated, locale));
    }

    let revoked_sessions = state
        .sessions
        .delete_for_client(resolved.client_id(), Some(resolved.session_id()))
        .await?;

    info!(client_id = %resolved.client_id(), revoked_sessions, "Password changed");

    Ok(Json(ChangePasswordResponse { revoked_sessions }))
}

/// 인증 라우터 생성.
///
/// 로그인 라우트에는 rate limiter가 설정되어 있으면 적용됩니다.
pub fn auth_router(state: &AppState) -> axum::Router<Arc<AppState>> {
    let login_route = match state.login_limiter.clone() {
        Some(limiter) => post(login).layer(axum::middleware::from_fn_with_state(
            limiter,
            crate::middleware::login_rate_limit,
        )),
        None => post(login),
    };

    Router::new()
        .route("/login", login_route)
        .route("/logout", post(logout))
        .route("/me", get(me))
        .route("/password", put(change_password))
}
