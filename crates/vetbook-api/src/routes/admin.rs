//! 관리자 endpoint.
//!
//! 각 핸들러는 `Authorized<C>` 추출기로 필요한 역할을 선언하며, 권한 확인은
//! 데이터 조회/변경 전에 끝납니다.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;
use vetbook_core::{ClientProfile, Role};

use super::sessions::SessionsListResponse;
use crate::auth::{Authorized, GrantPermissions, ManageClients, ModerateSessions};
use crate::error::{ApiError, ApiErrorResponse, ApiResult};
use crate::state::AppState;

/// 클라이언트 목록 응답.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ClientsListResponse {
    pub clients: Vec<ClientProfile>,
    pub total: usize,
}

/// 일괄 세션 종료 응답.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RevokeSessionsResponse {
    pub revoked_sessions: u64,
}

/// 권한 변경 요청. 목록 전체로 교체합니다.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SetPermissionsRequest {
    pub permissions: Vec<Role>,
}

/// 전체 클라이언트 목록.
#[utoipa::path(
    get,
    path = "/api/v1/admin/clients",
    responses(
        (status = 200, description = "클라이언트 목록", body = ClientsListResponse),
        (status = 401, description = "세션 없음", body = ApiErrorResponse),
        (status = 403, description = "권한 없음", body = ApiErrorResponse)
    ),
    tag = "admin"
)]
pub async fn list_clients(
    State(state): State<Arc<AppState>>,
    _auth: Authorized<ManageClients>,
) -> ApiResult<Json<ClientsListResponse>> {
    let clients: Vec<ClientProfile> = state
        .clients
        .list()
        .await?
        .iter()
        .map(ClientProfile::from)
        .collect();

    Ok(Json(ClientsListResponse {
        total: clients.len(),
        clients,
    }))
}

/// 특정 클라이언트의 세션 목록.
#[utoipa::path(
    get,
    path = "/api/v1/admin/clients/{id}/sessions",
    params(("id" = String, Path, description = "클라이언트 ID")),
    responses(
        (status = 200, description = "세션 목록", body = SessionsListResponse),
        (status = 403, description = "권한 없음", body = ApiErrorResponse),
        (status = 404, description = "클라이언트 없음", body = ApiErrorResponse)
    ),
    tag = "admin"
)]
pub async fn client_sessions(
    State(state): State<Arc<AppState>>,
    Authorized(resolved, _): Authorized<ModerateSessions>,
    Path(client_id): Path<String>,
) -> ApiResult<Json<SessionsListResponse>> {
    if state.clients.find_by_id(&client_id).await?.is_none() {
        return Err(ApiError::not_found("Client not found"));
    }

    let records = state.sessions.list_for_client(&client_id).await?;
    Ok(Json(SessionsListResponse::new(records, Some(resolved.session_id()))))
}

/// 임의 세션 강제 종료.
#[utoipa::path(
    delete,
    path = "/api/v1/admin/sessions/{id}",
    params(("id" = String, Path, description = "세션 ID")),
    responses(
        (status = 204, description = "종료 완료"),
        (status = 403, description = "권한 없음", body = ApiErrorResponse),
        (status = 404, description = "세션 없음", body = ApiErrorResponse)
    ),
    tag = "admin"
)]
pub async fn terminate_any_session(
    State(state): State<Arc<AppState>>,
    Authorized(resolved, _): Authorized<ModerateSessions>,
    Path(session_id): Path<String>,
) -> ApiResult<StatusCode> {
    if !state.sessions.delete(&session_id).await? {
        return Err(ApiError::not_found("Session not found"));
    }

    info!(
        moderator_id = %resolved.client_id(),
        session_id = %session_id,
        "Session terminated by moderator"
    );
    Ok(StatusCode::NO_CONTENT)
}

/// 클라이언트의 모든 세션 종료.
#[utoipa::path(
    delete,
    path = "/api/v1/admin/clients/{id}/sessions",
    params(("id" = String, Path, description = "클라이언트 ID")),
    responses(
        (status = 200, description = "종료 완료", body = RevokeSessionsResponse),
        (status = 403, description = "권한 없음", body = ApiErrorResponse),
        (status = 404, description = "클라이언트 없음", body = ApiErrorResponse)
    ),
    tag = "admin"
)]
pub async fn revoke_client_sessions(
    State(state): State<Arc<AppState>>,
    Authorized(resolved, _): Authorized<ManageClients>,
    Path(client_id): Path<String>,
) -> ApiResult<Json<RevokeSessionsResponse>> {
    if state.clients.find_by_id(&client_id).await?.is_none() {
        return Err(ApiError::not_found("Client not found"));
    }

    let revoked_sessions = state.sessions.delete_for_client(&client_id, None).await?;
    info!(
        admin_id = %resolved.client_id(),
        client_id = %client_id,
        revoked_sessions,
        "All client sessions revoked"
    );

    Ok(Json(RevokeSessionsResponse { revoked_sessions }))
}

/// 클라이언트 권한 교체.
#[utoipa::path(
    put,
    path = "/api/v1/admin/clients/{id}/permissions",
    params(("id" = String, Path, description = "클라이언트 ID")),
    request_body = SetPermissionsRequest,
    responses(
        (status = 200, description = "변경된 프로필", body = ClientProfile),
        (status = 403, description = "권한 없음", body = ApiErrorResponse),
        (status = 404, description = "클라이언트 없음", body = ApiErrorResponse)
    ),
    tag = "admin"
)]
pub async fn set_permissions(
    State(state): State<Arc<AppState>>,
    Authorized(resolved, _): Authorized<GrantPermissions>,
    Path(client_id): Path<String>,
    Json(request): Json<SetPermissionsRequest>,
) -> ApiResult<Json<ClientProfile>> {
    let mut roles = request.permissions;
    roles.sort_by_key(|r| r.as_str());
    roles.dedup();

    if !state.clients.set_permissions(&client_id, &roles).await? {
        return Err(ApiError::not_found("Client not found"));
    }

    info!(
        granted_by = %resolved.client_id(),
        client_id = %client_id,
        permissions = ?roles,
        "Client permissions updated"
    );

    let client = state
        .clients
        .find_by_id(&client_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Client not found"))?;
    Ok(Json(client.profile()))
}

/// 관리자 라우터 생성.
pub fn admin_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/clients", get(list_clients))
        .route(
            "/clients/{id}/sessions",
            get(client_sessions).delete(revoke_client_sessions),
        )
        .route("/clients/{id}/permissions", put(set_permissions))
        .route("/sessions/{id}", delete(terminate_any_session))
}
