//! 내 세션 관리 endpoint.
//!
//! 로그인된 클라이언트가 자신의 세션(기기) 목록을 보고 개별 세션을
//! 종료할 수 있습니다.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;
use vetbook_core::SessionRecord;

use crate::auth::AuthSession;
use crate::error::{ApiError, ApiErrorResponse, ApiResult};
use crate::state::AppState;

/// 세션 응답 항목. 토큰은 포함하지 않습니다.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionView {
    pub id: String,
    pub client_id: String,
    pub device: Option<String>,
    pub browser: Option<String>,
    pub os: Option<String>,
    pub ip_address: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub last_active: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    /// 요청을 보낸 세션인지 여부
    pub current: bool,
}

impl SessionView {
    pub fn from_record(record: SessionRecord, current_id: Option<&str>) -> Self {
        Self {
            current: current_id == Some(record.id.as_str()),
            id: record.id,
            client_id: record.client_id,
            device: record.device,
            browser: record.browser,
            os: record.os,
            ip_address: record.ip_address,
            country: record.country,
            city: record.city,
            last_active: record.last_active,
            created_at: record.created_at,
        }
    }
}

/// 세션 목록 응답.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionsListResponse {
    pub sessions: Vec<SessionView>,
    pub total: usize,
}

impl SessionsListResponse {
    pub fn new(records: Vec<SessionRecord>, current_id: Option<&str>) -> Self {
        let sessions: Vec<SessionView> = records
            .into_iter()
            .map(|r| SessionView::from_record(r, current_id))
            .collect();
        Self {
            total: sessions.len(),
            sessions,
        }
    }
}

/// 활동 갱신 응답.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ActivityResponse {
    pub last_active: DateTime<Utc>,
}

/// 내 세션 목록 (최근 활동순).
#[utoipa::path(
    get,
    path = "/api/v1/sessions",
    responses(
        (status = 200, description = "세션 목록", body = SessionsListResponse),
        (status = 401, description = "세션 없음", body = ApiErrorResponse)
    ),
    tag = "sessions"
)]
pub async fn list_sessions(
    State(state): State<Arc<AppState>>,
    AuthSession(resolved): AuthSession,
) -> ApiResult<Json<SessionsListResponse>> {
    let records = state.sessions.list_for_client(resolved.client_id()).await?;
    Ok(Json(SessionsListResponse::new(records, Some(resolved.session_id()))))
}

/// 현재 세션의 마지막 활동 시각 갱신.
///
/// 세션 확인은 이 값을 바꾸지 않으므로 클라이언트가 명시적으로 호출합니다.
#[utoipa::path(
    post,
    path = "/api/v1/sessions/activity",
    responses(
        (status = 200, description = "갱신 완료", body = ActivityResponse),
        (status = 401, description = "세션 없음", body = ApiErrorResponse)
    ),
    tag = "sessions"
)]
pub async fn record_activity(
    State(state): State<Arc<AppState>>,
    AuthSession(resolved): AuthSession,
) -> ApiResult<Json<ActivityResponse>> {
    let last_active = state.resolver.touch(&resolved).await?;
    Ok(Json(ActivityResponse { last_active }))
}

/// 내 세션 하나 종료.
///
/// 다른 클라이언트의 세션 ID는 존재 여부를 드러내지 않고 404로 응답합니다.
#[utoipa::path(
    delete,
    path = "/api/v1/sessions/{id}",
    params(("id" = String, Path, description = "세션 ID")),
    responses(
        (status = 204, description = "종료 완료"),
        (status = 401, description = "세션 없음", body = ApiErrorResponse),
        (status = 404, description = "세션을 찾을 수 없음", body = ApiErrorResponse)
    ),
    tag = "sessions"
)]
pub async fn terminate_session(
    State(state): State<Arc<AppState>>,
    AuthSession(resolved): AuthSession,
    Path(session_id): Path<String>,
) -> ApiResult<StatusCode> {
    let owned = state
        .sessions
        .find_by_id(&session_id)
        .await?
        .filter(|s| s.client_id == resolved.client_id());

    if owned.is_none() {
        return Err(ApiError::not_found("Session not found"));
    }

    state.sessions.delete(&session_id).await?;
    info!(client_id = %resolved.client_id(), session_id = %session_id, "Session terminated by owner");

    Ok(StatusCode::NO_CONTENT)
}

/// 세션 라우터 생성.
pub fn sessions_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_sessions))
        .route("/activity", post(record_activity))
        .route("/{id}", delete(terminate_session))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{MemoryStore, SessionStore};
    use crate::state::create_test_state_with_store;
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;
    use vetbook_core::{Client, NewSession};

    struct Fixture {
        router: Router,
        store: MemoryStore,
        token: String,
        session_id: String,
    }

    async fn setup() -> Fixture {
        let (state, store) = create_test_state_with_store();
        store.insert_client(Client::new("c1", "a@example.com", "h")).await;
        store.insert_client(Client::new("c2", "b@example.com", "h")).await;

        let token = state.resolver.codec().issue("c1").unwrap();
        let session = store.create(NewSession::new("c1", token.clone())).await.unwrap();

        Fixture {
            router: Router::new()
                .nest("/sessions", sessions_router())
                .with_state(Arc::new(state)),
            store,
            token,
            session_id: session.id,
        }
    }

    fn request(method: &str, uri: &str, token: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("cookie", format!("auth_token={}", token))
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_list_flags_current() {
        let f = setup().await;
        f.store.create(NewSession::new("c1", "other-device")).await.unwrap();
        f.store.create(NewSession::new("c2", "someone-else")).await.unwrap();

        let response = f.router.oneshot(request("GET", "/sessions", &f.token)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let list: SessionsListResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(list.total, 2);
        assert_eq!(list.sessions.iter().filter(|s| s.current).count(), 1);
        assert!(list.sessions.iter().all(|s| s.client_id == "c1"));

        let raw = String::from_utf8(body.to_vec()).unwrap();
        assert!(!raw.contains(&f.token));
    }

    #[tokio::test]
    async fn test_activity_updates_last_active() {
        let f = setup().await;
        let before = SessionStore::find_by_id(&f.store, &f.session_id)
            .await
            .unwrap()
            .unwrap()
            .last_active;

        let response = f
            .router
            .oneshot(request("POST", "/sessions/activity", &f.token))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let after = SessionStore::find_by_id(&f.store, &f.session_id)
            .await
            .unwrap()
            .unwrap()
            .last_active;
        assert!(after >= before);
    }

    #[tokio::test]
    async fn test_cannot_terminate_foreign_session() {
        let f = setup().await;
        let foreign = f.store.create(NewSession::new("c2", "foreign")).await.unwrap();

        let response = f
            .router
            .clone()
            .oneshot(request("DELETE", &format!("/sessions/{}", foreign.id), &f.token))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(SessionStore::find_by_id(&f.store, &foreign.id).await.unwrap().is_some());

        let missing = f
            .router
            .oneshot(request("DELETE", "/sessions/does-not-exist", &f.token))
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_terminate_own_session() {
        let f = setup().await;
        let other = f.store.create(NewSession::new("c1", "laptop")).await.unwrap();

        let response = f
            .router
            .oneshot(request("DELETE", &format!("/sessions/{}", other.id), &f.token))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(SessionStore::find_by_id(&f.store, &other.id).await.unwrap().is_none());
    }
}
