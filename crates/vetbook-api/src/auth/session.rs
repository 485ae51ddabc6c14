//! 세션 확인과 인증 게이트.
//!
//! 요청 쿠키의 토큰을 검증하고, 저장소에 같은 토큰의 세션 레코드가
//! 남아 있을 때만 세션으로 인정합니다. 토큰이 서명상 유효해도 레코드가
//! 삭제되었으면 세션이 아닙니다 (즉시 폐기).

use std::future::Future;
use std::sync::Arc;

use axum_extra::extract::CookieJar;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use vetbook_core::{Client, SessionRecord};

use super::{AuthError, TokenCodec};
use crate::metrics::record_auth_denial;
use crate::repository::{ClientStore, SessionStore, StoreError};

/// 확인된 세션과 소유 클라이언트.
#[derive(Debug, Clone)]
pub struct ResolvedSession {
    pub session: SessionRecord,
    pub client: Client,
}

impl ResolvedSession {
    pub fn session_id(&self) -> &str {
        &self.session.id
    }

    pub fn client_id(&self) -> &str {
        &self.client.id
    }
}

/// 세션 확인기.
///
/// 상태를 갖지 않으며 `Clone`은 저장소 핸들만 복제합니다.
#[derive(Clone)]
pub struct SessionResolver {
    codec: Arc<TokenCodec>,
    sessions: Arc<dyn SessionStore>,
    clients: Arc<dyn ClientStore>,
    cookie_name: Arc<str>,
}

impl std::fmt::Debug for SessionResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionResolver")
            .field("codec", &self.codec)
            .field("cookie_name", &self.cookie_name)
            .finish_non_exhaustive()
    }
}

impl SessionResolver {
    pub fn new(
        codec: TokenCodec,
        sessions: Arc<dyn SessionStore>,
        clients: Arc<dyn ClientStore>,
        cookie_name: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            codec: Arc::new(codec),
            sessions,
            clients,
            cookie_name: cookie_name.into(),
        }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// 쿠키 저장소에서 원시 토큰 추출.
    pub fn token_from(&self, jar: &CookieJar) -> Option<String> {
        jar.get(&self.cookie_name)
            .map(|c| c.value().to_string())
            .filter(|v| !v.is_empty())
    }

    /// 요청 쿠키로 세션 확인.
    ///
    /// 쿠키가 없거나 토큰이 무효하거나 레코드가 없으면 `Ok(None)`.
    /// 저장소 장애만 에러로 전파됩니다.
    pub async fn resolve_session(
        &self,
        jar: &CookieJar,
    ) -> Result<Option<ResolvedSession>, StoreError> {
        match self.token_from(jar) {
            Some(token) => self.resolve_token(&token).await,
            None => Ok(None),
        }
    }

    /// 원시 토큰으로 세션 확인.
    pub async fn resolve_token(&self, token: &str) -> Result<Option<ResolvedSession>, StoreError> {
        // 서명/만료가 무효하면 저장소를 조회하지 않음
        let Some(client_id) = self.codec.verify(token) else {
            return Ok(None);
        };

        let Some(session) = self.sessions.find_by_token(token).await? else {
            debug!(client_id = %client_id, "Valid token without session record");
            return Ok(None);
        };

        if session.client_id != client_id {
            warn!(
                session_id = %session.id,
                token_subject = %client_id,
                "Token subject does not match session owner"
            );
            return Ok(None);
        }

        let Some(client) = self.clients.find_by_id(&session.client_id).await? else {
            warn!(session_id = %session.id, client_id = %session.client_id, "Session owner not found");
            return Ok(None);
        };

        Ok(Some(ResolvedSession { session, client }))
    }

    /// 세션의 클라이언트만 반환.
    pub async fn resolve_client(&self, jar: &CookieJar) -> Result<Option<Client>, StoreError> {
        Ok(self.resolve_session(jar).await?.map(|r| r.client))
    }

    /// 마지막 활동 시각 갱신. 확인 과정은 이 값을 바꾸지 않습니다.
    pub async fn touch(&self, resolved: &ResolvedSession) -> Result<DateTime<Utc>, StoreError> {
        let now = Utc::now();
        self.sessions.touch(resolved.session_id(), now).await?;
        Ok(now)
    }

    /// 인증 게이트.
    ///
    /// 세션이 확인되면 `op`를 세션과 함께 실행하고, 아니면 `op`를 실행하지
    /// 않고 `AuthError::Unauthenticated`로 실패합니다.
    pub async fn with_session<F, Fut, T, E>(&self, jar: &CookieJar, op: F) -> Result<T, E>
    where
        F: FnOnce(ResolvedSession) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<AuthError>,
    {
        let resolved = self
            .resolve_session(jar)
            .await
            .map_err(|e| E::from(AuthError::Store(e)))?;

        match resolved {
            Some(session) => op(session).await,
            None => {
                record_auth_denial("unauthenticated");
                Err(E::from(AuthError::Unauthenticated))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use axum_extra::extract::cookie::Cookie;
    use chrono::Duration;
    use secrecy::SecretString;
    use vetbook_core::NewSession;

    use super::*;
    use crate::repository::MemoryStore;

    const COOKIE: &str = "auth_token";

    async fn setup() -> (SessionResolver, MemoryStore) {
        let store = MemoryStore::new();
        store
            .insert_client(Client::new("c1", "vet@example.com", "hash"))
            .await;
        let codec = TokenCodec::new(&SecretString::new("test-secret".into()), 30);
        let resolver = SessionResolver::new(
            codec,
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            COOKIE,
        );
        (resolver, store)
    }

    fn jar_with(token: &str) -> CookieJar {
        CookieJar::new().add(Cookie::new(COOKIE, token.to_string()))
    }

    #[tokio::test]
    async fn test_no_cookie_resolves_none() {
        let (resolver, _) = setup().await;
        assert!(resolver.resolve_session(&CookieJar::new()).await.unwrap().is_none());
        assert!(resolver.resolve_client(&CookieJar::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_issue_store_resolve() {
        let (resolver, store) = setup().await;
        let token = resolver.codec().issue("c1").unwrap();
        let stored = store.create(NewSession::new("c1", token.clone())).await.unwrap();

        let resolved = resolver
            .resolve_session(&jar_with(&token))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(resolved.client_id(), "c1");
        assert_eq!(resolved.session_id(), stored.id);
    }

    #[tokio::test]
    async fn test_deleted_session_is_revoked() {
        let (resolver, store) = setup().await;
        let token = resolver.codec().issue("c1").unwrap();
        let stored = store.create(NewSession::new("c1", token.clone())).await.unwrap();
        store.delete(&stored.id).await.unwrap();

        assert!(resolver.codec().verify(&token).is_some());
        assert!(resolver.resolve_session(&jar_with(&token)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_token_with_record_is_none() {
        let (resolver, store) = setup().await;
        let token = resolver
            .codec()
            .issue_with_ttl("c1", Duration::seconds(-10))
            .unwrap();
        store.create(NewSession::new("c1", token.clone())).await.unwrap();

        assert!(resolver.resolve_session(&jar_with(&token)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_subject_mismatch_is_none() {
        let (resolver, store) = setup().await;
        let token = resolver.codec().issue("someone-else").unwrap();
        store.create(NewSession::new("c1", token.clone())).await.unwrap();

        assert!(resolver.resolve_session(&jar_with(&token)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_resolve_does_not_touch() {
        let (resolver, store) = setup().await;
        let token = resolver.codec().issue("c1").unwrap();
        let stored = store.create(NewSession::new("c1", token.clone())).await.unwrap();

        let resolved = resolver
            .resolve_session(&jar_with(&token))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(resolved.session.last_active, stored.last_active);

        let touched_at = resolver.touch(&resolved).await.unwrap();
        let after = SessionStore::find_by_id(&store, &stored.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(after.last_active, touched_at);
    }

    #[tokio::test]
    async fn test_gate_skips_operation_without_session() {
        let (resolver, _) = setup().await;
        let ran = AtomicBool::new(false);

        let result: Result<(), AuthError> = resolver
            .with_session(&jar_with("garbage"), |_| async {
                ran.store(true, Ordering::SeqCst);
                Ok(())
            })
            .await;

        assert!(matches!(result, Err(AuthError::Unauthenticated)));
        assert!(!ran.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_gate_injects_session() {
        let (resolver, store) = setup().await;
        let token = resolver.codec().issue("c1").unwrap();
        store.create(NewSession::new("c1", token.clone())).await.unwrap();

        let client_id: Result<String, AuthError> = resolver
            .with_session(&jar_with(&token), |resolved| async move {
                Ok(resolved.client.id)
            })
            .await;

        assert_eq!(client_id.unwrap(), "c1");
    }
}
