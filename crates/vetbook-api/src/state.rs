//! 모든 핸들러에서 공유되는 애플리케이션 상태.
//!
//! AppState는 `Arc`로 래핑되어 라우터 상태로 주입됩니다.

use std::sync::Arc;

use axum::extract::FromRef;
use secrecy::SecretString;
use vetbook_core::AuthConfig;

use crate::auth::{SessionResolver, TokenCodec};
use crate::client_info::TrustedProxies;
use crate::middleware::RateLimiter;
use crate::repository::{ClientStore, SessionStore};

/// 애플리케이션 공유 상태.
#[derive(Clone)]
pub struct AppState {
    /// 쿠키 → 세션 확인기 (인증 게이트)
    pub resolver: SessionResolver,

    /// 세션 레코드 저장소
    pub sessions: Arc<dyn SessionStore>,

    /// 클라이언트 계정 저장소
    pub clients: Arc<dyn ClientStore>,

    /// 인증 설정 (쿠키 이름, Secure 속성 등)
    pub auth: AuthConfig,

    /// 로그인 rate limiter (비활성화 시 None)
    pub login_limiter: Option<RateLimiter>,

    /// 전달 헤더를 신뢰할 프록시 (클라이언트 IP 결정용)
    pub trusted_proxies: TrustedProxies,

    /// 저장소 종류 ("postgres" | "memory")
    pub store_backend: &'static str,

    /// 서버 시작 시간 (업타임 계산용)
    pub started_at: chrono::DateTime<chrono::Utc>,

    /// API 버전
    pub version: String,
}

impl AppState {
    /// 새로운 AppState 생성.
    ///
    /// 세션과 클라이언트 저장소는 같은 백엔드일 수도, 다를 수도 있습니다.
    pub fn new(
        auth: AuthConfig,
        sessions: Arc<dyn SessionStore>,
        clients: Arc<dyn ClientStore>,
        store_backend: &'static str,
    ) -> Self {
        let secret = SecretString::new(auth.signing_secret().into());
        let codec = TokenCodec::new(&secret, auth.token_ttl_days);
        let resolver = SessionResolver::new(
            codec,
            sessions.clone(),
            clients.clone(),
            auth.cookie_name.as_str(),
        );

        Self {
            resolver,
            sessions,
            clients,
            auth,
            login_limiter: None,
            trusted_proxies: TrustedProxies::default(),
            store_backend,
            started_at: chrono::Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// 로그인 rate limiter 설정.
    pub fn with_login_limiter(mut self, limiter: RateLimiter) -> Self {
        self.login_limiter = Some(limiter);
        self
    }

    /// 신뢰 프록시 설정.
    pub fn with_trusted_proxies(mut self, trusted: TrustedProxies) -> Self {
        self.trusted_proxies = trusted;
        self
    }

    /// 서버 업타임 (초).
    pub fn uptime_secs(&self) -> i64 {
        chrono::Utc::now()
            .signed_duration_since(self.started_at)
            .num_seconds()
    }

    /// 저장소 연결 상태 확인.
    pub async fn is_store_healthy(&self) -> bool {
        self.clients.ping().await.is_ok()
    }
}

impl FromRef<Arc<AppState>> for SessionResolver {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.resolver.clone()
    }
}

impl FromRef<Arc<AppState>> for TrustedProxies {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.trusted_proxies.clone()
    }
}

/// 인메모리 저장소로 테스트용 AppState 생성.
#[cfg(any(test, feature = "test-utils"))]
pub fn create_test_state() -> AppState {
    create_test_state_with_store().0
}

/// 테스트용 AppState와 시드용 저장소 핸들을 함께 반환.
#[cfg(any(test, feature = "test-utils"))]
pub fn create_test_state_with_store() -> (AppState, crate::repository::MemoryStore) {
    let store = crate::repository::MemoryStore::new();
    let auth = AuthConfig {
        jwt_secret: Some("test-secret-key".to_string()),
        ..AuthConfig::default()
    };

    let state = AppState::new(auth, Arc::new(store.clone()), Arc::new(store.clone()), "memory");
    (state, store)
}
