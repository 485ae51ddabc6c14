//! 세션/클라이언트 저장소.
//!
//! 인증 경계가 소비하는 저장소 인터페이스를 trait로 정의하고,
//! PostgreSQL(`PgStore`)과 인메모리(`MemoryStore`) 구현을 제공합니다.
//! 모든 연산은 단일 지점 연산이며 여러 연산에 걸친 트랜잭션은 없습니다.

pub mod clients;
pub mod memory;
pub mod postgres;
pub mod sessions;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use vetbook_core::{Client, NewSession, Role, SessionRecord};

pub use clients::ClientRepository;
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use sessions::SessionRepository;

/// 저장소 에러.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("데이터베이스 에러: {0}")]
    Database(#[from] sqlx::Error),
    #[error("중복 데이터: {0}")]
    Conflict(String),
    #[error("마이그레이션 실패: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// 세션 레코드 저장소.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// 원시 토큰 문자열로 정확히 일치하는 세션 조회.
    async fn find_by_token(&self, token: &str) -> Result<Option<SessionRecord>, StoreError>;

    /// ID로 세션 조회.
    async fn find_by_id(&self, session_id: &str) -> Result<Option<SessionRecord>, StoreError>;

    /// 세션 생성. 토큰이 이미 존재하면 `StoreError::Conflict`.
    async fn create(&self, input: NewSession) -> Result<SessionRecord, StoreError>;

    /// 마지막 활동 시각 갱신 (last-write-wins).
    async fn touch(&self, session_id: &str, at: DateTime<Utc>) -> Result<(), StoreError>;

    /// 세션 삭제. 삭제되었으면 `true`.
    async fn delete(&self, session_id: &str) -> Result<bool, StoreError>;

    /// 클라이언트의 세션 목록 (최근 활동순).
    async fn list_for_client(&self, client_id: &str) -> Result<Vec<SessionRecord>, StoreError>;

    /// 클라이언트의 모든 세션 삭제. `except`로 지정한 세션은 유지합니다.
    async fn delete_for_client(
        &self,
        client_id: &str,
        except: Option<&str>,
    ) -> Result<u64, StoreError>;
}

/// 클라이언트 계정 저장소.
#[async_trait]
pub trait ClientStore: Send + Sync {
    async fn find_by_id(&self, client_id: &str) -> Result<Option<Client>, StoreError>;

    /// 이메일로 조회 (대소문자 무시).
    async fn find_by_email(&self, email: &str) -> Result<Option<Client>, StoreError>;

    /// 전체 클라이언트 목록 (가입순).
    async fn list(&self) -> Result<Vec<Client>, StoreError>;

    /// 비밀번호 해시 교체. 대상이 있으면 `true`.
    async fn update_password(&self, client_id: &str, hash: &str) -> Result<bool, StoreError>;

    /// 권한 집합 교체. 대상이 있으면 `true`.
    async fn set_permissions(&self, client_id: &str, roles: &[Role]) -> Result<bool, StoreError>;

    /// 저장소 연결 확인 (readiness probe).
    async fn ping(&self) -> Result<(), StoreError>;
}
