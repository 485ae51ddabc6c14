//! PostgreSQL 저장소.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use tracing::info;
use vetbook_core::{Client, DatabaseConfig, NewSession, Role, SessionRecord};

use super::{ClientRepository, ClientStore, SessionRepository, SessionStore, StoreError};

/// `sessions`/`clients` 테이블 기반 저장소.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 설정으로 연결 풀 생성.
    pub async fn connect(url: &str, config: &DatabaseConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect(url)
            .await?;

        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// `migrations/` 디렉터리의 마이그레이션 실행.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        info!("Running database migrations...");
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        info!("Migrations completed successfully");
        Ok(())
    }
}

/// 고유 제약 위반은 `Conflict`로 변환.
fn map_insert_error(e: sqlx::Error) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::Conflict(db.message().to_string())
        }
        _ => StoreError::Database(e),
    }
}

#[async_trait]
impl SessionStore for PgStore {
    async fn find_by_token(&self, token: &str) -> Result<Option<SessionRecord>, StoreError> {
        Ok(SessionRepository::find_by_token(&self.pool, token).await?)
    }

    async fn find_by_id(&self, session_id: &str) -> Result<Option<SessionRecord>, StoreError> {
        Ok(SessionRepository::find_by_id(&self.pool, session_id).await?)
    }

    async fn create(&self, input: NewSession) -> Result<SessionRecord, StoreError> {
        let id = uuid::Uuid::new_v4().to_string();
        SessionRepository::create(&self.pool, &id, &input)
            .await
            .map_err(map_insert_error)
    }

    async fn touch(&self, session_id: &str, at: DateTime<Utc>) -> Result<(), StoreError> {
        Ok(SessionRepository::touch(&self.pool, session_id, at).await?)
    }

    async fn delete(&self, session_id: &str) -> Result<bool, StoreError> {
        Ok(SessionRepository::delete(&self.pool, session_id).await?)
    }

    async fn list_for_client(&self, client_id: &str) -> Result<Vec<SessionRecord>, StoreError> {
        Ok(SessionRepository::list_for_client(&self.pool, client_id).await?)
    }

    async fn delete_for_client(
        &self,
        client_id: &str,
        except: Option<&str>,
    ) -> Result<u64, StoreError> {
        Ok(SessionRepository::delete_for_client(&self.pool, client_id, except).await?)
    }
}

#[async_trait]
impl ClientStore for PgStore {
    async fn find_by_id(&self, client_id: &str) -> Result<Option<Client>, StoreError> {
        Ok(ClientRepository::find_by_id(&self.pool, client_id).await?)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Client>, StoreError> {
        Ok(ClientRepository::find_by_email(&self.pool, email).await?)
    }

    async fn list(&self) -> Result<Vec<Client>, StoreError> {
        Ok(ClientRepository::list(&self.pool).await?)
    }

    async fn update_password(&self, client_id: &str, hash: &str) -> Result<bool, StoreError> {
        Ok(ClientRepository::update_password(&self.pool, client_id, hash).await?)
    }

    async fn set_permissions(&self, client_id: &str, roles: &[Role]) -> Result<bool, StoreError> {
        Ok(ClientRepository::set_permissions(&self.pool, client_id, roles).await?)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
