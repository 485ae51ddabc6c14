//! 인메모리 저장소.
//!
//! 데이터베이스 없이 실행하는 개발 모드와 테스트에서 사용합니다.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use vetbook_core::{Client, NewSession, Role, SessionRecord};

use super::{ClientStore, SessionStore, StoreError};

#[derive(Default)]
struct Inner {
    clients: HashMap<String, Client>,
    sessions: HashMap<String, SessionRecord>,
}

/// `RwLock<HashMap>` 기반 저장소. `Clone`은 같은 데이터를 공유합니다.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 클라이언트 추가 (같은 ID는 덮어씀).
    pub async fn insert_client(&self, client: Client) {
        self.inner
            .write()
            .await
            .clients
            .insert(client.id.clone(), client);
    }

    /// 저장된 세션 수.
    pub async fn session_count(&self) -> usize {
        self.inner.read().await.sessions.len()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn find_by_token(&self, token: &str) -> Result<Option<SessionRecord>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.sessions.values().find(|s| s.token == token).cloned())
    }

    async fn find_by_id(&self, session_id: &str) -> Result<Option<SessionRecord>, StoreError> {
        Ok(self.inner.read().await.sessions.get(session_id).cloned())
    }

    async fn create(&self, input: NewSession) -> Result<SessionRecord, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.sessions.values().any(|s| s.token == input.token) {
            return Err(StoreError::Conflict("session token already exists".to_string()));
        }

        let record = SessionRecord::from_new(uuid::Uuid::new_v4().to_string(), input);
        inner.sessions.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn touch(&self, session_id: &str, at: DateTime<Utc>) -> Result<(), StoreError> {
        if let Some(session) = self.inner.write().await.sessions.get_mut(session_id) {
            session.last_active = at;
        }
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> Result<bool, StoreError> {
        Ok(self.inner.write().await.sessions.remove(session_id).is_some())
    }

    async fn list_for_client(&self, client_id: &str) -> Result<Vec<SessionRecord>, StoreError> {
        let inner = self.inner.read().await;
        let mut sessions: Vec<SessionRecord> = inner
            .sessions
            .values()
            .filter(|s| s.client_id == client_id)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.last_active.cmp(&a.last_active));
        Ok(sessions)
    }

    async fn delete_for_client(
        &self,
        client_id: &str,
        except: Option<&str>,
    ) -> Result<u64, StoreError> {
        let mut inner = self.inner.write().await;
        let before = inner.sessions.len();
        inner
            .sessions
            .retain(|id, s| s.client_id != client_id || Some(id.as_str()) == except);
        Ok((before - inner.sessions.len()) as u64)
    }
}

#[async_trait]
impl ClientStore for MemoryStore {
    async fn find_by_id(&self, client_id: &str) -> Result<Option<Client>, StoreError> {
        Ok(self.inner.read().await.clients.get(client_id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Client>, StoreError> {
        // PostgreSQL의 LOWER()와 같은 유니코드 소문자 비교
        let email = email.trim().to_lowercase();
        let inner = self.inner.read().await;
        Ok(inner
            .clients
            .values()
            .find(|c| c.email.to_lowercase() == email)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<Client>, StoreError> {
        let mut clients: Vec<Client> = self.inner.read().await.clients.values().cloned().collect();
        clients.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(clients)
    }

    async fn update_password(&self, client_id: &str, hash: &str) -> Result<bool, StoreError> {
        match self.inner.write().await.clients.get_mut(client_id) {
            Some(client) => {
                client.password = hash.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_permissions(&self, client_id: &str, roles: &[Role]) -> Result<bool, StoreError> {
        match self.inner.write().await.clients.get_mut(client_id) {
            Some(client) => {
                client.permissions = roles.to_vec();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_create_and_find_by_token() {
        let store = MemoryStore::new();
        let created = store.create(NewSession::new("c1", "tok-1")).await.unwrap();

        let found = store.find_by_token("tok-1").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert!(store.find_by_token("tok-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_by_email_folds_unicode_case() {
        let store = MemoryStore::new();
        store
            .insert_client(Client::new("c1", "Ärztin@Tierklinik.de", "hash"))
            .await;

        let found = store.find_by_email("  ärztin@tierklinik.DE ").await.unwrap();
        assert_eq!(found.map(|c| c.id).as_deref(), Some("c1"));
        assert!(store.find_by_email("arztin@tierklinik.de").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_token_conflicts() {
        let store = MemoryStore::new();
        store.create(NewSession::new("c1", "tok")).await.unwrap();

        let result = store.create(NewSession::new("c2", "tok")).await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_touch_and_ordering() {
        let store = MemoryStore::new();
        let first = store.create(NewSession::new("c1", "a")).await.unwrap();
        let second = store.create(NewSession::new("c1", "b")).await.unwrap();
        store.create(NewSession::new("c2", "c")).await.unwrap();

        store
            .touch(&first.id, Utc::now() + Duration::minutes(5))
            .await
            .unwrap();

        let sessions = store.list_for_client("c1").await.unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].id, first.id);
        assert_eq!(sessions[1].id, second.id);
    }

    #[tokio::test]
    async fn test_delete_for_client_keeps_exception() {
        let store = MemoryStore::new();
        let keep = store.create(NewSession::new("c1", "a")).await.unwrap();
        store.create(NewSession::new("c1", "b")).await.unwrap();
        store.create(NewSession::new("c2", "c")).await.unwrap();

        let removed = store.delete_for_client("c1", Some(&keep.id)).await.unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.session_count().await, 2);
        assert!(SessionStore::find_by_id(&store, &keep.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_client_lookup_and_updates() {
        let store = MemoryStore::new();
        store
            .insert_client(Client::new("c1", "Vet@Example.com", "old-hash"))
            .await;

        let found = store.find_by_email("vet@example.COM ").await.unwrap().unwrap();
        assert_eq!(found.id, "c1");

        assert!(store.update_password("c1", "new-hash").await.unwrap());
        assert!(store.set_permissions("c1", &[Role::Admin]).await.unwrap());
        assert!(!store.set_permissions("missing", &[Role::Admin]).await.unwrap());

        let client = ClientStore::find_by_id(&store, "c1").await.unwrap().unwrap();
        assert_eq!(client.password, "new-hash");
        assert_eq!(client.permissions, vec![Role::Admin]);
    }
}
