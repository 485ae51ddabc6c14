//! 클라이언트 계정.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::role::{has_any_role, Role};

/// 클라이언트 계정 엔티티.
///
/// `password`는 argon2 PHC 해시이며 평문은 저장되지 않습니다.
/// 직렬화 시 해시는 제외됩니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(skip_serializing, default)]
    pub password: String,
    #[serde(default)]
    pub permissions: Vec<Role>,
    pub created_at: DateTime<Utc>,
}

impl Client {
    /// 새 클라이언트 생성 (권한 없음).
    pub fn new(
        id: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            name: None,
            password: password_hash.into(),
            permissions: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// 권한 설정.
    pub fn with_permissions(mut self, permissions: impl IntoIterator<Item = Role>) -> Self {
        self.permissions = permissions.into_iter().collect();
        self
    }

    /// 이름 설정.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// 허용 역할 중 하나라도 보유하는지 확인.
    pub fn has_any_role(&self, allowed: &[Role]) -> bool {
        has_any_role(&self.permissions, allowed)
    }

    /// 공개 프로필로 변환.
    pub fn profile(&self) -> ClientProfile {
        ClientProfile::from(self)
    }
}

/// 응답용 클라이언트 프로필.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct ClientProfile {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub permissions: Vec<Role>,
    pub created_at: DateTime<Utc>,
}

impl From<&Client> for ClientProfile {
    fn from(client: &Client) -> Self {
        Self {
            id: client.id.clone(),
            email: client.email.clone(),
            name: client.name.clone(),
            permissions: client.permissions.clone(),
            created_at: client.created_at,
        }
    }
}
