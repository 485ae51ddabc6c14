//! 영속 세션 레코드.
//!
//! 원시 토큰 문자열을 클라이언트에 연결하고, 기기/브라우저/위치 메타데이터와
//! 마지막 활동 시각을 함께 보관합니다. 한 클라이언트가 여러 세션을 동시에
//! 가질 수 있으며 (멀티 디바이스), 세션 삭제는 토큰 만료와 무관하게 즉시
//! 접근을 회수합니다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::device::DeviceInfo;

/// 세션 레코드.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::FromRow))]
pub struct SessionRecord {
    pub id: String,
    pub client_id: String,
    /// 원시 토큰 (응답에는 포함되지 않음)
    #[serde(skip_serializing, default)]
    pub token: String,
    pub device: Option<String>,
    pub browser: Option<String>,
    pub os: Option<String>,
    pub ip_address: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub last_active: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl SessionRecord {
    /// 입력값으로부터 레코드 생성 (저장소 구현용).
    pub fn from_new(id: impl Into<String>, input: NewSession) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            client_id: input.client_id,
            token: input.token,
            device: input.device.device,
            browser: input.device.browser,
            os: input.device.os,
            ip_address: input.device.ip_address,
            country: input.device.country,
            city: input.device.city,
            last_active: now,
            created_at: now,
        }
    }
}

/// 새 세션 입력.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub client_id: String,
    pub token: String,
    pub device: DeviceInfo,
}

impl NewSession {
    pub fn new(client_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            token: token.into(),
            device: DeviceInfo::default(),
        }
    }

    pub fn with_device(mut self, device: DeviceInfo) -> Self {
        self.device = device;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_new_copies_metadata() {
        let device = DeviceInfo {
            device: Some("mobile".to_string()),
            browser: Some("Safari".to_string()),
            country: Some("KR".to_string()),
            ..Default::default()
        };
        let record = SessionRecord::from_new("s1", NewSession::new("c1", "tok").with_device(device));

        assert_eq!(record.id, "s1");
        assert_eq!(record.client_id, "c1");
        assert_eq!(record.token, "tok");
        assert_eq!(record.device.as_deref(), Some("mobile"));
        assert_eq!(record.country.as_deref(), Some("KR"));
        assert_eq!(record.last_active, record.created_at);
    }

    #[test]
    fn test_token_not_serialized() {
        let record = SessionRecord::from_new("s1", NewSession::new("c1", "raw-token-value"));
        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("raw-token-value"));
    }
}
