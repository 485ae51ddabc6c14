//! 클라이언트 역할.
//!
//! 관리자 기능 접근을 제어하는 권한 레이블을 정의합니다.
//! 역할 간 계층은 없습니다. `Superadmin`이라도 `Admin`을 암묵적으로 포함하지 않으며,
//! 허용 역할은 항상 명시적으로 나열해야 합니다.

use serde::{Deserialize, Serialize};

/// 클라이언트 역할.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// 관리자 - 클라이언트 및 세션 관리
    Admin,
    /// 최고 관리자 - 권한 부여 포함
    Superadmin,
    /// 모더레이터 - 작업 검수 및 세션 종료
    Moderator,
}

impl Role {
    /// 모든 역할 목록.
    pub const ALL: [Role; 3] = [Role::Admin, Role::Superadmin, Role::Moderator];

    /// 저장소/와이어 표현.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Superadmin => "SUPERADMIN",
            Role::Moderator => "MODERATOR",
        }
    }

    /// 문자열에서 역할 파싱 (대소문자 무시).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Some(Role::Admin),
            "SUPERADMIN" => Some(Role::Superadmin),
            "MODERATOR" => Some(Role::Moderator),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 보유 역할 중 하나라도 허용 목록에 있는지 확인.
///
/// 순수한 집합 교차 검사입니다. 허용 목록이 비어 있으면 항상 거부합니다.
pub fn has_any_role(held: &[Role], allowed: &[Role]) -> bool {
    held.iter().any(|role| allowed.contains(role))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("ADMIN"), Some(Role::Admin));
        assert_eq!(Role::parse("superadmin"), Some(Role::Superadmin));
        assert_eq!(Role::parse(" Moderator "), Some(Role::Moderator));
        assert_eq!(Role::parse("owner"), None);
    }

    #[test]
    fn test_role_serialization() {
        let json = serde_json::to_string(&Role::Superadmin).unwrap();
        assert_eq!(json, "\"SUPERADMIN\"");

        let parsed: Role = serde_json::from_str("\"MODERATOR\"").unwrap();
        assert_eq!(parsed, Role::Moderator);
    }

    #[test]
    fn test_has_any_role_without_hierarchy() {
        let admin_only = [Role::Admin];
        assert!(has_any_role(&[Role::Admin], &admin_only));
        // Superadmin은 Admin을 포함하지 않음
        assert!(!has_any_role(&[Role::Superadmin], &admin_only));
        assert!(!has_any_role(&[Role::Moderator], &[Role::Admin, Role::Superadmin]));
        assert!(has_any_role(
            &[Role::Moderator, Role::Admin],
            &[Role::Admin, Role::Superadmin]
        ));
    }

    proptest::proptest! {
        #[test]
        fn prop_parse_ignores_case(idx in 0usize..3, upper in proptest::bool::ANY) {
            let role = Role::ALL[idx];
            let text = if upper {
                role.as_str().to_string()
            } else {
                role.as_str().to_lowercase()
            };
            proptest::prop_assert_eq!(Role::parse(&text), Some(role));
        }
    }

    #[test]
    fn test_empty_sets_deny() {
        assert!(!has_any_role(&[], &[Role::Admin]));
        assert!(!has_any_role(&Role::ALL, &[]));
    }
}
