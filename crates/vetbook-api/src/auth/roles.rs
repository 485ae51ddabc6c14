//! 역할 기반 접근 제어.
//!
//! 역할 사이에 상속 관계는 없습니다. `SUPERADMIN`이라도 허용 목록에
//! 없으면 거부되므로 각 capability가 허용 역할을 모두 나열합니다.

use tracing::debug;
use vetbook_core::{has_any_role, Client, Role};

use super::AuthError;

/// 핸들러가 요구하는 권한 선언.
///
/// ```rust,ignore
/// async fn list_clients(Authorized(session, ..): Authorized<ManageClients>) { ... }
/// ```
pub trait Capability: Send + Sync + 'static {
    /// 로그/메트릭용 이름
    const NAME: &'static str;
    /// 허용 역할 목록
    const ALLOWED: &'static [Role];
}

/// 클라이언트 목록 조회와 전체 세션 일괄 종료.
#[derive(Debug, Clone, Copy)]
pub struct ManageClients;

impl Capability for ManageClients {
    const NAME: &'static str = "manage_clients";
    const ALLOWED: &'static [Role] = &[Role::Admin, Role::Superadmin];
}

/// 다른 클라이언트의 세션 조회/종료.
#[derive(Debug, Clone, Copy)]
pub struct ModerateSessions;

impl Capability for ModerateSessions {
    const NAME: &'static str = "moderate_sessions";
    const ALLOWED: &'static [Role] = &[Role::Admin, Role::Superadmin, Role::Moderator];
}

/// 역할 부여.
#[derive(Debug, Clone, Copy)]
pub struct GrantPermissions;

impl Capability for GrantPermissions {
    const NAME: &'static str = "grant_permissions";
    const ALLOWED: &'static [Role] = &[Role::Superadmin];
}

/// 클라이언트가 허용 역할 중 하나라도 가지고 있는지 확인.
pub fn check_permission(client: &Client, allowed: &[Role]) -> Result<(), AuthError> {
    if has_any_role(&client.permissions, allowed) {
        Ok(())
    } else {
        debug!(client_id = %client.id, ?allowed, "Permission denied");
        Err(AuthError::Unauthorized)
    }
}

/// `Capability` 타입으로 권한 확인.
pub fn require<C: Capability>(client: &Client) -> Result<(), AuthError> {
    check_permission(client, C::ALLOWED)
}
