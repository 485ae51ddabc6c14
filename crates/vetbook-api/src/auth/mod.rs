//! 인증 및 권한 부여.
//!
//! 쿠키에 담긴 JWT와 저장소의 세션 레코드를 함께 확인하는 세션 기반 인증과,
//! 역할 집합 포함 여부로 판단하는 권한 확인을 제공합니다.
//!
//! # 구성 요소
//!
//! - [`hash_password`] / [`verify_password`]: argon2 비밀번호 해시
//! - [`TokenCodec`]: 토큰 발급/검증
//! - [`SessionResolver`]: 쿠키 → 세션 확인, 인증 게이트
//! - [`check_permission`] / [`Capability`]: 역할 기반 권한 확인
//! - [`AuthSession`] / [`Authorized`]: Axum 추출기
//!
//! # 사용 예시
//!
//! ```rust,ignore
//! async fn list_clients(
//!     Authorized(resolved, _): Authorized<ManageClients>,
//! ) -> impl IntoResponse {
//!     format!("Hello, {}!", resolved.client.email)
//! }
//! ```

mod error;
mod jwt;
mod middleware;
mod password;
mod roles;
mod session;

pub use error::{AuthError, AuthRejection};
pub use jwt::{TokenClaims, TokenCodec, TokenError, DEFAULT_TOKEN_TTL_DAYS};
pub use middleware::{AuthSession, Authorized, OptionalAuthSession};
pub use password::{
    hash_password, validate_password_strength, verify_login, verify_password, PasswordError,
};
pub use roles::{check_permission, require, Capability, GrantPermissions, ManageClients, ModerateSessions};
pub use session::{ResolvedSession, SessionResolver};
