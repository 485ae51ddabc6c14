//! Axum 인증 추출기.
//!
//! 핸들러 인자로 선언하면 핸들러 본문 실행 전에 게이트와 권한 확인이
//! 끝납니다. 한 요청에서 확인된 세션은 요청 extensions에 캐시됩니다.

use std::marker::PhantomData;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::CookieJar;
use tracing::warn;

use super::{roles, AuthError, AuthRejection, Capability, ResolvedSession, SessionResolver};
use crate::i18n::Locale;
use crate::metrics::record_auth_denial;

/// 세션 필수 추출기.
///
/// ```rust,ignore
/// async fn me(AuthSession(resolved): AuthSession) -> impl IntoResponse {
///     Json(resolved.client.profile())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthSession(pub ResolvedSession);

/// 세션 선택 추출기. 세션이 없으면 `None`.
#[derive(Debug, Clone)]
pub struct OptionalAuthSession(pub Option<ResolvedSession>);

/// 세션과 `C`가 요구하는 역할을 모두 확인하는 추출기.
#[derive(Debug, Clone)]
pub struct Authorized<C: Capability>(pub ResolvedSession, pub PhantomData<C>);

impl<C: Capability> Authorized<C> {
    pub fn into_inner(self) -> ResolvedSession {
        self.0
    }
}

/// 요청 단위 세션 확인 (extensions 캐시 사용).
async fn resolve_cached<S>(
    parts: &mut Parts,
    state: &S,
) -> Result<Option<ResolvedSession>, AuthError>
where
    SessionResolver: FromRef<S>,
    S: Send + Sync,
{
    if let Some(cached) = parts.extensions.get::<ResolvedSession>() {
        return Ok(Some(cached.clone()));
    }

    let resolver = SessionResolver::from_ref(state);
    let jar = CookieJar::from_headers(&parts.headers);
    let resolved = resolver.resolve_session(&jar).await?;

    if let Some(session) = &resolved {
        parts.extensions.insert(session.clone());
    }
    Ok(resolved)
}

impl<S> FromRequestParts<S> for AuthSession
where
    SessionResolver: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let locale = Locale::from_headers(&parts.headers);

        match resolve_cached(parts, state).await {
            Ok(Some(session)) => Ok(AuthSession(session)),
            Ok(None) => {
                record_auth_denial("unauthenticated");
                Err(AuthRejection::new(AuthError::Unauthenticated, locale))
            }
            Err(e) => Err(AuthRejection::new(e, locale)),
        }
    }
}

impl<S> FromRequestParts<S> for OptionalAuthSession
where
    SessionResolver: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let locale = Locale::from_headers(&parts.headers);
        resolve_cached(parts, state)
            .await
            .map(OptionalAuthSession)
            .map_err(|e| AuthRejection::new(e, locale))
    }
}

impl<S, C> FromRequestParts<S> for Authorized<C>
where
    SessionResolver: FromRef<S>,
    S: Send + Sync,
    C: Capability,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let locale = Locale::from_headers(&parts.headers);
        let AuthSession(resolved) = AuthSession::from_request_parts(parts, state).await?;

        if let Err(e) = roles::require::<C>(&resolved.client) {
            warn!(
                client_id = %resolved.client.id,
                capability = C::NAME,
                path = %parts.uri.path(),
                "Capability check failed"
            );
            record_auth_denial("unauthorized");
            return Err(AuthRejection::new(e, locale));
        }

        Ok(Authorized(resolved, PhantomData))
    }
}
