//! 인증/인가 에러.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::error::ApiError;
use crate::i18n::Locale;
use crate::repository::StoreError;

/// 인증 경계에서 발생하는 에러.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// 세션을 확인할 수 없음 (쿠키 없음, 토큰 무효, 세션 종료)
    #[error("authentication required")]
    Unauthenticated,
    /// 세션은 유효하지만 필요한 역할이 없음
    #[error("insufficient permission")]
    Unauthorized,
    /// 로그인 실패. 계정 없음과 비밀번호 불일치를 구분하지 않음
    #[error("invalid credential")]
    InvalidCredential,
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AuthError::Unauthorized => StatusCode::FORBIDDEN,
            AuthError::InvalidCredential => StatusCode::BAD_REQUEST,
            AuthError::Store(_) | AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AuthError::Unauthenticated => "UNAUTHENTICATED",
            AuthError::Unauthorized => "UNAUTHORIZED",
            AuthError::InvalidCredential => "INVALID_CREDENTIAL",
            AuthError::Store(_) | AuthError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// 응답 본문에 넣을 사용자 메시지. 내부 에러 상세는 포함하지 않습니다.
    pub fn localized_message(&self, locale: Locale) -> &'static str {
        match (self, locale) {
            (AuthError::Unauthenticated, Locale::En) => "Authentication required",
            (AuthError::Unauthenticated, Locale::Ko) => "로그인이 필요합니다",
            (AuthError::Unauthorized, Locale::En) => "You do not have permission to perform this action",
            (AuthError::Unauthorized, Locale::Ko) => "이 작업을 수행할 권한이 없습니다",
            (AuthError::InvalidCredential, Locale::En) => "Invalid email or password",
            (AuthError::InvalidCredential, Locale::Ko) => "이메일 또는 비밀번호가 올바르지 않습니다",
            (AuthError::Store(_) | AuthError::Internal(_), Locale::En) => "Internal server error",
            (AuthError::Store(_) | AuthError::Internal(_), Locale::Ko) => "서버 내부 오류가 발생했습니다",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}

/// 추출기 거부 응답. 요청 로케일을 함께 들고 다닙니다.
#[derive(Debug)]
pub struct AuthRejection {
    pub error: AuthError,
    pub locale: Locale,
}

impl AuthRejection {
    pub fn new(error: AuthError, locale: Locale) -> Self {
        Self { error, locale }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        ApiError::from_auth(self.error, self.locale).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AuthError::Unauthenticated.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::Unauthorized.status(), StatusCode::FORBIDDEN);
        assert_eq!(AuthError::InvalidCredential.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AuthError::Internal("boom".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_message_is_generic() {
        let err = AuthError::Internal("argon2 params invalid".into());
        assert!(!err.localized_message(Locale::En).contains("argon2"));
        assert_eq!(err.code(), "INTERNAL_ERROR");
    }

    #[tokio::test]
    async fn test_rejection_uses_locale() {
        let response =
            AuthRejection::new(AuthError::Unauthorized, Locale::Ko).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], "UNAUTHORIZED");
        assert_eq!(json["message"], "이 작업을 수행할 권한이 없습니다");
    }
}
