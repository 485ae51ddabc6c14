//! 통합 API 에러 응답 타입.
//!
//! 모든 API 엔드포인트에서 일관된 에러 형식을 제공합니다.
//! 내부 에러 상세는 로그에만 남기고 응답에는 일반 메시지만 담습니다.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::error;
use utoipa::ToSchema;

use crate::auth::AuthError;
use crate::i18n::Locale;
use crate::repository::StoreError;

/// 통합 API 에러 응답 본문.
///
/// ```json
/// {
///   "code": "UNAUTHENTICATED",
///   "message": "Authentication required",
///   "timestamp": 1738300800
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiErrorResponse {
    /// 에러 코드 (예: "UNAUTHENTICATED", "NOT_FOUND")
    pub code: String,
    /// 사람이 읽을 수 있는 에러 메시지
    pub message: String,
    /// 추가 에러 상세 정보 (선택적)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    /// 에러 발생 타임스탬프 (Unix timestamp)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl ApiErrorResponse {
    /// 기본 에러 생성 (타임스탬프 포함).
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            timestamp: Some(chrono::Utc::now().timestamp()),
        }
    }

    /// 상세 정보 포함 에러 생성.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: Value,
    ) -> Self {
        Self {
            details: Some(details),
            ..Self::new(code, message)
        }
    }
}

impl std::fmt::Display for ApiErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

/// 상태 코드와 본문을 묶은 핸들러 에러.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ApiErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ApiErrorResponse::new(code, message),
        }
    }

    pub fn bad_request(code: &str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    /// 검증 실패 (필드별 상세 포함).
    pub fn validation(errors: &validator::ValidationErrors) -> Self {
        let details: serde_json::Map<String, Value> = errors
            .field_errors()
            .iter()
            .map(|(field, errs)| {
                let messages: Vec<Value> = errs
                    .iter()
                    .map(|e| {
                        let text = e
                            .message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string());
                        Value::String(text)
                    })
                    .collect();
                (field.to_string(), Value::Array(messages))
            })
            .collect();

        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            body: ApiErrorResponse::with_details(
                "VALIDATION_ERROR",
                "Request validation failed",
                Value::Object(details),
            ),
        }
    }

    /// 인증 에러를 주어진 로케일의 메시지로 변환.
    pub fn from_auth(err: AuthError, locale: Locale) -> Self {
        if let AuthError::Store(e) = &err {
            error!(error = %e, "Store failure during authentication");
        }
        if let AuthError::Internal(msg) = &err {
            error!(error = %msg, "Internal failure during authentication");
        }

        Self {
            status: err.status(),
            body: ApiErrorResponse::new(err.code(), err.localized_message(locale)),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self::from_auth(err, Locale::default())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self::from(AuthError::Store(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// API 핸들러 Result 타입 별칭.
pub type ApiResult<T> = Result<T, ApiError>;
