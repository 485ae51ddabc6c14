//! 인증 토큰 처리.
//!
//! 클라이언트 ID와 만료 시각을 담은 HS256 JWT를 발급/검증합니다.
//! 호출자에게는 만료와 변조를 구분하지 않고 `None` 하나로만 알리며,
//! 구분된 사유는 로그와 메트릭에만 남깁니다.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::metrics::record_token_rejection;

/// 기본 토큰 유효 기간 (일).
pub const DEFAULT_TOKEN_TTL_DAYS: i64 = 30;

/// 토큰 페이로드.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject - 클라이언트 ID
    pub sub: String,
    /// Issued At (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
    /// JWT ID - 같은 초에 발급된 토큰도 서로 다른 문자열이 되도록 함
    pub jti: String,
}

impl TokenClaims {
    fn new(client_id: &str, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: client_id.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            jti: uuid::Uuid::new_v4().to_string(),
        }
    }
}

/// 토큰 처리 에러. 코덱 내부에서만 구분됩니다.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("토큰 인코딩 실패: {0}")]
    Encoding(#[from] jsonwebtoken::errors::Error),
    #[error("토큰이 만료되었습니다")]
    Expired,
    #[error("유효하지 않은 토큰")]
    Invalid,
}

impl TokenError {
    /// 메트릭/로그용 사유 레이블.
    pub fn reason(&self) -> &'static str {
        match self {
            TokenError::Encoding(_) => "encoding",
            TokenError::Expired => "expired",
            TokenError::Invalid => "invalid",
        }
    }
}

/// 토큰 서명/검증기.
///
/// 키는 생성 시 한 번만 파생되며 `Clone`은 키를 복사합니다.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("ttl_days", &self.ttl.num_days())
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    /// 새 코덱 생성.
    ///
    /// # Arguments
    ///
    /// * `secret` - 서버 측 서명 시크릿
    /// * `ttl_days` - 발급 토큰 유효 기간 (일)
    pub fn new(secret: &SecretString, ttl_days: i64) -> Self {
        let key = secret.expose_secret().as_bytes();
        let mut validation = Validation::default();
        validation.validate_exp = true;
        // 만료 직후 토큰이 유예 없이 거부되도록 leeway 제거
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(key),
            decoding: DecodingKey::from_secret(key),
            validation,
            ttl: Duration::days(ttl_days),
        }
    }

    /// 토큰 유효 기간.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// 클라이언트 ID를 담은 토큰 발급 (설정된 유효 기간 적용).
    pub fn issue(&self, client_id: &str) -> Result<String, TokenError> {
        self.issue_with_ttl(client_id, self.ttl)
    }

    /// 임의 유효 기간으로 토큰 발급. 음수 기간은 이미 만료된 토큰을 만듭니다.
    pub fn issue_with_ttl(&self, client_id: &str, ttl: Duration) -> Result<String, TokenError> {
        let claims = TokenClaims::new(client_id, ttl);
        encode(&Header::default(), &claims, &self.encoding).map_err(TokenError::from)
    }

    /// 서명과 만료를 검증하고 사유를 구분한 결과를 반환.
    pub fn decode(&self, token: &str) -> Result<TokenClaims, TokenError> {
        decode::<TokenClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })
    }

    /// 토큰 검증.
    ///
    /// 서명과 만료가 모두 유효할 때만 클라이언트 ID를 반환합니다.
    /// 만료/변조/형식 오류는 모두 `None`이며 에러가 호출자로 전파되지 않습니다.
    pub fn verify(&self, token: &str) -> Option<String> {
        match self.decode(token) {
            Ok(claims) => Some(claims.sub),
            Err(e) => {
                debug!(reason = e.reason(), "Token rejected");
                record_token_rejection(e.reason());
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const TEST_SECRET: &str = "test-secret-key-for-token-testing-minimum-32-chars";

    fn codec() -> TokenCodec {
        TokenCodec::new(&SecretString::new(TEST_SECRET.into()), DEFAULT_TOKEN_TTL_DAYS)
    }

    #[test]
    fn test_issue_and_verify() {
        let codec = codec();
        let token = codec.issue("c1").unwrap();

        assert!(!token.is_empty());
        assert_eq!(codec.verify(&token), Some("c1".to_string()));
    }

    #[test]
    fn test_expiry_is_thirty_days() {
        let codec = codec();
        let claims = codec.decode(&codec.issue("c1").unwrap()).unwrap();

        assert_eq!(claims.exp - claims.iat, 30 * 24 * 60 * 60);
    }

    #[test]
    fn test_tokens_are_unique_per_issue() {
        let codec = codec();
        assert_ne!(codec.issue("c1").unwrap(), codec.issue("c1").unwrap());
    }

    #[test]
    fn test_expired_token_is_invalid() {
        let codec = codec();
        let token = codec.issue_with_ttl("c1", Duration::hours(-1)).unwrap();

        assert!(matches!(codec.decode(&token), Err(TokenError::Expired)));
        assert_eq!(codec.verify(&token), None);
    }

    #[test]
    fn test_wrong_secret() {
        let token = codec().issue("c1").unwrap();
        let other = TokenCodec::new(
            &SecretString::new("another-secret-key-for-testing-minimum-32".into()),
            30,
        );

        assert!(matches!(other.decode(&token), Err(TokenError::Invalid)));
        assert_eq!(other.verify(&token), None);
    }

    #[test]
    fn test_garbage_token() {
        let codec = codec();
        assert_eq!(codec.verify(""), None);
        assert_eq!(codec.verify("invalid.token.here"), None);
    }

    #[test]
    fn test_every_single_character_tamper_rejected() {
        let codec = codec();
        let token = codec.issue("c1").unwrap();

        for (i, ch) in token.char_indices() {
            if ch == '.' {
                continue;
            }
            let replacement = if ch == 'A' { 'B' } else { 'A' };
            let mut tampered = token.clone();
            tampered.replace_range(i..i + 1, &replacement.to_string());

            assert_eq!(codec.verify(&tampered), None, "tamper at index {} accepted", i);
        }
    }

    proptest! {
        #[test]
        fn prop_issue_verify_roundtrip(client_id in "[a-z0-9]{1,24}") {
            let codec = codec();
            let token = codec.issue(&client_id).unwrap();
            prop_assert_eq!(codec.verify(&token), Some(client_id));
        }
    }
}
