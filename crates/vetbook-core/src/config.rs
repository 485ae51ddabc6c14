//! 설정 관리.
//!
//! 이 모듈은 애플리케이션 설정을 정의하고 관리합니다.
//! 기본값 → 설정 파일 → `VETBOOK__` 접두사 환경 변수 순으로 덮어씁니다.

use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::Path;

/// 서명 시크릿 미설정 시 사용하는 개발용 기본값.
///
/// 운영 환경에서는 반드시 `VETBOOK__AUTH__JWT_SECRET`으로 교체해야 합니다.
pub const DEFAULT_JWT_SECRET: &str = "development-secret-key-change-in-production";

/// 애플리케이션 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// 서버 설정
    #[serde(default)]
    pub server: ServerConfig,
    /// 데이터베이스 설정
    #[serde(default)]
    pub database: DatabaseConfig,
    /// 인증 설정
    #[serde(default)]
    pub auth: AuthConfig,
    /// 로깅 설정
    #[serde(default)]
    pub logging: LoggingConfig,
    /// 로그인 rate limit 설정
    #[serde(default)]
    pub rate_limit: RateLimitSettings,
    /// 인메모리 저장소용 초기 계정
    #[serde(default)]
    pub seed: SeedConfig,
}

/// 서버 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 바인딩할 호스트
    pub host: String,
    /// 리스닝할 포트
    pub port: u16,
    /// 허용 CORS origin 목록 (비어 있으면 개발 모드로 모두 허용)
    pub cors_origins: Vec<String>,
    /// `X-Forwarded-For`/`X-Real-IP`를 신뢰할 리버스 프록시 주소
    pub trusted_proxies: Vec<IpAddr>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            cors_origins: Vec::new(),
            trusted_proxies: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// `host:port` 주소 문자열.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 데이터베이스 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// PostgreSQL 연결 URL (없으면 인메모리 저장소 사용)
    pub url: Option<String>,
    /// 최대 연결 수
    pub max_connections: u32,
    /// 연결 획득 타임아웃 (초)
    pub acquire_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
            acquire_timeout_secs: 10,
        }
    }
}

/// 인증 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// 토큰 서명 시크릿
    pub jwt_secret: Option<String>,
    /// 토큰 유효 기간 (일)
    pub token_ttl_days: i64,
    /// 토큰을 담는 쿠키 이름
    pub cookie_name: String,
    /// 쿠키 Secure 속성
    pub secure_cookie: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            token_ttl_days: 30,
            cookie_name: "auth_token".to_string(),
            secure_cookie: false,
        }
    }
}

impl AuthConfig {
    /// 서명에 사용할 시크릿. 미설정(또는 빈 값)이면 개발용 기본값.
    pub fn signing_secret(&self) -> &str {
        match self.jwt_secret.as_deref() {
            Some(secret) if !secret.is_empty() => secret,
            _ => DEFAULT_JWT_SECRET,
        }
    }

    /// 개발용 기본 시크릿을 사용 중인지 확인.
    pub fn uses_default_secret(&self) -> bool {
        self.signing_secret() == DEFAULT_JWT_SECRET
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "vetbook_api=info,vetbook_core=info,tower_http=info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// 로그인 엔드포인트 rate limit 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitSettings {
    /// 활성화 여부
    pub enabled: bool,
    /// IP당 분당 로그인 시도 수
    pub login_per_minute: u32,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            login_per_minute: 10,
        }
    }
}

/// 인메모리 저장소로 실행할 때 만들어 둘 SUPERADMIN 계정.
///
/// 둘 다 설정된 경우에만 사용되며 PostgreSQL 저장소에서는 무시됩니다.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SeedConfig {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl SeedConfig {
    /// (email, password) 쌍. 하나라도 비어 있으면 `None`.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.email.as_deref(), self.password.as_deref()) {
            (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
                Some((email, password))
            }
            _ => None,
        }
    }
}

impl AppConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    ///
    /// 파일이 없으면 건너뜁니다.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            // 파일에서 로드
            .add_source(config::File::from(path.as_ref()).required(false))
            // 환경 변수로 오버라이드
            .add_source(
                config::Environment::with_prefix("VETBOOK")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// 기본 경로에서 설정을 로드합니다.
    pub fn load_default() -> Result<Self, config::ConfigError> {
        Self::load("config/default.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_defaults() {
        let auth = AuthConfig::default();
        assert_eq!(auth.token_ttl_days, 30);
        assert_eq!(auth.cookie_name, "auth_token");
        assert!(auth.uses_default_secret());
        assert_eq!(auth.signing_secret(), DEFAULT_JWT_SECRET);
    }

    #[test]
    fn test_empty_secret_falls_back() {
        let auth = AuthConfig {
            jwt_secret: Some(String::new()),
            ..Default::default()
        };
        assert!(auth.uses_default_secret());

        let auth = AuthConfig {
            jwt_secret: Some("prod-secret".to_string()),
            ..Default::default()
        };
        assert!(!auth.uses_default_secret());
        assert_eq!(auth.signing_secret(), "prod-secret");
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config = AppConfig::load("does/not/exist.toml").unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.auth.token_ttl_days, 30);
        assert!(config.rate_limit.enabled);
    }

    #[test]
    fn test_partial_toml_section() {
        let config: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(
                "[auth]\ntoken_ttl_days = 7\ncookie_name = \"sid\"\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.auth.token_ttl_days, 7);
        assert_eq!(config.auth.cookie_name, "sid");
        assert_eq!(config.server.host, "127.0.0.1");
        assert!(config.server.trusted_proxies.is_empty());
    }

    #[test]
    fn test_trusted_proxies_parse() {
        let config: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(
                "[server]\ntrusted_proxies = [\"10.0.0.1\", \"::1\"]\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        let expected: Vec<IpAddr> = vec!["10.0.0.1".parse().unwrap(), "::1".parse().unwrap()];
        assert_eq!(config.server.trusted_proxies, expected);
    }

    #[test]
    fn test_seed_requires_both_values() {
        let seed = SeedConfig {
            email: Some("root@example.com".to_string()),
            password: None,
        };
        assert!(seed.credentials().is_none());

        let seed = SeedConfig {
            email: Some("root@example.com".to_string()),
            password: Some("s3cret-pass".to_string()),
        };
        assert_eq!(seed.credentials(), Some(("root@example.com", "s3cret-pass")));
    }
}
