//! tracing 구독자 초기화.
//!
//! 인증 이벤트는 `client_id`, `session_id`, `reason` 필드로 기록합니다.
//! 원시 토큰과 비밀번호는 어떤 레벨에서도 기록하지 않습니다.

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

use crate::config::LoggingConfig;

/// 출력 형식. 운영 환경의 로그 수집기는 `Json`을 기대합니다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    /// 한 줄 형식
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            "compact" => Ok(Self::Compact),
            other => Err(format!("Unknown log format: {}", other)),
        }
    }
}

/// 구독자 설정.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// `EnvFilter` 지시어 (예: "vetbook_api=debug,tower_http=info")
    pub level: String,
    pub format: LogFormat,
    /// span 진입/종료 이벤트 출력
    pub with_span_events: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::new("info")
    }
}

impl LogConfig {
    pub fn new(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            format: LogFormat::Pretty,
            with_span_events: false,
        }
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.with_span_events = enabled;
        self
    }
}

/// `LOG_FORMAT` 값이 유효하면 우선, 아니면 설정 파일 값, 둘 다 아니면 pretty.
fn resolve_format(env_value: Option<&str>, configured: &str) -> LogFormat {
    env_value
        .and_then(|v| v.parse().ok())
        .or_else(|| configured.parse().ok())
        .unwrap_or_default()
}

impl From<&LoggingConfig> for LogConfig {
    fn from(config: &LoggingConfig) -> Self {
        let env_format = std::env::var("LOG_FORMAT").ok();

        Self {
            level: config.level.clone(),
            format: resolve_format(env_format.as_deref(), &config.format),
            with_span_events: false,
        }
    }
}

/// 전역 구독자 설치. `RUST_LOG`가 있으면 `config.level`보다 우선합니다.
///
/// ```no_run
/// use vetbook_core::logging::{init_logging, LogConfig, LogFormat};
///
/// init_logging(LogConfig::new("vetbook_api=debug").with_format(LogFormat::Json)).unwrap();
/// ```
pub fn init_logging(config: LogConfig) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.level))?;

    let span_events = if config.with_span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let fmt_layer = match config.format {
        LogFormat::Pretty => fmt::layer().pretty().with_span_events(span_events).boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_events(span_events)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_span_events(span_events).boxed(),
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .try_init()?;

    tracing::info!(format = ?config.format, level = %config.level, "Logging initialized");
    Ok(())
}
