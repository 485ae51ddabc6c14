//! Rate limiting middleware.
//!
//! Token Bucket 알고리즘 기반 IP별 rate limiting. 로그인 라우트에 적용되어
//! 비밀번호 대입 시도를 늦춥니다.

use axum::{
    extract::{Request, State},
    http::{header::RETRY_AFTER, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use vetbook_core::RateLimitSettings;

use crate::client_info::{peer_addr, TrustedProxies};
use crate::error::ApiErrorResponse;
use crate::metrics::record_login;

/// Rate Limiter 설정.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// 분당 최대 요청 수
    pub requests_per_minute: u32,
    /// 버스트 허용량 (순간적으로 허용되는 추가 요청)
    pub burst_size: u32,
    /// 마지막 사용 후 이 시간이 지난 버킷은 정리 대상
    pub cleanup_interval: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::new(10)
    }
}

impl RateLimitConfig {
    /// 버스트 없는 설정 생성.
    pub fn new(requests_per_minute: u32) -> Self {
        Self {
            requests_per_minute,
            burst_size: 0,
            cleanup_interval: Duration::from_secs(300),
        }
    }

    pub fn with_burst(mut self, burst_size: u32) -> Self {
        self.burst_size = burst_size;
        self
    }
}

impl From<&RateLimitSettings> for RateLimitConfig {
    fn from(settings: &RateLimitSettings) -> Self {
        Self::new(settings.login_per_minute)
    }
}

#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
    max_tokens: f64,
    /// 초당 리필 토큰 수
    refill_rate: f64,
}

impl TokenBucket {
    fn new(config: &RateLimitConfig) -> Self {
        // 분당 한도 전체를 초기 용량으로 허용
        let max_tokens = (config.requests_per_minute + config.burst_size).max(1) as f64;

        Self {
            tokens: max_tokens,
            last_refill: Instant::now(),
            max_tokens,
            refill_rate: config.requests_per_minute.max(1) as f64 / 60.0,
        }
    }

    fn try_acquire(&mut self) -> bool {
        self.refill();

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();

        self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.max_tokens);
        self.last_refill = now;
    }

    fn time_until_next_token(&self) -> f64 {
        if self.tokens >= 1.0 {
            0.0
        } else {
            (1.0 - self.tokens) / self.refill_rate
        }
    }
}

/// IP 주소별 Rate Limiter.
#[derive(Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    trusted: TrustedProxies,
    buckets: Arc<RwLock<HashMap<IpAddr, TokenBucket>>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            trusted: TrustedProxies::default(),
            buckets: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// 전달 헤더를 읽을 프록시 설정. 기본값은 피어 주소만 사용.
    pub fn with_trusted_proxies(mut self, trusted: TrustedProxies) -> Self {
        self.trusted = trusted;
        self
    }

    /// 요청 허용 여부 확인.
    pub async fn check(&self, ip: IpAddr) -> RateLimitResult {
        let mut buckets = self.buckets.write().await;

        let bucket = buckets
            .entry(ip)
            .or_insert_with(|| TokenBucket::new(&self.config));

        if bucket.try_acquire() {
            RateLimitResult::Allowed
        } else {
            let retry_after = bucket.time_until_next_token().ceil().max(1.0) as u64;
            RateLimitResult::Limited { retry_after }
        }
    }

    /// 오래된 버킷 정리.
    pub async fn cleanup(&self) {
        let mut buckets = self.buckets.write().await;
        let now = Instant::now();
        let interval = self.config.cleanup_interval;

        buckets.retain(|_, bucket| now.duration_since(bucket.last_refill) < interval);
    }

    /// 현재 추적 중인 IP 수.
    pub async fn tracked_ips(&self) -> usize {
        self.buckets.read().await.len()
    }

    /// 주기적 정리 태스크 시작. 토큰이 취소되면 종료합니다.
    pub fn spawn_cleanup(&self, shutdown: CancellationToken) -> tokio::task::JoinHandle<()> {
        let limiter = self.clone();
        let period = self.config.cleanup_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        limiter.cleanup().await;
                        let tracked = limiter.tracked_ips().await;
                        debug!(tracked, "Rate limit buckets cleaned");
                    }
                }
            }
        })
    }
}

/// Rate Limit 확인 결과.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitResult {
    Allowed,
    Limited {
        /// 재시도까지 대기 시간 (초)
        retry_after: u64,
    },
}

/// 로그인 rate limit 미들웨어.
///
/// 버킷 키는 소켓 피어 주소입니다. 피어를 알 수 없는 요청(connect info 없이
/// 서비스된 경우)은 루프백 주소 하나의 버킷을 공유합니다.
pub async fn login_rate_limit(
    State(limiter): State<RateLimiter>,
    request: Request,
    next: Next,
) -> Response {
    let ip = limiter
        .trusted
        .client_ip(peer_addr(request.extensions()), request.headers())
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));

    match limiter.check(ip).await {
        RateLimitResult::Allowed => next.run(request).await,
        RateLimitResult::Limited { retry_after } => {
            record_login("rate_limited");
            warn!(client_ip = %ip, retry_after, "Login rate limit exceeded");

            let body = ApiErrorResponse::with_details(
                "RATE_LIMITED",
                "Too many login attempts. Please try again later.",
                serde_json::json!({ "retry_after": retry_after }),
            );
            let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(retry_after));
            response
        }
    }
}
