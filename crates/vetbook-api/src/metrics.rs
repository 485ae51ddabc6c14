//! Prometheus 메트릭 설정 및 유틸리티.
//!
//! HTTP 요청 메트릭과 인증 메트릭을 수집하고 `/metrics` 엔드포인트로 노출합니다.

use metrics::counter;
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};

/// Prometheus 메트릭 레코더를 설정하고 핸들을 반환합니다.
///
/// 레코더가 이미 설치되어 있으면 에러를 반환합니다.
pub fn setup_metrics_recorder() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0],
        )?
        .install_recorder()
}

// ============================================================================
// HTTP 메트릭 헬퍼 함수
// ============================================================================

/// HTTP 요청 카운터 증가.
pub fn record_http_request(method: &str, path: &str) {
    counter!("http_requests_total", "method" => method.to_string(), "path" => path.to_string())
        .increment(1);
}

/// HTTP 응답 카운터 증가.
pub fn record_http_response(method: &str, path: &str, status: u16) {
    counter!(
        "http_responses_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// HTTP 요청 지속 시간 기록.
pub fn record_http_duration(method: &str, path: &str, duration_secs: f64) {
    metrics::histogram!(
        "http_request_duration_seconds",
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration_secs);
}

// ============================================================================
// 인증 메트릭 헬퍼 함수
// ============================================================================

/// 로그인 시도 결과 (`success`, `invalid_credential`, `rate_limited`).
pub fn record_login(outcome: &'static str) {
    counter!("auth_logins_total", "outcome" => outcome).increment(1);
}

/// 토큰 거부 사유 (`expired`, `invalid`).
///
/// 호출자는 두 경우를 구분하지 않지만 운영 측에서는 만료와 변조 시도를
/// 따로 볼 수 있어야 합니다.
pub fn record_token_rejection(reason: &'static str) {
    counter!("auth_token_rejections_total", "reason" => reason).increment(1);
}

/// 게이트/권한 거부 (`unauthenticated`, `unauthorized`).
pub fn record_auth_denial(kind: &'static str) {
    counter!("auth_denials_total", "kind" => kind).increment(1);
}

// ============================================================================
// 경로 정규화 유틸리티
// ============================================================================

/// 경로에서 동적 파라미터를 정규화합니다.
///
/// 예: `/api/v1/sessions/123e4567-e89b-12d3-a456-426614174000` → `/api/v1/sessions/:id`
pub fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            let is_uuid = segment.len() == 36 && segment.chars().filter(|c| *c == '-').count() == 4;
            let is_numeric = !segment.is_empty() && segment.chars().all(|c| c.is_ascii_digit());

            if is_uuid || is_numeric {
                ":id"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}
