//! Vetbook 인증 API 서버.
//!
//! 설정을 읽어 저장소를 선택하고, 로그인/세션/관리자 엔드포인트를 서비스합니다.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use vetbook_api::auth::hash_password;
use vetbook_api::client_info::TrustedProxies;
use vetbook_api::metrics::setup_metrics_recorder;
use vetbook_api::middleware::{RateLimitConfig, RateLimiter};
use vetbook_api::repository::{MemoryStore, PgStore};
use vetbook_api::state::AppState;
use vetbook_api::create_app;
use vetbook_core::{init_logging, AppConfig, Client, LogConfig, Role, SeedConfig};

/// Prometheus 메트릭 핸들러.
async fn metrics_handler(
    axum::extract::State(handle): axum::extract::State<PrometheusHandle>,
) -> String {
    handle.render()
}

/// OpenAPI 스펙 내보내기 처리.
///
/// `--export-openapi` 플래그 또는 `EXPORT_OPENAPI` 환경변수가 설정된 경우
/// OpenAPI JSON 스펙을 stdout으로 출력하고 종료합니다.
fn handle_export_openapi() -> Result<(), Box<dyn std::error::Error>> {
    use utoipa::OpenApi as _;
    use vetbook_api::openapi::ApiDoc;

    let export_flag = std::env::args().any(|arg| arg == "--export-openapi");
    let export_env = std::env::var("EXPORT_OPENAPI")
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    if export_flag || export_env {
        let json = serde_json::to_string_pretty(&ApiDoc::openapi())?;
        println!("{}", json);
        std::process::exit(0);
    }

    Ok(())
}

/// 개발용 인메모리 저장소 생성.
///
/// 시드 계정이 설정되어 있으면 SUPERADMIN 권한으로 등록합니다.
async fn memory_store(seed: &SeedConfig) -> Result<MemoryStore, Box<dyn std::error::Error>> {
    let store = MemoryStore::new();

    match seed.credentials() {
        Some((email, password)) => {
            let hash = hash_password(password)?;
            let client = Client::new(Uuid::new_v4().to_string(), email, hash)
                .with_permissions([Role::Superadmin]);
            store.insert_client(client).await;
            info!(email = %email, "Seeded SUPERADMIN client into memory store");
        }
        None => {
            warn!("Memory store has no clients; set seed.email and seed.password to log in");
        }
    }

    Ok(store)
}

/// 설정에 따라 저장소를 선택하여 AppState 생성.
async fn create_app_state(config: &AppConfig) -> Result<AppState, Box<dyn std::error::Error>> {
    match config.database.url.as_deref() {
        Some(url) if !url.is_empty() => {
            info!("Connecting to PostgreSQL...");
            let store = PgStore::connect(url, &config.database).await?;
            store.migrate().await?;
            info!("Connected to PostgreSQL");

            let store = Arc::new(store);
            Ok(AppState::new(
                config.auth.clone(),
                store.clone(),
                store,
                "postgres",
            ))
        }
        _ => {
            warn!("database.url not set, using in-memory store (data is lost on restart)");
            let store = Arc::new(memory_store(&config.seed).await?);
            Ok(AppState::new(
                config.auth.clone(),
                store.clone(),
                store,
                "memory",
            ))
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .env 파일 로드 (있는 경우)
    let _ = dotenvy::dotenv();

    // OpenAPI 내보내기 처리 (서버 시작 전)
    handle_export_openapi()?;

    let config = AppConfig::load_default()?;
    init_logging(LogConfig::from(&config.logging))?;

    info!("Starting Vetbook Auth API v{}", env!("CARGO_PKG_VERSION"));

    let metrics_handle = setup_metrics_recorder()?;
    info!("Prometheus metrics recorder initialized");

    if config.auth.uses_default_secret() {
        warn!("auth.jwt_secret is not configured; using the built-in development secret");
    }

    let shutdown_token = CancellationToken::new();

    let trusted_proxies = TrustedProxies::new(config.server.trusted_proxies.iter().copied());
    if !config.server.trusted_proxies.is_empty() {
        info!(
            count = config.server.trusted_proxies.len(),
            "Forwarding headers trusted from configured proxies"
        );
    }

    let mut state = create_app_state(&config)
        .await?
        .with_trusted_proxies(trusted_proxies.clone());

    let mut cleanup_handle = None;
    if config.rate_limit.enabled {
        let limiter = RateLimiter::new(RateLimitConfig::from(&config.rate_limit))
            .with_trusted_proxies(trusted_proxies);
        cleanup_handle = Some(limiter.spawn_cleanup(shutdown_token.clone()));
        state = state.with_login_limiter(limiter);
        info!(
            per_minute = config.rate_limit.login_per_minute,
            "Login rate limiting enabled"
        );
    } else {
        warn!("Login rate limiting disabled");
    }

    let metrics_router = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metrics_handle);

    let app = create_app(Arc::new(state), &config.server.cors_origins).merge(metrics_router);

    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    info!("Swagger UI: http://{}/swagger-ui", addr);

    // 로그인 rate limit과 세션 기기 정보는 피어 주소를 기준으로 함
    let service = app.into_make_service_with_connect_info::<SocketAddr>();
    if let Err(e) = axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal(shutdown_token.clone()))
        .await
    {
        error!("Server error: {}", e);
    }

    if let Some(handle) = cleanup_handle {
        let _ = handle.await;
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown 시그널 처리.
///
/// Ctrl+C 또는 SIGTERM을 받으면 CancellationToken을 취소하여
/// 백그라운드 태스크에 종료를 알립니다.
async fn shutdown_signal(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }

    shutdown_token.cancel();
    info!("Shutdown signal propagated to background tasks");
}
