use crate::cli::ServeArgs;
use crate::infra::{next_tuesday, seed_demo_data, AppState, Services};
use crate::routes::with_service_routes;
use admissions::config::{AppConfig, AppEnvironment};
use admissions::error::AppError;
use admissions::telemetry;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use chrono::Local;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let services = Services::in_memory(config.scheduling);
    if args.seed_demo {
        if config.environment == AppEnvironment::Production {
            warn!("ignoring --seed-demo in production");
        } else {
            let interview_day = next_tuesday(Local::now().date_naive());
            seed_demo_data(&services, interview_day)?;
            info!(%interview_day, "demo applications and interviewers seeded");
        }
    }

    let app = with_service_routes(services.orchestrator, services.scheduling)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "admissions service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
