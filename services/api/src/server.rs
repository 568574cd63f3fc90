use crate::cli::ServeArgs;
use crate::infra::{
    seed_catalog, seed_coupons, AppState, InMemoryAnswerSheetStore, InMemoryCouponBook,
    InMemoryEnrollmentStore, InMemorySubmissionStore, SeededCatalog,
};
use crate::routes::with_storefront_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use prepseries::config::AppConfig;
use prepseries::error::AppError;
use prepseries::storefront::StorefrontService;
use prepseries::submissions::SubmissionService;
use prepseries::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

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

    let (products, papers) = seed_catalog();
    let files = Arc::new(InMemoryAnswerSheetStore::preloaded(&papers));
    let catalog = Arc::new(SeededCatalog::new(products, papers));
    let coupons = Arc::new(InMemoryCouponBook::with(seed_coupons()));
    let enrollments = Arc::new(InMemoryEnrollmentStore::default());
    let submissions = Arc::new(InMemorySubmissionStore::default());

    let storefront_service = Arc::new(StorefrontService::new(
        catalog.clone(),
        coupons,
        catalog.clone(),
        enrollments.clone(),
    ));
    let submission_service = Arc::new(SubmissionService::new(
        catalog,
        enrollments,
        submissions,
        files,
    ));

    let app = with_storefront_routes(storefront_service, submission_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "test-series storefront ready");

    axum::serve(listener, app).await?;
    Ok(())
}
