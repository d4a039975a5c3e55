//! HTTP server: journey-aware wizard routes plus operational endpoints.

use crate::auth::principal_middleware;
use crate::rest::{self, HealthState};
use crate::wizard;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{middleware, Extension, Router};
use journey_core::config::AppConfig;
use journey_session::bootstrap::bootstrap_journey;
use journey_session::loader::load_journey;
use journey_session::{JourneyBootstrap, JourneyLoader, JsonViews, Views};
use journey_store::JourneyStore;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

pub struct ApiServer {
    config: AppConfig,
    store: Arc<dyn JourneyStore>,
}

impl ApiServer {
    pub fn new(config: AppConfig, store: Arc<dyn JourneyStore>) -> Self {
        Self { config, store }
    }

    pub fn router(&self) -> Router {
        let loader = JourneyLoader::new(self.store.clone(), &self.config.journey);
        let bootstrap = JourneyBootstrap::new(self.config.journey.bootstrap_marker.clone());

        // Entry points only ever redirect into a journey.
        let start_routes = Router::new()
            .route("/appointments/create/start-individual", get(|| async { StatusCode::NOT_FOUND }))
            .route("/appointments/create/start-group", get(|| async { StatusCode::NOT_FOUND }))
            .route_layer(middleware::from_fn_with_state(bootstrap, bootstrap_journey));

        let journey_routes = Router::new()
            .route(
                "/appointments/create/:journeyId/start-individual",
                get(wizard::start_individual),
            )
            .route(
                "/appointments/create/:journeyId/start-group",
                get(wizard::start_group),
            )
            .route(
                "/appointments/create/:journeyId/select-prisoner",
                get(wizard::select_prisoner).post(wizard::submit_prisoner),
            )
            .route(
                "/appointments/create/:journeyId/check-answers",
                get(wizard::check_answers),
            )
            .route_layer(middleware::from_fn_with_state(loader, load_journey));

        let health = Router::new()
            .route("/health", get(rest::health_check))
            .route("/ready", get(rest::readiness))
            .route("/live", get(rest::liveness))
            .with_state(HealthState {
                start_time: Instant::now(),
            });

        Router::new()
            .merge(start_routes)
            .merge(journey_routes)
            .merge(health)
            .layer(middleware::from_fn(principal_middleware))
            .layer(Extension(Views::new(JsonViews)))
            .layer(CompressionLayer::new())
            .layer(TraceLayer::new_for_http())
    }

    /// Start the HTTP server.
    pub async fn start_http(&self) -> anyhow::Result<()> {
        let app = self.router();

        let addr = SocketAddr::new(self.config.api.host.parse()?, self.config.api.http_port);

        info!(addr = %addr, "Starting HTTP server");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }

    /// Start the metrics server on a separate port.
    pub fn start_metrics(&self) -> anyhow::Result<()> {
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(SocketAddr::new(
                self.config.api.host.parse()?,
                self.config.metrics.port,
            ))
            .install()?;

        info!(port = self.config.metrics.port, "Metrics exporter started");
        Ok(())
    }
}
