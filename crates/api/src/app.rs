use axum::{
    http::{header, HeaderName, Method},
    middleware,
    routing::get,
    Router,
};
use domain::services::DispatchService;
use shared::jwt::JwtConfig;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{Config, SecurityConfig};
use crate::middleware::{
    metrics_handler, metrics_middleware, security_headers_middleware, trace_id, SecurityHeaders,
    REQUEST_ID_HEADER,
};
use crate::routes::{health, sos};
use crate::services::{EmailService, PlatformNotifier, WebhookPublisher};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub dispatch: Arc<DispatchService>,
    pub jwt: Arc<JwtConfig>,
}

/// Builds the router backed by PostgreSQL and the platform notifier.
pub fn create_app(config: Config, pool: PgPool) -> anyhow::Result<Router> {
    let email = EmailService::new(config.email.clone(), config.server.app_base_url.clone());
    let webhook = WebhookPublisher::new(config.webhook.clone())?;
    let notifier = Arc::new(PlatformNotifier::new(
        pool.clone(),
        email,
        webhook,
        config.server.app_base_url.clone(),
    ));

    let dispatch = DispatchService::new(
        persistence::dispatch_stores(pool.clone()),
        notifier,
        config.dispatch.settings(),
    );

    create_app_with_dispatch(config, pool, dispatch)
}

/// Builds the router around an already assembled dispatch service.
///
/// The pool is only used by health probes.
pub fn create_app_with_dispatch(
    config: Config,
    pool: PgPool,
    dispatch: DispatchService,
) -> anyhow::Result<Router> {
    let jwt = JwtConfig::with_leeway(
        &config.jwt.private_key,
        &config.jwt.public_key,
        config.jwt.access_token_expiry_secs,
        config.jwt.leeway_secs,
    )?;

    let config = Arc::new(config);
    let state = AppState {
        pool,
        config: config.clone(),
        dispatch: Arc::new(dispatch),
        jwt: Arc::new(jwt),
    };

    let sos_routes = Router::new().route(
        "/api/v1/sos",
        get(sos::list_sos)
            .post(sos::create_sos)
            .patch(sos::update_sos),
    );

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/live", get(health::live))
        .route("/api/health/ready", get(health::ready))
        .route("/metrics", get(metrics_handler));

    let security_headers = SecurityHeaders {
        hsts: config.security.hsts_enabled,
    };

    Ok(Router::new()
        .merge(public_routes)
        .merge(sos_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(middleware::from_fn_with_state(
            security_headers,
            security_headers_middleware,
        ))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors_layer(&config.security))
        .with_state(state))
}

/// Any origin without credentials in development; an explicit allow list
/// with cookie credentials otherwise.
fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if security.cors_origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<_> = security
        .cors_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
        .allow_credentials(true)
}
