mod core;
mod features;
mod shared;

use crate::core::config::Config;
use crate::core::openapi::{ApiDoc, SwaggerInfoModifier};
use crate::core::{database, middleware};
use crate::features::matching::{
    routes as matching_routes, MatchJobProcessor, MatchJobService, ReportMatcher,
};
use crate::features::notifications::{
    FcmPushGateway, LogOnlyPushGateway, NotificationDispatcher, PushGateway, PushTokenService,
    UserProfileService,
};
use crate::features::reports::{ReportService, ReportStore};
use axum::{middleware::from_fn, Router};
use std::sync::Arc;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::Modify;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

fn main() -> anyhow::Result<()> {
    // Build Tokio runtime with configurable worker threads
    let worker_threads = std::env::var("TOKIO_WORKER_THREADS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4)
        });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .enable_all()
        .build()?;

    runtime.block_on(async_main(worker_threads))
}

async fn async_main(worker_threads: usize) -> anyhow::Result<()> {
    // Load .env file BEFORE initializing logger so RUST_LOG is available
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;
    tracing::info!(
        "Configuration loaded (tokio_worker_threads={}, pid={})",
        worker_threads,
        std::process::id()
    );

    let pool = database::connect(&config.database).await?;
    tracing::info!("Database connection pool created");

    database::migrate(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;

    // Stores
    let report_store: Arc<dyn ReportStore> = Arc::new(ReportService::new(pool.clone()));
    let token_store = Arc::new(PushTokenService::new(pool.clone()));
    let profile_store = Arc::new(UserProfileService::new(pool.clone()));

    // Push gateway
    let gateway: Arc<dyn PushGateway> = match config.push.server_key.clone() {
        Some(server_key) => {
            tracing::info!("Push gateway: {}", config.push.gateway_url);
            Arc::new(
                FcmPushGateway::new(&config.push, server_key)
                    .map_err(|e| anyhow::anyhow!("Push gateway init failed: {}", e))?,
            )
        }
        None => {
            tracing::warn!("PUSH_SERVER_KEY not set, match notifications will only be logged");
            Arc::new(LogOnlyPushGateway)
        }
    };

    let dispatcher = Arc::new(NotificationDispatcher::new(
        token_store,
        profile_store,
        gateway,
    ));
    let matcher = Arc::new(ReportMatcher::new(Arc::clone(&report_store), dispatcher));

    if config.match_worker.enabled {
        let processor = MatchJobProcessor::new(
            config.match_worker.clone(),
            Arc::new(MatchJobService::new(pool.clone())),
            Arc::clone(&report_store),
            Arc::clone(&matcher),
        );
        tokio::spawn(async move {
            processor.run().await;
        });
        tracing::info!("Match job processor worker spawned");
    } else {
        tracing::info!("Match job processor disabled; relying on the HTTP trigger");
    }

    if config.trigger.secret.is_none() {
        tracing::warn!("TRIGGER_SECRET not set, trigger endpoint accepts unauthenticated calls");
    }

    // Build application router with dynamic swagger config
    let swagger_modifier = SwaggerInfoModifier {
        title: config.swagger.title.clone(),
        version: config.swagger.version.clone(),
        description: config.swagger.description.clone(),
    };

    let mut openapi = ApiDoc::openapi();
    swagger_modifier.modify(&mut openapi);

    let swagger = if let Some(credentials) = config.swagger.credentials() {
        tracing::info!("Swagger UI basic auth enabled");
        Router::new()
            .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
            .layer(from_fn(middleware::basic_auth_middleware(Arc::new(
                credentials,
            ))))
    } else {
        tracing::info!("Swagger UI basic auth disabled (no credentials configured)");
        Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
    };

    async fn health_check() -> axum::http::StatusCode {
        axum::http::StatusCode::OK
    }
    let health_route = Router::new().route("/health", axum::routing::get(health_check));

    let app = Router::new()
        .merge(swagger)
        .merge(matching_routes::routes(
            Arc::clone(&matcher),
            config.trigger.secret.clone(),
        ))
        .merge(health_route)
        .layer(middleware::cors_layer(
            config.app.cors_allowed_origins.clone(),
        ))
        // Propagate X-Request-Id to response headers
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(middleware::MakeSpanWithRequestId)
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Generate X-Request-Id using UUID v7 (or use client-provided one)
        .layer(SetRequestIdLayer::x_request_id(middleware::MakeRequestUuid));

    let addr = config.app.server_address();
    let socket_addr: std::net::SocketAddr = addr
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid address: {}", e))?;

    let socket = socket2::Socket::new(
        socket2::Domain::for_address(socket_addr),
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    socket.set_reuse_address(true)?;
    socket.set_nodelay(true)?;

    let keepalive = socket2::TcpKeepalive::new().with_time(std::time::Duration::from_secs(60));
    socket.set_tcp_keepalive(&keepalive)?;

    socket.set_nonblocking(true)?;
    socket.bind(&socket_addr.into())?;
    socket.listen(1024)?;

    let listener = tokio::net::TcpListener::from_std(socket.into())?;
    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
