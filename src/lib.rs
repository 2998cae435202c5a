use axum::{Router, middleware, routing::get};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

pub mod auth;
pub mod collaborators;
pub mod config;
pub mod cors;
pub mod routes;

use auth::{AuthManager, SharedAuthManager, create_auth_router, google_callback};
use collaborators::ResourceRouters;
use cors::TrustedOrigin;

/// Assembles the full application router.
///
/// Every request passes the CORS filter, then session hydration. `/protected`
/// and the collaborator routers additionally sit behind the auth gate.
pub fn build_app(
    auth_manager: SharedAuthManager,
    origin: &TrustedOrigin,
    resources: ResourceRouters,
) -> anyhow::Result<Router> {
    let callback = Router::new()
        .route(auth::config::CALLBACK_PATH, get(google_callback))
        .with_state(Arc::clone(&auth_manager));

    let app = Router::new()
        .route("/", get(routes::landing_page))
        .route(
            "/protected",
            get(routes::protected).layer(middleware::from_fn(auth::require_auth)),
        )
        .nest("/auth", create_auth_router(Arc::clone(&auth_manager)))
        .nest("/api/auth", create_auth_router(Arc::clone(&auth_manager)))
        .merge(callback);

    let app = resources
        .mount(app)
        .layer(middleware::from_fn_with_state(
            auth_manager,
            auth::hydrate_session,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors::cors_layer(origin)?);

    Ok(app)
}

/// Periodically purge expired sessions and anti-replay states
pub fn spawn_maintenance(auth_manager: SharedAuthManager, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        // The first tick completes immediately
        interval.tick().await;

        loop {
            interval.tick().await;
            let (sessions, states) = auth_manager.cleanup_expired().await;
            debug!(sessions, states, "Maintenance sweep finished");
        }
    })
}

/// Starts the web server with custom configuration
///
/// This function:
/// 1. Validates the configuration
/// 2. Builds the authentication manager and the router
/// 3. Binds the configured address (port 0 picks a free port)
/// 4. Serves in the background until the shutdown signal fires
///
/// Returns the port actually bound.
pub async fn start_server_with_config(
    config: config::Config,
    resources: ResourceRouters,
    shutdown_rx: tokio::sync::oneshot::Receiver<()>,
) -> anyhow::Result<u16> {
    let origin = config.validate()?;

    let auth_manager: SharedAuthManager = Arc::new(AuthManager::from_config(
        &config.auth,
        origin.as_str(),
        config.production,
    )?);

    let app = build_app(Arc::clone(&auth_manager), &origin, resources)?;

    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind {}: {}", addr, e))?;
    let port = listener.local_addr()?.port();

    info!("listening on {}:{}", config.host, port);
    debug!(
        spa_origin = %origin,
        production = config.production,
        "Server configuration - host: {}, port: {}",
        config.host,
        port
    );

    let maintenance = spawn_maintenance(auth_manager, config.cleanup_interval());

    tokio::spawn(async move {
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                info!("shutdown requested, draining connections");
            })
            .await;

        maintenance.abort();
        if let Err(e) = result {
            error!(error = %e, "Server error");
        }
    });

    Ok(port)
}
