/// Authentication Routes
///
/// HTTP handlers for the OAuth2 flow: login initiation, provider callback,
/// logout and status. The router returned by [`create_auth_router`] is
/// mounted under both `/auth` and `/api/auth`.
use crate::auth::callback::OAuthCallbackParams;
use crate::auth::manager::{CallbackResult, SharedAuthManager};
use crate::auth::session::{SessionContext, UserIdentity};
use axum::{
    Extension, Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use serde::Serialize;
use tracing::{error, info};

/// JSON response for logout
#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

/// JSON response for the status probe
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub authenticated: bool,
    pub user: Option<UserIdentity>,
}

/// JSON error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, Json(self)).into_response()
    }
}

/// Start OAuth2 login flow - redirects to provider
async fn start_login(
    State(auth_manager): State<SharedAuthManager>,
) -> Result<Redirect, ErrorResponse> {
    let auth_url = auth_manager.start_login().await.map_err(|e| {
        error!(kind = e.kind(), error = %e, "Failed to build authorization URL");
        ErrorResponse {
            error: "login_failed".to_string(),
            message: "Unable to start login".to_string(),
        }
    })?;

    Ok(Redirect::temporary(auth_url.as_str()))
}

/// Handle the provider callback and hand the browser back to the SPA.
/// Exactly one redirect is produced; the cookie is set only on success.
pub async fn google_callback(
    State(auth_manager): State<SharedAuthManager>,
    context: Option<Extension<SessionContext>>,
    Query(params): Query<OAuthCallbackParams>,
) -> Response {
    let redirects = auth_manager.redirects();
    let previous = context.map(|Extension(c)| c).unwrap_or_default();

    match auth_manager.handle_callback(params, &previous).await {
        CallbackResult::LoggedIn(cookie) => {
            info!("Login completed, redirecting to SPA");
            let jar = auth_manager.sessions().cookie().empty_jar().add(cookie);
            (jar, Redirect::to(&redirects.success)).into_response()
        }
        CallbackResult::Failed(_) => Redirect::to(&redirects.failure).into_response(),
    }
}

/// Logout handler - destroys session
async fn logout(
    State(auth_manager): State<SharedAuthManager>,
    context: Option<Extension<SessionContext>>,
) -> Response {
    let context = context.map(|Extension(c)| c).unwrap_or_default();
    let removal = auth_manager.logout(&context).await;
    let jar = auth_manager.sessions().cookie().empty_jar().add(removal);

    (jar, Json(LogoutResponse { success: true })).into_response()
}

/// Status endpoint - check authentication status
async fn auth_status(context: Option<Extension<SessionContext>>) -> Json<StatusResponse> {
    let user = context.and_then(|Extension(c)| c.identity().cloned());

    Json(StatusResponse {
        authenticated: user.is_some(),
        user,
    })
}

/// Create authentication router with all routes
pub fn create_auth_router(auth_manager: SharedAuthManager) -> Router {
    Router::new()
        .route("/google", get(start_login))
        .route("/logout", get(logout).post(logout))
        .route("/status", get(auth_status))
        .with_state(auth_manager)
}
