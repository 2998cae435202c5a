/// Authentication Middleware
///
/// `hydrate_session` runs on every request and attaches a [`SessionContext`];
/// `require_auth` is the gate placed in front of protected routes.
use crate::auth::manager::SharedAuthManager;
use crate::auth::session::{SessionContext, UserIdentity};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{StatusCode, request::Parts},
    middleware::Next,
    response::Response,
};

/// Read-only identity handed to protected handlers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser(pub UserIdentity);

/// Load the session named by the request cookie, if any
pub async fn hydrate_session(
    State(auth_manager): State<SharedAuthManager>,
    mut req: Request,
    next: Next,
) -> Response {
    let context = auth_manager.hydrate(req.headers()).await;
    req.extensions_mut().insert(context);
    next.run(req).await
}

/// Allow the request only if its session carries an identity. Every
/// rejection is the same bare 401.
pub async fn require_auth(mut req: Request, next: Next) -> Result<Response, StatusCode> {
    let identity = req
        .extensions()
        .get::<SessionContext>()
        .and_then(|context| context.identity())
        .cloned()
        .ok_or(StatusCode::UNAUTHORIZED)?;

    req.extensions_mut().insert(AuthenticatedUser(identity));
    Ok(next.run(req).await)
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthenticatedUser>() {
            return Ok(user.clone());
        }

        parts
            .extensions
            .get::<SessionContext>()
            .and_then(|context| context.identity())
            .cloned()
            .map(AuthenticatedUser)
            .ok_or(StatusCode::UNAUTHORIZED)
    }
}
