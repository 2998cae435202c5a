//! Mounting of the resource routers supplied by the embedding application.
//!
//! The handlers themselves live outside this crate. Each router is nested
//! under its `/api/...` prefix behind [`require_auth`] and sees the caller
//! only through the [`AuthenticatedUser`](crate::auth::AuthenticatedUser)
//! extractor.

use crate::auth::require_auth;
use axum::{Router, middleware};
use tracing::debug;

#[derive(Default)]
pub struct ResourceRouters {
    pub tickets: Option<Router>,
    pub users: Option<Router>,
    pub favorites: Option<Router>,
    pub topics: Option<Router>,
}

impl ResourceRouters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tickets(mut self, router: Router) -> Self {
        self.tickets = Some(router);
        self
    }

    pub fn users(mut self, router: Router) -> Self {
        self.users = Some(router);
        self
    }

    pub fn favorites(mut self, router: Router) -> Self {
        self.favorites = Some(router);
        self
    }

    pub fn topics(mut self, router: Router) -> Self {
        self.topics = Some(router);
        self
    }

    /// Nest every supplied router into `app`, each one gated
    pub fn mount(self, mut app: Router) -> Router {
        let mounts = [
            ("/api/tickets", self.tickets),
            ("/api/users", self.users),
            ("/api/favorites", self.favorites),
            ("/api/topics", self.topics),
        ];

        for (prefix, router) in mounts {
            if let Some(router) = router {
                debug!(prefix, "Mounting resource router");
                app = app.nest(prefix, router.layer(middleware::from_fn(require_auth)));
            }
        }

        app
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, http::StatusCode, routing::get};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_mounted_router_is_gated() {
        let app = ResourceRouters::new()
            .topics(Router::new().route("/", get(|| async { "topics" })))
            .mount(Router::new());

        let response = app
            .clone()
            .oneshot(Request::get("/api/topics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        // Absent collaborators are simply not routed
        let response = app
            .oneshot(Request::get("/api/tickets").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
