/// Top-level pages: the landing page and the gated `/protected` probe
use crate::auth::{AuthenticatedUser, UserIdentity};
use axum::{Json, response::Html};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ProtectedResponse {
    pub message: &'static str,
    pub user: UserIdentity,
}

pub async fn landing_page() -> Html<&'static str> {
    Html(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Sign In</title>
</head>
<body>
    <main>
        <h1>Welcome</h1>
        <p><a href="/auth/google">Sign in with Google</a></p>
    </main>
</body>
</html>"#,
    )
}

pub async fn protected(AuthenticatedUser(user): AuthenticatedUser) -> Json<ProtectedResponse> {
    Json(ProtectedResponse {
        message: "You're authenticated!",
        user,
    })
}
