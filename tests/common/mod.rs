#![allow(dead_code)]

use authgate::auth::{
    AuthConfig, AuthManager, ProviderConfig, ProvidersConfig, SessionStore, SharedAuthManager,
};
use authgate::collaborators::ResourceRouters;
use authgate::config::Config;
use authgate::cors::TrustedOrigin;
use authgate::{build_app, start_server_with_config};
use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, header};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const SPA_ORIGIN: &str = "http://localhost:5173";
pub const SECRET: &str = "integration-test-secret-0123456789abcdef";

/// Auth configuration pointing the provider endpoints at a mock server
pub fn auth_config(provider: &MockServer) -> AuthConfig {
    AuthConfig {
        session_secret: SECRET.to_string(),
        provider_timeout_secs: 2,
        providers: ProvidersConfig {
            google: Some(ProviderConfig {
                client_id: "test-client".to_string(),
                client_secret: "test-secret".to_string(),
                redirect_uri: "http://localhost:3000/google/callback".to_string(),
                token_url: Some(format!("{}/token", provider.uri())),
                userinfo_url: Some(format!("{}/userinfo", provider.uri())),
                ..Default::default()
            }),
        },
        ..Default::default()
    }
}

/// Builder for an in-process application wired to a mock provider
pub struct TestAppBuilder {
    production: bool,
    session_ttl_secs: Option<u64>,
    resources: ResourceRouters,
}

impl TestAppBuilder {
    pub fn production(mut self, production: bool) -> Self {
        self.production = production;
        self
    }

    pub fn session_ttl_secs(mut self, ttl: u64) -> Self {
        self.session_ttl_secs = Some(ttl);
        self
    }

    pub fn resources(mut self, resources: ResourceRouters) -> Self {
        self.resources = resources;
        self
    }

    pub async fn build(self) -> TestApp {
        let provider = MockServer::start().await;
        let mut config = auth_config(&provider);
        if let Some(ttl) = self.session_ttl_secs {
            config.session_ttl_secs = ttl;
        }

        let manager: SharedAuthManager =
            Arc::new(AuthManager::from_config(&config, SPA_ORIGIN, self.production).unwrap());
        let origin = TrustedOrigin::parse(SPA_ORIGIN).unwrap();
        let router = build_app(Arc::clone(&manager), &origin, self.resources).unwrap();

        TestApp {
            router,
            manager,
            provider,
        }
    }
}

pub struct TestApp {
    pub router: Router,
    pub manager: SharedAuthManager,
    pub provider: MockServer,
}

impl TestApp {
    pub fn builder() -> TestAppBuilder {
        TestAppBuilder {
            production: false,
            session_ttl_secs: None,
            resources: ResourceRouters::new(),
        }
    }

    pub async fn new() -> Self {
        Self::builder().build().await
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::get(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    /// Mock a provider that accepts any code and returns the given profile
    pub async fn mock_provider_success(&self, sub: &str, name: &str) {
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "mock-access-token",
                "token_type": "Bearer",
                "expires_in": 3599
            })))
            .mount(&self.provider)
            .await;
        Mock::given(method("GET"))
            .and(path("/userinfo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "sub": sub,
                "name": name,
                "email": format!("{}@example.com", sub)
            })))
            .mount(&self.provider)
            .await;
    }

    /// Begin a login and return the anti-replay state from the provider redirect
    pub async fn begin_login(&self, mount: &str) -> String {
        let response = self.get(&format!("{}/google", mount), None).await;
        assert_eq!(response.status(), 307);

        let location = response.headers()[header::LOCATION].to_str().unwrap();
        let url = url::Url::parse(location).unwrap();
        url.query_pairs()
            .find(|(k, _)| k == "state")
            .map(|(_, v)| v.into_owned())
            .unwrap()
    }

    /// Run the complete login flow and return the `name=value` cookie pair
    pub async fn login(&self, sub: &str, name: &str) -> String {
        self.mock_provider_success(sub, name).await;
        let state = self.begin_login("/auth").await;

        let response = self
            .get(
                &format!("/google/callback?code=auth-code&state={}", state),
                None,
            )
            .await;
        assert_eq!(response.status(), 303);

        cookie_pair(&single_set_cookie(&response))
    }

    pub async fn session_count(&self) -> usize {
        self.manager.sessions().store().len().await
    }
}

pub fn set_cookies<B>(response: &Response<B>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

pub fn single_set_cookie<B>(response: &Response<B>) -> String {
    let cookies = set_cookies(response);
    assert_eq!(cookies.len(), 1, "expected exactly one Set-Cookie: {:?}", cookies);
    cookies.into_iter().next().unwrap()
}

/// The `name=value` part of a Set-Cookie header
pub fn cookie_pair(set_cookie: &str) -> String {
    set_cookie.split(';').next().unwrap().trim().to_string()
}

pub fn cookie_attributes(set_cookie: &str) -> Vec<String> {
    set_cookie
        .split(';')
        .skip(1)
        .map(|a| a.trim().to_string())
        .collect()
}

pub async fn body_bytes(response: Response<Body>) -> axum::body::Bytes {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// Test server with proper shutdown support
pub struct TestServer {
    port: u16,
    shutdown_tx: Option<oneshot::Sender<()>>,
    _provider: MockServer,
}

impl TestServer {
    /// Start a server on a free local port
    pub async fn start() -> anyhow::Result<Self> {
        let provider = MockServer::start().await;
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 0,
            auth: auth_config(&provider),
            ..Default::default()
        };

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let port = start_server_with_config(config, ResourceRouters::new(), shutdown_rx).await?;

        Ok(Self {
            port,
            shutdown_tx: Some(shutdown_tx),
            _provider: provider,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://127.0.0.1:{}{}", self.port, path)
    }

    /// Shutdown the server gracefully
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            // Give server time to shut down
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
