//! Tower bearer-token middleware backed by [`IdentityResolver`].
//!
//! `AuthLayer` and `AuthService` resolve the bearer token of each request to
//! a local [`User`](crate::User) and store it in request extensions.
//! Rejection diagnostics are logged, never sent to the client.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::response::IntoResponse;
use http::{Request, StatusCode};
use tower::{Layer, Service};

use crate::error::AuthError;
use crate::resolver::ResolutionOutcome;
use crate::{AuthConfig, IdentityResolver};

/// Tower `Layer` that wraps services with token authentication.
#[derive(Clone)]
pub struct AuthLayer {
    resolver: Arc<IdentityResolver>,
    config: AuthConfig,
}

impl AuthLayer {
    /// Create a new auth layer with the given resolver and config.
    pub fn new(resolver: Arc<IdentityResolver>, config: AuthConfig) -> Self {
        Self { resolver, config }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthService {
            inner,
            resolver: self.resolver.clone(),
            config: self.config.clone(),
        }
    }
}

/// Tower `Service` that resolves bearer tokens before forwarding requests.
#[derive(Clone)]
pub struct AuthService<S> {
    inner: S,
    resolver: Arc<IdentityResolver>,
    config: AuthConfig,
}

impl<S> Service<Request<Body>> for AuthService<S>
where
    S: Service<Request<Body>, Error = Infallible> + Clone + Send + 'static,
    S::Response: IntoResponse,
    S::Future: Send,
{
    type Response = axum::response::Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        let resolver = self.resolver.clone();
        let config = self.config.clone();

        Box::pin(async move {
            // Dev mode, no auth required
            if !config.enabled {
                let resp = inner
                    .call(req)
                    .await
                    .unwrap_or_else(|infallible| match infallible {});
                return Ok(resp.into_response());
            }

            let token = match extract_bearer_token(&req) {
                Some(t) => t.to_string(),
                None => {
                    return Ok(unauthorized_response(
                        &config,
                        "missing or invalid bearer token",
                    ));
                }
            };

            match resolver
                .resolve_within(&token, config.resolve_timeout())
                .await
            {
                Ok(ResolutionOutcome::Authenticated(user)) => {
                    log::debug!("Request authenticated as {}", user.email);
                    req.extensions_mut().insert(user);
                    let resp = inner
                        .call(req)
                        .await
                        .unwrap_or_else(|infallible| match infallible {});
                    Ok(resp.into_response())
                }
                Ok(ResolutionOutcome::Rejected(rejection)) => {
                    log::warn!("Authentication failed: {rejection}");
                    Ok(unauthorized_response(&config, "authentication failed"))
                }
                Err(auth_err) => {
                    log::warn!("Authentication protocol error: {auth_err}");
                    Ok(protocol_error_response(&auth_err))
                }
            }
        })
    }
}

/// Extract bearer token from the Authorization header.
fn extract_bearer_token(req: &Request<Body>) -> Option<&str> {
    req.headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn error_body(category: &str, message: &str) -> String {
    let body = serde_json::json!({
        "error": {
            "category": category,
            "message": message,
        }
    });
    serde_json::to_string(&body).unwrap_or_default()
}

/// Build a 401 Unauthorized response with WWW-Authenticate header.
fn unauthorized_response(config: &AuthConfig, message: &str) -> axum::response::Response {
    let www_auth = match &config.realm {
        Some(realm) => format!(r#"Bearer realm="{realm}", error="invalid_token""#),
        None => r#"Bearer error="invalid_token""#.to_string(),
    };

    let mut response = (
        StatusCode::UNAUTHORIZED,
        [(http::header::CONTENT_TYPE, "application/json")],
        error_body("authentication", message),
    )
        .into_response();

    if let Ok(value) = http::HeaderValue::from_str(&www_auth) {
        response
            .headers_mut()
            .insert(http::header::WWW_AUTHENTICATE, value);
    }

    response
}

/// 400 for malformed requests, 500 for failures on our side.
fn protocol_error_response(err: &AuthError) -> axum::response::Response {
    let (status, category) = if err.is_client_error() {
        (StatusCode::BAD_REQUEST, "invalid_request")
    } else {
        (StatusCode::INTERNAL_SERVER_ERROR, "internal")
    };
    (
        status,
        [(http::header::CONTENT_TYPE, "application/json")],
        error_body(category, &err.to_string()),
    )
        .into_response()
}
