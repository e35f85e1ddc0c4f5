//! Typed client for the remote REST API.
//!
//! Every call attaches the session's bearer credential. A 401 triggers one
//! refresh through `/auth/refresh` followed by one retry; if the refresh is
//! rejected the session is cleared and [`ApiError::Unauthorized`] is returned.

mod auth;
mod characters;
mod conversations;
pub mod error;
mod knowledge;
pub mod models;
mod voice;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::api::models::{AuthTokens, RefreshRequest};
use crate::core::store::SessionStore;
use crate::utils::url::construct_api_url;

pub use error::ApiError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: SessionStore,
    refresh_lock: Arc<tokio::sync::Mutex<()>>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, session: SessionStore) -> Self {
        Self::with_http_client(reqwest::Client::new(), base_url, session)
    }

    pub fn with_http_client(
        http: reqwest::Client,
        base_url: impl Into<String>,
        session: SessionStore,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            session,
            refresh_lock: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn http_client(&self) -> &reqwest::Client {
        &self.http
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    fn url(&self, endpoint: &str) -> String {
        construct_api_url(&self.base_url, endpoint)
    }

    /// Send a request that does not need (or must not use) the session, such
    /// as login and registration.
    async fn execute_public<F>(&self, endpoint: &str, build: F) -> ApiResult<Response>
    where
        F: Fn(&reqwest::Client, String) -> RequestBuilder,
    {
        let response = build(&self.http, self.url(endpoint)).send().await?;
        check_status(response).await
    }

    async fn execute<F>(&self, endpoint: &str, build: F) -> ApiResult<Response>
    where
        F: Fn(&reqwest::Client, String) -> RequestBuilder,
    {
        let used_token = self.session.access_token();
        let response = with_bearer(build(&self.http, self.url(endpoint)), used_token.as_deref())
            .send()
            .await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return check_status(response).await;
        }

        debug!(endpoint, "access token rejected, refreshing");
        let fresh_token = self.refresh_after_rejection(used_token.as_deref()).await?;
        let retried = with_bearer(build(&self.http, self.url(endpoint)), Some(&fresh_token))
            .send()
            .await?;

        if retried.status() == StatusCode::UNAUTHORIZED {
            warn!(endpoint, "refreshed token rejected, signing out");
            self.session.clear();
        }
        check_status(retried).await
    }

    /// Serialize refreshes so concurrent 401s share one `/auth/refresh` call.
    async fn refresh_after_rejection(&self, rejected: Option<&str>) -> ApiResult<String> {
        let _guard = self.refresh_lock.lock().await;

        if let Some(current) = self.session.access_token() {
            if Some(current.as_str()) != rejected {
                return Ok(current);
            }
        }

        let Some(refresh_token) = self.session.refresh_token() else {
            self.session.clear();
            return Err(ApiError::Unauthorized { detail: None });
        };

        let tokens = match self.refresh_tokens(&refresh_token).await {
            Ok(tokens) => tokens,
            Err(err @ ApiError::Transport(_)) => return Err(err),
            Err(err) => {
                warn!(error = %err, "credential refresh failed, signing out");
                self.session.clear();
                return Err(ApiError::Unauthorized {
                    detail: match err {
                        ApiError::Unauthorized { detail } => detail,
                        ApiError::Status { detail, .. } => detail,
                        _ => None,
                    },
                });
            }
        };

        self.session.set_tokens(&tokens);
        Ok(tokens.access_token)
    }

    /// `POST /auth/refresh`. Does not touch the session.
    pub async fn refresh_tokens(&self, refresh_token: &str) -> ApiResult<AuthTokens> {
        let endpoint = "auth/refresh";
        let body = RefreshRequest { refresh_token };
        let response = self
            .execute_public(endpoint, |http, url| http.post(url).json(&body))
            .await?;
        decode(endpoint, response).await
    }

    pub(crate) async fn get_json<T>(&self, endpoint: &str, query: &[(&str, String)]) -> ApiResult<T>
    where
        T: DeserializeOwned,
    {
        let response = self
            .execute(endpoint, |http, url| http.get(url).query(query))
            .await?;
        decode(endpoint, response).await
    }

    pub(crate) async fn send_json<B, T>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
    ) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .execute(endpoint, |http, url| {
                let request = http.request(method.clone(), url);
                match body {
                    Some(body) => request.json(body),
                    None => request,
                }
            })
            .await?;
        decode(endpoint, response).await
    }

    /// Send a request whose response body is irrelevant.
    pub(crate) async fn send_unit(&self, method: Method, endpoint: &str) -> ApiResult<()> {
        self.execute(endpoint, |http, url| http.request(method.clone(), url))
            .await
            .map(|_| ())
    }
}

fn with_bearer(request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
    match token {
        Some(token) => request.bearer_auth(token),
        None => request,
    }
}

async fn check_status(response: Response) -> ApiResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<no body>".to_string());
    Err(ApiError::from_status(status, body))
}

async fn decode<T: DeserializeOwned>(endpoint: &str, response: Response) -> ApiResult<T> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|source| ApiError::Decode {
        endpoint: endpoint.to_string(),
        source,
    })
}
