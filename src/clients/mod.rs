//! Gateways to the three backend services.
//!
//! Each gateway is bound to its own base address and shares one request core,
//! [`ServiceClient`], which attaches the session token as a bearer credential
//! and turns every failure into a typed [`RequestError`]. Field vocabulary is
//! translated in [`wire`] and nowhere else.

pub mod purchases;
pub mod users;
pub mod vehicles;
pub mod wire;

pub use purchases::{PurchasesApi, PurchasesClient};
pub use users::{LoginSession, ProfileTarget, UsersApi, UsersClient};
pub use vehicles::{VehiclesApi, VehiclesClient};

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::constants::USER_AGENT;
use crate::constants::messages::GENERIC_ERROR;
use crate::notify::Notifier;
use crate::session::SessionStore;

/// A single gateway call failed. Nothing is retried.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("{service} service unreachable: {message}")]
    Transport {
        service: &'static str,
        message: String,
    },

    #[error("{message}")]
    Status {
        service: &'static str,
        status: u16,
        message: String,
    },

    #[error("{service} service sent an unexpected response: {message}")]
    Decode {
        service: &'static str,
        message: String,
    },
}

impl RequestError {
    #[must_use]
    pub const fn service(&self) -> &'static str {
        match self {
            Self::Transport { service, .. }
            | Self::Status { service, .. }
            | Self::Decode { service, .. } => service,
        }
    }

    /// HTTP status of the failed response, if one arrived.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The text a user should see: the backend's own message when it sent
    /// one, a generic apology otherwise.
    #[must_use]
    pub fn user_message(&self) -> &str {
        match self {
            Self::Status { message, .. } => message,
            Self::Transport { .. } | Self::Decode { .. } => GENERIC_ERROR,
        }
    }

    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }
}

/// Which layer presents gateway failures to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorReporting {
    /// The gateway stays quiet; whoever called it decides what to show.
    #[default]
    Caller,
    /// The gateway notifies on every failure, and callers may notify again.
    Gateway,
}

/// Builds the HTTP client shared by all gateways so they pool connections.
/// A zero timeout means requests may wait indefinitely.
pub fn build_http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    let mut builder = Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers);

    if !timeout.is_zero() {
        builder = builder.timeout(timeout);
    }

    builder.build()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reporting {
    Normal,
    Silent,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Request core shared by the gateways.
#[derive(Clone)]
pub struct ServiceClient {
    http: Client,
    service: &'static str,
    base_url: String,
    session: Arc<dyn SessionStore>,
    reporter: Option<Arc<dyn Notifier>>,
}

impl ServiceClient {
    pub fn new(
        http: Client,
        service: &'static str,
        base_url: &str,
        session: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            http,
            service,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
            reporter: None,
        }
    }

    /// Notify through `notifier` on every failure, before the error reaches
    /// the caller.
    #[must_use]
    pub fn with_reporter(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.reporter = Some(notifier);
        self
    }

    #[must_use]
    pub const fn service(&self) -> &'static str {
        self.service
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Absolute URL for `path` with the given query pairs.
    pub fn url_with_query(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, RequestError> {
        let mut url = Url::parse(&self.url(path)).map_err(|e| RequestError::Transport {
            service: self.service,
            message: format!("invalid url: {e}"),
        })?;

        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }

        Ok(url)
    }

    /// Starts a request and attaches the stored token, if any.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.authorize(self.http.request(method, self.url(path)))
    }

    pub fn request_url(&self, method: Method, url: Url) -> RequestBuilder {
        self.authorize(self.http.request(method, url))
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.session.read() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Sends the request and decodes a JSON body.
    pub async fn fetch<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, RequestError> {
        self.fetch_with(builder, Reporting::Normal).await
    }

    /// Like [`Self::fetch`], but failures are never reported to the user.
    pub async fn fetch_silently<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T, RequestError> {
        self.fetch_with(builder, Reporting::Silent).await
    }

    /// Sends the request and discards whatever body comes back.
    pub async fn execute(&self, builder: RequestBuilder) -> Result<(), RequestError> {
        self.send(builder, Reporting::Normal).await.map(|_| ())
    }

    async fn fetch_with<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        reporting: Reporting,
    ) -> Result<T, RequestError> {
        let response = self.send(builder, reporting).await?;

        let result = match response.text().await {
            Ok(body) => serde_json::from_str::<T>(&body).map_err(|e| RequestError::Decode {
                service: self.service,
                message: e.to_string(),
            }),
            Err(e) => Err(RequestError::Transport {
                service: self.service,
                message: e.to_string(),
            }),
        };

        result.map_err(|err| self.report(err, reporting))
    }

    async fn send(&self, builder: RequestBuilder, reporting: Reporting) -> Result<Response, RequestError> {
        let response = builder.send().await.map_err(|e| {
            self.report(
                RequestError::Transport {
                    service: self.service,
                    message: e.to_string(),
                },
                reporting,
            )
        })?;

        let status = response.status();
        debug!(service = self.service, url = %response.url(), status = status.as_u16(), "Response received");

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = extract_message(&body);

        Err(self.report(
            RequestError::Status {
                service: self.service,
                status: status.as_u16(),
                message,
            },
            reporting,
        ))
    }

    fn report(&self, err: RequestError, reporting: Reporting) -> RequestError {
        warn!(service = self.service, status = ?err.status(), error = %err, "Request failed");

        if reporting == Reporting::Normal
            && let Some(notifier) = &self.reporter
        {
            notifier.error(err.user_message());
        }

        err
    }
}

/// Pulls `message` out of an error body, falling back to the generic text.
fn extract_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| GENERIC_ERROR.to_string())
}
