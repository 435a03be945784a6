use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, COOKIE};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use crate::config::ServerConfig;
use crate::error::{AppError, Context, Result};
use crate::stream::{open_event_stream, FrameStream};

use super::AuthBackend;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct AuthStatusResponse {
    authenticated: bool,
}

#[derive(Debug, Deserialize)]
struct AuthLoginResponse {
    auth_url: String,
}

/// HTTP access to the export server. One cookie store is shared by the auth
/// calls and the progress stream so they run under the same server session.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    server: ServerConfig,
}

impl ApiClient {
    pub fn new(server: &ServerConfig) -> Result<Self> {
        let mut base_url = Url::parse(&server.base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let mut headers = HeaderMap::new();
        if let Some(cookie) = &server.session_cookie {
            let value = HeaderValue::from_str(cookie)
                .context("Session cookie contains characters not allowed in a header")?;
            headers.insert(COOKIE, value);
        }

        let http = Client::builder()
            .cookie_store(true)
            .default_headers(headers)
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to construct HTTP client")?;

        Ok(Self {
            http,
            base_url,
            server: server.clone(),
        })
    }

    /// Resolve a route below the base URL, keeping any path prefix it carries.
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    pub async fn open_export_stream(&self) -> Result<FrameStream> {
        let url = self.endpoint(&self.server.export_path)?;
        open_event_stream(&self.http, url).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.endpoint(path)?;
        let response = self
            .http
            .get(url.clone())
            .header(ACCEPT, "application/json")
            .timeout(self.server.request_timeout)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?
            .error_for_status()
            .with_context(|| format!("Request to {} returned an error status", url))?;

        let body = response
            .text()
            .await
            .with_context(|| format!("Failed to read response body from {}", url))?;
        let parsed = serde_json::from_str(&body)
            .with_context(|| format!("Failed to parse JSON response from {}", url))?;
        Ok(parsed)
    }
}

#[async_trait(?Send)]
impl AuthBackend for ApiClient {
    async fn auth_status(&self) -> Result<bool> {
        let status: AuthStatusResponse = self.get_json(&self.server.status_path).await?;
        Ok(status.authenticated)
    }

    async fn login_url(&self) -> Result<String> {
        let login: AuthLoginResponse = self.get_json(&self.server.login_path).await?;
        if login.auth_url.trim().is_empty() {
            return Err(AppError::message("Server returned an empty login URL"));
        }
        Ok(login.auth_url)
    }

    async fn logout(&self) -> Result<()> {
        let url = self.endpoint(&self.server.logout_path)?;
        self.http
            .post(url.clone())
            .timeout(self.server.request_timeout)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?
            .error_for_status()
            .with_context(|| format!("Request to {} returned an error status", url))?;
        Ok(())
    }
}
