//! HTTP transport used for both the server ping and the KVM button presses.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;

use crate::credentials::Credentials;
use crate::error::{Result, TransportError};

/// Sends a request and reports the response status, nothing more.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// `GET url` with no body and no credentials
    async fn get(&self, url: &str) -> std::result::Result<StatusCode, TransportError>;

    /// `POST url` with no body, authenticated with basic auth
    async fn post(
        &self,
        url: &str,
        credentials: &Credentials,
    ) -> std::result::Result<StatusCode, TransportError>;
}

/// `HttpTransport` backed by one shared reqwest client
#[derive(Clone)]
pub struct ReqwestTransport {
    http: Client,
}

impl ReqwestTransport {
    /// Every request sent through this transport gives up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("kvm-watchdog/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self { http })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str) -> std::result::Result<StatusCode, TransportError> {
        let response = self.http.get(url).send().await?;
        debug!("GET {} -> {}", url, response.status());
        Ok(response.status())
    }

    async fn post(
        &self,
        url: &str,
        credentials: &Credentials,
    ) -> std::result::Result<StatusCode, TransportError> {
        let response = self
            .http
            .post(url)
            .basic_auth(credentials.username(), Some(credentials.secret()))
            .send()
            .await?;
        debug!("POST {} -> {}", url, response.status());
        Ok(response.status())
    }
}
