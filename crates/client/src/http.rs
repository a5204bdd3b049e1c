//! GET-only command client for the HTTP channel device.

use reqwest::Client;
use rd_domain::{Config, Error, Result};

/// Issues `GET {base}/{route}/{value}` against the channel device.
///
/// Responses are logged and discarded; the device answers every command
/// with its full state, which nothing here consumes.
#[derive(Debug, Clone)]
pub struct HttpCommandClient {
    http: Client,
    base_url: String,
}

impl HttpCommandClient {
    /// Build a client for `config.target_ip:target_port` with the configured
    /// request timeout.
    pub fn new(config: &Config) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.http_timeout())
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.http_base_url(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, route: &str, value: &str) -> String {
        format!("{}/{}/{}", self.base_url, route, value)
    }

    /// Fire one command.  Non-2xx statuses are not errors.
    pub async fn get(&self, route: &str, value: &str) -> Result<()> {
        let url = self.url(route, value);
        let resp = self.http.get(&url).send().await.map_err(|e| {
            tracing::warn!(url = %url, error = %e, "HTTP command failed");
            Error::Http(e.to_string())
        })?;

        tracing::debug!(url = %url, status = resp.status().as_u16(), "HTTP command sent");
        Ok(())
    }
}
