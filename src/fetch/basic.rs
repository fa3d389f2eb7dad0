use super::client::HttpClient;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::Path;

/// Plain `reqwest` client. No timeouts are configured; the library defaults apply.
pub struct BasicClient(reqwest::Client);

impl BasicClient {
    pub fn new() -> Self {
        Self(reqwest::Client::new())
    }

    /// Builds a client that additionally trusts the PEM certificates in `path`.
    pub fn with_root_certificates(path: &Path) -> Result<Self> {
        let pem = std::fs::read(path)
            .with_context(|| format!("reading trust bundle {}", path.display()))?;
        let mut builder = reqwest::Client::builder();
        for cert in reqwest::Certificate::from_pem_bundle(&pem)
            .with_context(|| format!("parsing PEM bundle {}", path.display()))?
        {
            builder = builder.add_root_certificate(cert);
        }
        Ok(Self(builder.build()?))
    }
}

impl Default for BasicClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for BasicClient {
    async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        self.0.execute(req).await
    }
}
