use std::collections::BTreeMap;

use reqwest::{redirect::Policy, Client, StatusCode};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("service returned {status}: {body}")]
    Status { status: StatusCode, body: String },
}

/// Result of resolving a short path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Redirect(String),
    NotFound,
}

pub struct RedirectClient {
    client: Client,
    base_url: String,
}

impl RedirectClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        // Redirects must not be followed, otherwise `resolve` would fetch the destination.
        let client = Client::builder().redirect(Policy::none()).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create or overwrite a mapping. Returns the service's confirmation text.
    pub async fn add(&self, path: &str, url: &str) -> Result<String, ClientError> {
        let resp = self
            .client
            .post(format!("{}/add", self.base_url))
            .form(&[("path", path), ("url", url)])
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(ClientError::Status { status, body: text });
        }
        Ok(text)
    }

    /// Fetch the full mapping table.
    pub async fn mappings(&self) -> Result<BTreeMap<String, String>, ClientError> {
        let resp = self.client.get(format!("{}/mappings", self.base_url)).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await?;
            return Err(ClientError::Status { status, body });
        }
        Ok(resp.json().await?)
    }

    /// Look up where `path` redirects without following it.
    pub async fn resolve(&self, path: &str) -> Result<Resolution, ClientError> {
        let resp = self.client.get(format!("{}{}", self.base_url, path)).send().await?;

        match resp.status() {
            StatusCode::FOUND => {
                let location = resp
                    .headers()
                    .get(reqwest::header::LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                Ok(Resolution::Redirect(location))
            }
            StatusCode::NOT_FOUND => Ok(Resolution::NotFound),
            status => {
                let body = resp.text().await?;
                Err(ClientError::Status { status, body })
            }
        }
    }
}
