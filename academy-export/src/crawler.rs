//! Fetches rendered pages from the running server.

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("{path}: timed out")]
    Timeout { path: String },

    #[error("{path}: HTTP {status}")]
    Status { path: String, status: u16 },

    #[error("{path}: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl FetchError {
    fn from_reqwest(path: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout {
                path: path.to_string(),
            }
        } else {
            FetchError::Transport {
                path: path.to_string(),
                source: err,
            }
        }
    }
}

/// Sequential page fetcher bound to one server
#[derive(Debug, Clone)]
pub struct Crawler {
    client: reqwest::Client,
    base_url: String,
}

impl Crawler {
    /// `timeout` bounds each request, including reading the body
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// GET one page path; any non-2xx status is an error
    pub async fn fetch(&self, path: &str) -> Result<String, FetchError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(path, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                path: path.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(path, e))
    }
}
