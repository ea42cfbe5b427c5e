use std::time::Duration;
use url::Url;

/// Client for the full-text search index.
#[derive(Clone)]
pub struct SearchClient {
    base_url: Url,
    http: reqwest::Client,
}

impl SearchClient {
    pub fn new(url: &str) -> Result<Self, SearchError> {
        let base_url = Url::parse(url)?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(SearchError::UnsupportedScheme(base_url.scheme().to_string()));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Returns whether the index answered its root endpoint successfully.
    pub async fn ping(&self) -> Result<bool, SearchError> {
        let response = self.http.get(self.base_url.clone()).send().await?;
        Ok(response.status().is_success())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Invalid search URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Unsupported search URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Search request failed: {0}")]
    Http(#[from] reqwest::Error),
}
