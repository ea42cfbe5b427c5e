/// Handle on the key/value store that backs caching and the task queue.
#[derive(Clone)]
pub struct CacheClient {
    client: redis::Client,
    url: String,
}

impl CacheClient {
    /// Parses the URL without connecting; connections are opened on demand.
    pub fn from_url(url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(url).map_err(|source| CacheError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn client(&self) -> &redis::Client {
        &self.client
    }

    pub async fn ping(&self) -> Result<(), CacheError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Invalid cache URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: redis::RedisError,
    },

    #[error("Cache connection failed: {0}")]
    Connection(#[from] redis::RedisError),
}
