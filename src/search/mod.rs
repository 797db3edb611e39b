mod serpapi;

pub use serpapi::SerpApiClient;

use crate::Result;
use async_trait::async_trait;

/// Web search capability exposed to the agent as its `search` tool.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Runs `query` and returns a plain-text digest of the results.
    async fn search(&self, query: &str) -> Result<String>;
}
