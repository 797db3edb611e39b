use super::SearchProvider;
use crate::{Error, Result, config::SearchConfig};
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

const NO_RESULT: &str = "No good search result found";
const MAX_SNIPPETS: usize = 5;

pub struct SerpApiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    engine: String,
}

impl SerpApiClient {
    pub fn new(api_key: impl Into<String>, config: &SearchConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            engine: config.engine.clone(),
        }
    }

    /// Builds a client when an API key is configured.
    pub fn from_config(config: &SearchConfig) -> Option<Self> {
        config
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .map(|key| Self::new(key, config))
    }
}

#[async_trait]
impl SearchProvider for SerpApiClient {
    async fn search(&self, query: &str) -> Result<String> {
        debug!("Searching SerpAPI ({}) for: {}", self.engine, query);

        let response = self
            .http
            .get(format!("{}/search", self.base_url))
            .query(&[
                ("engine", self.engine.as_str()),
                ("q", query),
                ("api_key", self.api_key.as_str()),
                ("output", "json"),
            ])
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        let body = serde_json::from_str::<Value>(&text);
        let reported = body
            .as_ref()
            .ok()
            .and_then(|body| body.get("error"))
            .and_then(Value::as_str);

        if !status.is_success() {
            return Err(Error::search(match reported {
                Some(error) => format!("SerpAPI request failed ({}): {}", status, error),
                None => format!("SerpAPI request failed ({})", status),
            }));
        }
        if let Some(error) = reported {
            return Err(Error::search(format!("Got error from SerpAPI: {}", error)));
        }

        let body = body
            .map_err(|e| Error::search(format!("Unreadable SerpAPI response: {}", e)))?;
        Ok(digest(&body))
    }
}

/// Picks the most direct answer SerpAPI offers, falling back to organic
/// result snippets.
fn digest(body: &Value) -> String {
    let answer_box = match body.get("answer_box") {
        Some(Value::Array(boxes)) => boxes.first(),
        other => other,
    };

    if let Some(answer_box) = answer_box {
        for key in ["result", "answer", "snippet"] {
            if let Some(text) = answer_box.get(key).and_then(Value::as_str) {
                return text.to_string();
            }
        }
        if let Some(words) = answer_box
            .get("snippet_highlighted_words")
            .and_then(Value::as_array)
        {
            let words: Vec<&str> = words.iter().filter_map(Value::as_str).collect();
            if !words.is_empty() {
                return words.join(", ");
            }
        }
    }

    if let Some(spotlight) = body
        .get("sports_results")
        .and_then(|sports| sports.get("game_spotlight"))
    {
        return spotlight.to_string();
    }

    let mut snippets = Vec::new();

    if let Some(graph) = body.get("knowledge_graph") {
        let title = graph.get("title").and_then(Value::as_str);
        if let Some(description) = graph.get("description").and_then(Value::as_str) {
            match title {
                Some(title) => snippets.push(format!("{}: {}", title, description)),
                None => snippets.push(description.to_string()),
            }
        }
    }

    if let Some(results) = body.get("organic_results").and_then(Value::as_array) {
        snippets.extend(
            results
                .iter()
                .filter_map(|result| result.get("snippet").and_then(Value::as_str))
                .take(MAX_SNIPPETS)
                .map(str::to_string),
        );
    }

    if snippets.is_empty() {
        NO_RESULT.to_string()
    } else {
        snippets.join("\n")
    }
}
