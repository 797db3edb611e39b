use async_trait::async_trait;
use search_gateway::{
    Error, Result,
    llm::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage, Choice, LlmClient},
    search::SearchProvider,
};
use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

/// Mock LLM client for testing
#[derive(Debug)]
pub struct MockLlmClient {
    pub responses: Arc<Mutex<Vec<ChatCompletionResponse>>>,
    pub requests: Arc<Mutex<Vec<ChatCompletionRequest>>>,
    pub error: Option<String>,
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            error: None,
        }
    }

    /// Answers every request with `text`.
    pub fn answering(text: &str) -> Self {
        Self::new().with_responses(vec![create_text_response(text)])
    }

    pub fn with_responses(self, responses: Vec<ChatCompletionResponse>) -> Self {
        *self.responses.lock().unwrap() = responses;
        self
    }

    pub fn with_error(mut self, error: String) -> Self {
        self.error = Some(error);
        self
    }

    pub fn get_requests(&self) -> Vec<ChatCompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn create_chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse> {
        self.requests.lock().unwrap().push(request);

        if let Some(ref error) = self.error {
            return Err(Error::llm(error.clone()));
        }

        let mut responses = self.responses.lock().unwrap();
        match responses.len() {
            0 => Err(Error::llm("No more mock responses available")),
            // The last response is sticky so single-answer mocks serve any number of calls
            1 => Ok(responses[0].clone()),
            _ => Ok(responses.remove(0)),
        }
    }
}

impl Default for MockLlmClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Mock search provider for testing
#[derive(Debug, Default)]
pub struct MockSearchProvider {
    pub result: String,
    pub queries: Arc<Mutex<Vec<String>>>,
    pub delay: Option<Duration>,
}

impl MockSearchProvider {
    pub fn returning(result: &str) -> Self {
        Self {
            result: result.to_string(),
            queries: Arc::new(Mutex::new(Vec::new())),
            delay: None,
        }
    }

    /// Holds every search for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn get_queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchProvider for MockSearchProvider {
    async fn search(&self, query: &str) -> Result<String> {
        self.queries.lock().unwrap().push(query.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.result.clone())
    }
}

pub fn create_text_response(content: &str) -> ChatCompletionResponse {
    create_response(ChatMessage::assistant(content, None))
}

pub fn create_response(message: ChatMessage) -> ChatCompletionResponse {
    ChatCompletionResponse {
        id: "chatcmpl-mock".to_string(),
        model: "mock-model".to_string(),
        choices: vec![Choice {
            message,
            finish_reason: Some("stop".to_string()),
        }],
    }
}
