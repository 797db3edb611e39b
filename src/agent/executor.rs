use crate::{
    Error, Result,
    config::AgentConfig,
    llm::{ChatCompletionRequest, ChatMessage, LlmClient, Tool, ToolCall},
    search::SearchProvider,
};
use serde::Deserialize;
use serde_json::json;
use std::{sync::Arc, time::Duration};
use tracing::{debug, info, warn};

pub const SEARCH_TOOL: &str = "search";

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful research assistant. \
Answer the user's question accurately and concisely. \
Use the search tool when the question needs recent or factual information you are unsure about.";

#[derive(Debug, Deserialize)]
struct SearchArguments {
    query: String,
}

/// Tool-calling loop that lets the model consult the search provider before
/// answering.
pub struct SearchAgent {
    llm_client: Arc<dyn LlmClient>,
    search: Arc<dyn SearchProvider>,
    system_prompt: String,
    max_iterations: usize,
    max_execution_time: Duration,
}

impl SearchAgent {
    pub fn new(
        llm_client: Arc<dyn LlmClient>,
        search: Arc<dyn SearchProvider>,
        config: &AgentConfig,
    ) -> Self {
        info!(
            "Initializing search agent (max {} iterations, {}s budget)",
            config.max_iterations, config.max_execution_time_secs
        );

        Self {
            llm_client,
            search,
            system_prompt: config
                .system_prompt
                .clone()
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            max_iterations: config.max_iterations,
            max_execution_time: Duration::from_secs(config.max_execution_time_secs),
        }
    }

    pub fn search_tool() -> Tool {
        Tool::function(
            SEARCH_TOOL,
            "Searches the web for recent information.",
            json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The search query"
                    }
                },
                "required": ["query"]
            }),
        )
    }

    pub async fn run(&self, query: &str) -> Result<String> {
        let started = std::time::Instant::now();

        let result = tokio::time::timeout(self.max_execution_time, self.run_loop(query))
            .await
            .map_err(|_| Error::AgentTimeout {
                seconds: self.max_execution_time.as_secs(),
            })?;

        info!("Agent finished in {:?}", started.elapsed());
        result
    }

    async fn run_loop(&self, query: &str) -> Result<String> {
        let tools = vec![Self::search_tool()];
        let mut messages = vec![
            ChatMessage::system(self.system_prompt.clone()),
            ChatMessage::user(query),
        ];

        for iteration in 1..=self.max_iterations {
            debug!(
                "Agent iteration {} with {} messages",
                iteration,
                messages.len()
            );

            let response = self
                .llm_client
                .create_chat_completion(ChatCompletionRequest {
                    messages: messages.clone(),
                    tools: tools.clone(),
                    temperature: None,
                })
                .await?;
            let (id, model) = (response.id, response.model);

            let choice = response
                .choices
                .into_iter()
                .next()
                .ok_or_else(|| Error::agent("Provider returned no choices"))?;
            debug!(
                id = %id,
                model = %model,
                finish_reason = ?choice.finish_reason,
                "Agent received completion"
            );

            let tool_calls = match choice.message.tool_calls {
                Some(calls) if !calls.is_empty() => calls,
                _ => return Ok(choice.message.content),
            };

            info!("Model requested {} tool call(s)", tool_calls.len());
            messages.push(ChatMessage::assistant(
                choice.message.content,
                Some(tool_calls.clone()),
            ));

            for call in &tool_calls {
                let observation = self.execute_tool(call).await?;
                messages.push(ChatMessage::tool(call.id.clone(), observation));
            }
        }

        Err(Error::MaxIterationsExceeded {
            max_iterations: self.max_iterations,
        })
    }

    /// Malformed calls become observations so the model can correct itself;
    /// only provider failures abort the run.
    async fn execute_tool(&self, call: &ToolCall) -> Result<String> {
        if call.function.name != SEARCH_TOOL {
            warn!("Model requested unknown tool: {}", call.function.name);
            return Ok(format!(
                "Error: unknown tool '{}'. Available tools: {}",
                call.function.name, SEARCH_TOOL
            ));
        }

        let arguments: SearchArguments = match serde_json::from_str(&call.function.arguments) {
            Ok(arguments) => arguments,
            Err(e) => {
                warn!("Invalid search arguments '{}': {}", call.function.arguments, e);
                return Ok(format!("Error: invalid arguments for {}: {}", SEARCH_TOOL, e));
            }
        };

        info!("Executing search for: {}", arguments.query);
        self.search.search(&arguments.query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{ChatCompletionResponse, Choice, FunctionCall, MockLlmClient};
    use crate::search::MockSearchProvider;
    use async_trait::async_trait;
    use mockall::Sequence;
    use pretty_assertions::assert_eq;

    /// Search backend that never answers within any sane budget.
    struct StalledSearch;

    #[async_trait]
    impl SearchProvider for StalledSearch {
        async fn search(&self, _query: &str) -> Result<String> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok("too late".to_string())
        }
    }

    fn response_with(message: ChatMessage) -> ChatCompletionResponse {
        ChatCompletionResponse {
            id: "chatcmpl-test".to_string(),
            model: "gemini-2.5-pro".to_string(),
            choices: vec![Choice {
                message,
                finish_reason: None,
            }],
        }
    }

    fn tool_call(id: &str, name: &str, arguments: &str) -> ChatMessage {
        ChatMessage::assistant(
            "",
            Some(vec![ToolCall {
                id: id.to_string(),
                function: FunctionCall {
                    name: name.to_string(),
                    arguments: arguments.to_string(),
                },
            }]),
        )
    }

    fn agent_config(max_iterations: usize) -> AgentConfig {
        AgentConfig {
            max_iterations,
            max_execution_time_secs: 5,
            system_prompt: None,
        }
    }

    #[tokio::test]
    async fn test_direct_answer_skips_search() {
        let mut llm = MockLlmClient::new();
        llm.expect_create_chat_completion()
            .times(1)
            .returning(|request| {
                assert_eq!(request.messages[0].role, "system");
                assert_eq!(request.messages[1].content, "What is 2+2?");
                assert_eq!(request.tools[0].function.name, SEARCH_TOOL);
                Ok(response_with(ChatMessage::assistant("4", None)))
            });
        let mut search = MockSearchProvider::new();
        search.expect_search().never();

        let agent = SearchAgent::new(Arc::new(llm), Arc::new(search), &agent_config(3));

        assert_eq!(agent.run("What is 2+2?").await.unwrap(), "4");
    }

    #[tokio::test]
    async fn test_search_result_is_fed_back() {
        let mut seq = Sequence::new();
        let mut llm = MockLlmClient::new();
        llm.expect_create_chat_completion()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Ok(response_with(tool_call(
                    "call_1",
                    SEARCH_TOOL,
                    r#"{"query": "rust latest version"}"#,
                )))
            });
        llm.expect_create_chat_completion()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|request| {
                let last = request.messages.last().unwrap();
                assert_eq!(last.role, "tool");
                assert_eq!(last.tool_call_id.as_deref(), Some("call_1"));
                assert_eq!(last.content, "Rust 1.88");
                Ok(response_with(ChatMessage::assistant(
                    "The latest version is Rust 1.88.",
                    None,
                )))
            });

        let mut search = MockSearchProvider::new();
        search
            .expect_search()
            .withf(|query: &str| query == "rust latest version")
            .times(1)
            .returning(|_| Ok("Rust 1.88".to_string()));

        let agent = SearchAgent::new(Arc::new(llm), Arc::new(search), &agent_config(3));

        assert_eq!(
            agent.run("What is the latest Rust?").await.unwrap(),
            "The latest version is Rust 1.88."
        );
    }

    #[tokio::test]
    async fn test_bad_arguments_become_observation() {
        let mut seq = Sequence::new();
        let mut llm = MockLlmClient::new();
        llm.expect_create_chat_completion()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(response_with(tool_call("call_1", SEARCH_TOOL, "not json"))));
        llm.expect_create_chat_completion()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|request| {
                let last = request.messages.last().unwrap();
                assert!(last.content.starts_with("Error: invalid arguments"));
                Ok(response_with(ChatMessage::assistant("I could not search.", None)))
            });
        let mut search = MockSearchProvider::new();
        search.expect_search().never();

        let agent = SearchAgent::new(Arc::new(llm), Arc::new(search), &agent_config(3));

        assert_eq!(agent.run("anything").await.unwrap(), "I could not search.");
    }

    #[tokio::test]
    async fn test_max_iterations_exceeded() {
        let mut llm = MockLlmClient::new();
        llm.expect_create_chat_completion()
            .times(2)
            .returning(|_| Ok(response_with(tool_call("call_x", "calculator", "{}"))));
        let mut search = MockSearchProvider::new();
        search.expect_search().never();

        let agent = SearchAgent::new(Arc::new(llm), Arc::new(search), &agent_config(2));
        let err = agent.run("loop forever").await.unwrap_err();

        assert!(matches!(
            err,
            Error::MaxIterationsExceeded { max_iterations: 2 }
        ));
    }

    #[tokio::test]
    async fn test_search_failure_aborts() {
        let mut llm = MockLlmClient::new();
        llm.expect_create_chat_completion()
            .times(1)
            .returning(|_| {
                Ok(response_with(tool_call(
                    "call_1",
                    SEARCH_TOOL,
                    r#"{"query": "weather"}"#,
                )))
            });
        let mut search = MockSearchProvider::new();
        search
            .expect_search()
            .returning(|_| Err(Error::search("quota exceeded")));

        let agent = SearchAgent::new(Arc::new(llm), Arc::new(search), &agent_config(3));
        let err = agent.run("weather?").await.unwrap_err();

        assert!(err.to_string().contains("quota exceeded"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_search_hits_execution_budget() {
        let mut llm = MockLlmClient::new();
        llm.expect_create_chat_completion()
            .times(1)
            .returning(|_| {
                Ok(response_with(tool_call(
                    "call_1",
                    SEARCH_TOOL,
                    r#"{"query": "slow"}"#,
                )))
            });

        let agent = SearchAgent::new(Arc::new(llm), Arc::new(StalledSearch), &agent_config(3));
        let started = tokio::time::Instant::now();
        let err = agent.run("anything slow?").await.unwrap_err();

        assert!(matches!(err, Error::AgentTimeout { seconds: 5 }));
        assert_eq!(err.to_string(), "Agent timed out after 5s");
        assert_eq!(started.elapsed(), Duration::from_secs(5));
    }
}
