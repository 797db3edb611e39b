use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SearchResponse {
    pub answer: String,
}

impl SearchResponse {
    pub fn error(message: impl std::fmt::Display) -> Self {
        Self {
            answer: format!("Error: {}", message),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct HealthStatus {
    pub status: String,
}

impl HealthStatus {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct FrontendError {
    pub status: String,
    pub message: String,
}

impl FrontendError {
    pub fn not_built() -> Self {
        Self {
            status: "error".to_string(),
            message: "Frontend not built".to_string(),
        }
    }
}
