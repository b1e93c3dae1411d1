//! Wire types for `POST /api/chat` and validation of the reply body.

use serde::{Deserialize, Serialize};

use super::ChatError;

/// Request body: `{"message": "..."}`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest<'a> {
    pub message: &'a str,
}

/// Success body: `{"response": "..."}`. Extra fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

/// Parse a success body. Non-JSON is `Malformed`; JSON without a string `response` is `Schema`.
pub fn parse_chat_response(body: &str) -> Result<ChatResponse, ChatError> {
    let value: serde_json::Value = serde_json::from_str(body).map_err(ChatError::Malformed)?;
    serde_json::from_value(value).map_err(ChatError::Schema)
}
