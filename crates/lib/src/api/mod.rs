//! Chat endpoint client.
//!
//! One operation: POST the user's text to `/api/chat` and return the validated reply.

mod client;
pub mod schema;

pub use client::{ChatClient, ChatError, ChatTransport, DEFAULT_CHAT_PATH};
pub use schema::{ChatRequest, ChatResponse};
