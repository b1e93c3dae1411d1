//! Seeker core library — message model, chat endpoint client, and the ChatView state holder
//! used by both the CLI and desktop applications.

pub mod api;
pub mod chat_view;
pub mod config;
pub mod init;
pub mod message;

pub use chat_view::{ChatView, RequestId};
pub use message::{Message, ERROR_TEXT};
