//! Chat transcript entries.

/// Text shown in place of a reply when a request fails for any reason.
pub const ERROR_TEXT: &str = "Error.";

/// One entry in the chat list: user-authored or remote-authored. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub text: String,
    pub is_user: bool,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_user: true,
        }
    }

    pub fn remote(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_user: false,
        }
    }

    /// Remote-style placeholder appended when a request fails.
    pub fn error() -> Self {
        Self::remote(ERROR_TEXT)
    }
}
