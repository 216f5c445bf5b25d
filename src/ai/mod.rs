mod models;
mod client;
mod anthropic;

pub use models::{AIProvider, AIError, MessagesRequest, RequestMessage, MessagesResponse, ContentBlock};
pub use client::AIClient;
pub use anthropic::{AnthropicProvider, AnthropicSettings};
