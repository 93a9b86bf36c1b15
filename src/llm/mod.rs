// LLM collaborator: chat-completions client and prompt construction.

pub mod client;
pub mod prompt;
