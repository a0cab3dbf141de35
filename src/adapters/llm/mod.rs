//! LLM adapters for the parameter-extraction port.

mod mock;
mod openai;

pub use mock::MockExtractor;
pub use openai::{OpenAiConfig, OpenAiExtractor};
