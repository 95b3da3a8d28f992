//! ChatCompleter: the abstract single-shot chat completion contract and its
//! OpenAI-compatible HTTP implementation.

pub mod errors;
pub mod openai;
pub mod traits;

pub use errors::{ProviderError, ProviderResult};
pub use openai::OpenAiCompleter;
pub use traits::{ChatCompleter, ChatMessage, CompletionParams, CompletionResult};
