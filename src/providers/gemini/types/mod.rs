pub mod request;
pub mod stream;

pub use request::{Content, GenerateContentRequest, GenerationConfig, Part, ThinkingConfig};
pub use stream::{ApiError, Candidate, GenerateContentResponse, PromptFeedback};
