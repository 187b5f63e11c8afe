pub mod gemini;
pub mod llm;

pub use gemini::GeminiClient;
pub use llm::{FragmentStream, UpstreamClient};
