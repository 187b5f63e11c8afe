pub mod consumer;
pub mod questions;
pub mod render;
pub mod session;

pub use consumer::{RelayClient, TurnOutcome};
pub use questions::{Question, QuestionList};
pub use render::ConsoleRenderer;
pub use session::{ChatSession, Message, Sender, Turn};
