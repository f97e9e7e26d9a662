//! Tutor state: streamed lessons, chat, quizzes, code-lab calls and progress.

pub mod chat;
pub mod explorer;
pub mod orchestrator;
pub mod progress;
pub mod quiz;
pub mod session;
pub mod share;

pub use chat::{ChatMessage, ChatRole, ChatSession, SendRejected};
pub use explorer::{ExplainOutcome, ExplanationKey, TopicExplorer};
pub use orchestrator::Orchestrator;
pub use progress::Progress;
pub use quiz::{Quiz, QuizQuestion, QuizView};
pub use session::{Applied, Generation, StartOutcome, StreamingSession};
