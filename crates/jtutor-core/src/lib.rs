//! jtutor core library.
//!
//! Everything except the terminal front-end: the Gemini provider, lesson
//! streaming, the markup renderer, quizzes, the code lab and progress.

pub mod catalog;
pub mod config;
pub mod core;
pub mod logging;
pub mod prompts;
pub mod providers;
pub mod render;
