//! One-shot model calls for the code lab and quizzes.
//!
//! None of these calls fail outward. Provider errors and unusable responses
//! are logged and turned into a fixed fallback result that the caller can
//! show as-is.

use std::sync::Arc;

use crate::catalog::{Difficulty, Topic};
use crate::core::quiz::{self, QuizQuestion};
use crate::prompts::Prompts;
use crate::providers::{GenerateRequest, GenerativeModel};

/// Analysis came back empty.
pub const ANALYSIS_FAILED: &str = "Analysis failed.";
/// Analysis request failed.
pub const ANALYSIS_ERROR: &str = "Error analyzing code.";
/// Simulated run produced no output.
pub const NO_OUTPUT: &str = "> No output";
/// Simulated run request failed.
pub const EXECUTION_ERROR: &str = "Error connecting to execution engine.";
/// Prefix of simulated output that reports a compilation error.
pub const COMPILATION_ERROR_MARKER: &str = "Error:";

/// True when simulated output reports a compilation error.
pub fn is_compilation_error(output: &str) -> bool {
    output.trim_start().starts_with(COMPILATION_ERROR_MARKER)
}

/// Pulls the `<svg ...>...</svg>` element out of a model response.
///
/// Markdown fences and any prose around the element are dropped. Returns
/// `None` when there is no complete root element.
pub fn extract_svg(response: &str) -> Option<String> {
    let cleaned = response
        .replace("```xml", "")
        .replace("```svg", "")
        .replace("```", "");
    let start = cleaned.find("<svg")?;
    let end = cleaned.rfind("</svg>")?;
    if end < start {
        return None;
    }
    Some(cleaned[start..end + "</svg>".len()].to_string())
}

pub struct Orchestrator<M> {
    model: Arc<M>,
    prompts: Arc<Prompts>,
    quiz_questions: u32,
}

impl<M: GenerativeModel> Orchestrator<M> {
    pub fn new(model: Arc<M>, prompts: Arc<Prompts>, quiz_questions: u32) -> Self {
        Self {
            model,
            prompts,
            quiz_questions,
        }
    }

    async fn ask(&self, operation: &str, prompt: anyhow::Result<String>) -> Option<String> {
        let prompt = match prompt {
            Ok(prompt) => prompt,
            Err(error) => {
                tracing::error!(operation, error = %format!("{error:#}"), "prompt rendering failed");
                return None;
            }
        };
        match self.model.generate(GenerateRequest::prompt(prompt)).await {
            Ok(text) => Some(text),
            Err(error) => {
                tracing::warn!(operation, kind = %error.kind, error = %error, "model request failed");
                None
            }
        }
    }

    /// Critiques `source`: compile check, predicted output, explanation.
    pub async fn analyze(&self, source: &str) -> String {
        if source.trim().is_empty() {
            return ANALYSIS_FAILED.to_string();
        }
        match self.ask("analyze", self.prompts.analyze(source)).await {
            Some(text) if !text.trim().is_empty() => text,
            Some(_) => ANALYSIS_FAILED.to_string(),
            None => ANALYSIS_ERROR.to_string(),
        }
    }

    /// Predicts the console output of running `source`, verbatim.
    ///
    /// Use [`is_compilation_error`] to tell an `Error:` report from output.
    pub async fn simulate_execution(&self, source: &str) -> String {
        if source.trim().is_empty() {
            return NO_OUTPUT.to_string();
        }
        match self.ask("simulate", self.prompts.simulate(source)).await {
            Some(text) if !text.trim().is_empty() => text,
            Some(_) => NO_OUTPUT.to_string(),
            None => EXECUTION_ERROR.to_string(),
        }
    }

    /// Draws `source` as an SVG flowchart.
    pub async fn visualize(&self, source: &str) -> Option<String> {
        if source.trim().is_empty() {
            return None;
        }
        let response = self.ask("visualize", self.prompts.visualize(source)).await?;
        let svg = extract_svg(&response);
        if svg.is_none() {
            tracing::warn!(chars = response.len(), "visualization response had no <svg> root");
        }
        svg
    }

    /// Generates quiz questions, or an empty list when none are usable.
    pub async fn generate_quiz(&self, topic: &Topic, difficulty: Difficulty) -> Vec<QuizQuestion> {
        let prompt = match self
            .prompts
            .quiz(topic.title, difficulty, self.quiz_questions)
        {
            Ok(prompt) => prompt,
            Err(error) => {
                tracing::error!(error = %format!("{error:#}"), "prompt rendering failed");
                return Vec::new();
            }
        };

        let request = GenerateRequest::prompt(prompt).with_schema(quiz::response_schema());
        let payload = match self.model.generate(request).await {
            Ok(payload) => payload,
            Err(error) => {
                tracing::warn!(kind = %error.kind, error = %error, "quiz request failed");
                return Vec::new();
            }
        };

        match quiz::parse_questions(&payload) {
            Ok(questions) => {
                tracing::info!(topic = topic.id, %difficulty, count = questions.len(), "quiz generated");
                questions
            }
            Err(error) => {
                tracing::warn!(topic = topic.id, error = %error, "discarding unusable quiz payload");
                Vec::new()
            }
        }
    }
}
