//! Prompt templates.
//!
//! Templates live in `prompts/*.md` and are rendered with MiniJinja in strict
//! mode, so a missing variable is an error rather than an empty string.

use anyhow::{Context, Result};
use minijinja::{Environment, UndefinedBehavior, context};

use crate::catalog::Difficulty;

const TEMPLATES: &[(&str, &str)] = &[
    ("explain", include_str!("../prompts/explain.md")),
    ("analyze", include_str!("../prompts/analyze.md")),
    ("simulate", include_str!("../prompts/simulate.md")),
    ("visualize", include_str!("../prompts/visualize.md")),
    ("quiz", include_str!("../prompts/quiz.md")),
    ("chat_system", include_str!("../prompts/chat_system.md")),
];

/// Renders the tutor prompts for one taught language.
pub struct Prompts {
    env: Environment<'static>,
    language: String,
}

impl Prompts {
    /// # Errors
    /// Returns an error if an embedded template fails to parse.
    pub fn new(language: impl Into<String>) -> Result<Self> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        for &(name, source) in TEMPLATES {
            env.add_template(name, source)
                .with_context(|| format!("Failed to parse prompt template '{name}'"))?;
        }
        Ok(Self {
            env,
            language: language.into(),
        })
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    fn fence(&self) -> String {
        self.language.to_ascii_lowercase()
    }

    fn render(&self, name: &str, vars: minijinja::Value) -> Result<String> {
        let output = self
            .env
            .get_template(name)
            .with_context(|| format!("Unknown prompt template '{name}'"))?
            .render(vars)
            .with_context(|| format!("Failed to render prompt template '{name}'"))?;
        Ok(output.replace("\r\n", "\n").trim().to_string())
    }

    /// Lesson prompt for a topic at a difficulty.
    pub fn explain(&self, topic_title: &str, difficulty: Difficulty) -> Result<String> {
        self.render(
            "explain",
            context! {
                language => self.language,
                topic => topic_title,
                difficulty => difficulty.as_str(),
            },
        )
    }

    pub fn analyze(&self, source: &str) -> Result<String> {
        self.render("analyze", self.code_vars(source))
    }

    pub fn simulate(&self, source: &str) -> Result<String> {
        self.render("simulate", self.code_vars(source))
    }

    pub fn visualize(&self, source: &str) -> Result<String> {
        self.render("visualize", self.code_vars(source))
    }

    pub fn quiz(&self, topic_title: &str, difficulty: Difficulty, count: u32) -> Result<String> {
        self.render(
            "quiz",
            context! {
                language => self.language,
                topic => topic_title,
                difficulty => difficulty.as_str(),
                count => count,
            },
        )
    }

    /// System instruction for the chat assistant.
    pub fn chat_system(&self) -> Result<String> {
        self.render("chat_system", context! { language => self.language })
    }

    fn code_vars(&self, source: &str) -> minijinja::Value {
        context! {
            language => self.language,
            fence => self.fence(),
            source => source,
        }
    }
}
