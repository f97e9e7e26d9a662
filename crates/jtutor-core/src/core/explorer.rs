//! Topic explorer: streamed lessons per (topic, difficulty) plus progress.

use std::sync::Arc;

use anyhow::{Result, anyhow};

use crate::catalog::{self, Difficulty, Topic};
use crate::core::progress::Progress;
use crate::core::session::{
    Applied, Generation, StartOutcome, StreamingSession, UpdateRx, UpdateTx,
    create_update_channel, spawn_fragment_pump,
};
use crate::prompts::Prompts;
use crate::providers::{GenerateRequest, GenerativeModel};
use crate::render::{self, RenderBlock};

/// Shown when a lesson stream fails.
pub const EXPLANATION_ERROR: &str =
    "Sorry, I encountered an error while connecting to the AI tutor.";

/// Cache key for a lesson.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExplanationKey {
    pub topic_id: String,
    pub difficulty: Difficulty,
}

/// Result of `TopicExplorer::explain`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExplainOutcome {
    /// Lesson was already complete; the text is available now.
    Cached,
    /// A lesson stream was started.
    Started(Generation),
    /// This lesson is already streaming; nothing was restarted.
    InProgress,
}

pub struct TopicExplorer<M> {
    model: Arc<M>,
    prompts: Arc<Prompts>,
    session: StreamingSession<ExplanationKey>,
    tx: UpdateTx,
    rx: UpdateRx,
    progress: Progress,
}

impl<M: GenerativeModel> TopicExplorer<M> {
    pub fn new(model: Arc<M>, prompts: Arc<Prompts>, progress: Progress) -> Self {
        let (tx, rx) = create_update_channel();
        Self {
            model,
            prompts,
            session: StreamingSession::new(),
            tx,
            rx,
            progress,
        }
    }

    /// Shows the lesson for `topic_id` at `difficulty`.
    ///
    /// # Errors
    /// Returns an error for an unknown topic id or a prompt that fails to
    /// render.
    pub fn explain(&mut self, topic_id: &str, difficulty: Difficulty) -> Result<ExplainOutcome> {
        let topic = lookup(topic_id)?;
        let key = ExplanationKey {
            topic_id: topic.id.to_string(),
            difficulty,
        };
        if self.session.is_streaming_key(&key) {
            return Ok(ExplainOutcome::InProgress);
        }

        let prompt = self.prompts.explain(topic.title, difficulty)?;
        match self.session.start(key) {
            StartOutcome::Cached(_) => {
                tracing::debug!(topic = topic.id, %difficulty, "lesson served from cache");
                Ok(ExplainOutcome::Cached)
            }
            StartOutcome::Started(generation) => {
                tracing::info!(topic = topic.id, %difficulty, generation, "lesson stream started");
                spawn_fragment_pump(
                    Arc::clone(&self.model),
                    GenerateRequest::prompt(prompt),
                    generation,
                    self.session.watch_generation(),
                    self.tx.clone(),
                );
                Ok(ExplainOutcome::Started(generation))
            }
        }
    }

    /// Waits for the next pump update and applies it.
    ///
    /// Only call while a stream may be in flight; with nothing pending this
    /// waits indefinitely.
    pub async fn next_update(&mut self) -> Applied {
        match self.rx.recv().await {
            Some(update) => self.session.apply(update),
            // The explorer holds a sender, so the channel never closes.
            None => Applied::Stale,
        }
    }

    /// Applies updates until the current lesson stops streaming.
    pub async fn wait_idle(&mut self) {
        while self.session.is_streaming() {
            self.next_update().await;
        }
    }

    /// Accumulated lesson text.
    pub fn text(&self) -> &str {
        self.session.text()
    }

    pub fn blocks(&self) -> Vec<RenderBlock> {
        render::render(self.session.text())
    }

    pub fn is_streaming(&self) -> bool {
        self.session.is_streaming()
    }

    /// Fallback message when the current lesson failed.
    pub fn error_message(&self) -> Option<&'static str> {
        self.session.error().map(|_| EXPLANATION_ERROR)
    }

    pub fn current(&self) -> Option<&ExplanationKey> {
        self.session.key()
    }

    pub fn is_cached(&self, topic_id: &str, difficulty: Difficulty) -> bool {
        let key = ExplanationKey {
            topic_id: topic_id.to_string(),
            difficulty,
        };
        self.session.cached(&key).is_some()
    }

    /// Flips the completion flag of a topic; returns the new flag.
    ///
    /// # Errors
    /// Returns an error for an unknown topic or when progress cannot be saved.
    pub fn toggle_complete(&mut self, topic_id: &str) -> Result<bool> {
        let topic = lookup(topic_id)?;
        self.progress.toggle(topic.id)
    }

    pub fn is_complete(&self, topic_id: &str) -> bool {
        self.progress.is_complete(topic_id)
    }

    /// Share of catalog topics marked complete, in percent.
    pub fn progress_percent(&self) -> u32 {
        let done = catalog::TOPICS
            .iter()
            .filter(|topic| self.progress.is_complete(topic.id))
            .count();
        Progress::percent(done, catalog::TOPICS.len())
    }

    pub fn progress(&self) -> &Progress {
        &self.progress
    }
}

fn lookup(topic_id: &str) -> Result<&'static Topic> {
    catalog::find_topic(topic_id)
        .ok_or_else(|| anyhow!("Unknown topic '{topic_id}'. Run `jtutor topics` to list them."))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::core::session::testing::{Script, ScriptedModel};
    use crate::providers::ProviderError;

    fn explorer(scripts: Vec<Script>) -> (TopicExplorer<ScriptedModel>, Arc<ScriptedModel>) {
        let model = Arc::new(ScriptedModel::with_streams(scripts));
        let explorer = TopicExplorer::new(
            Arc::clone(&model),
            Arc::new(Prompts::new("Java").unwrap()),
            Progress::in_memory(),
        );
        (explorer, model)
    }

    #[tokio::test]
    async fn test_same_key_twice_streams_once() {
        let (mut explorer, model) =
            explorer(vec![Script::text(&["> **Core Concept**: ", "Objects."])]);

        let first = explorer.explain("oop_classes", Difficulty::Beginner).unwrap();
        assert!(matches!(first, ExplainOutcome::Started(_)));
        explorer.wait_idle().await;
        let text = explorer.text().to_string();
        assert_eq!(text, "> **Core Concept**: Objects.");

        explorer.explain("threads", Difficulty::Beginner).unwrap();
        explorer.wait_idle().await;
        let second = explorer.explain("oop_classes", Difficulty::Beginner).unwrap();
        assert_eq!(second, ExplainOutcome::Cached);
        assert_eq!(explorer.text(), text);
        assert!(!explorer.is_streaming());
        assert_eq!(model.stream_calls(), 2);
    }

    #[tokio::test]
    async fn test_difficulty_is_part_of_key() {
        let (mut explorer, model) = explorer(vec![Script::text(&["a"]), Script::text(&["b"])]);
        explorer.explain("streams", Difficulty::Beginner).unwrap();
        explorer.wait_idle().await;
        explorer.explain("streams", Difficulty::Advanced).unwrap();
        explorer.wait_idle().await;

        assert_eq!(explorer.text(), "b");
        assert_eq!(model.stream_calls(), 2);
        assert!(explorer.is_cached("streams", Difficulty::Beginner));
    }

    #[tokio::test(start_paused = true)]
    async fn test_newer_request_supersedes_older_stream() {
        let slow = Script::text(&["old-1 ", "old-2 ", "old-3"]).delayed(Duration::from_millis(50));
        let fast = Script::text(&["new-1 ", "new-2"]).delayed(Duration::from_millis(5));
        let (mut explorer, _model) = explorer(vec![slow, fast]);

        explorer.explain("jdbc", Difficulty::Beginner).unwrap();
        explorer.explain("applets", Difficulty::Beginner).unwrap();
        explorer.wait_idle().await;
        assert_eq!(explorer.text(), "new-1 new-2");

        // Let the superseded stream drain; none of it may land.
        tokio::time::sleep(Duration::from_millis(500)).await;
        while let Ok(update) = explorer.rx.try_recv() {
            assert!(matches!(explorer.session.apply(update), Applied::Stale));
        }
        assert_eq!(explorer.text(), "new-1 new-2");
        assert!(!explorer.is_cached("jdbc", Difficulty::Beginner));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reexplain_while_streaming_does_not_restart() {
        let slow = Script::text(&["x", "y"]).delayed(Duration::from_millis(20));
        let (mut explorer, model) = explorer(vec![slow]);

        let first = explorer.explain("file_io", Difficulty::Beginner).unwrap();
        let again = explorer.explain("file_io", Difficulty::Beginner).unwrap();
        assert!(matches!(first, ExplainOutcome::Started(_)));
        assert_eq!(again, ExplainOutcome::InProgress);
        explorer.wait_idle().await;
        assert_eq!(explorer.text(), "xy");
        assert_eq!(model.stream_calls(), 1);
    }

    #[tokio::test]
    async fn test_failure_surfaces_error_and_allows_retry() {
        let broken = Script::text(&["partial"]).failing(ProviderError::timeout("reset"));
        let (mut explorer, model) = explorer(vec![broken, Script::text(&["full"])]);

        explorer.explain("exceptions", Difficulty::Intermediate).unwrap();
        explorer.wait_idle().await;
        assert_eq!(explorer.error_message(), Some(EXPLANATION_ERROR));
        assert_eq!(explorer.text(), "partial");
        assert!(!explorer.is_cached("exceptions", Difficulty::Intermediate));

        let retry = explorer.explain("exceptions", Difficulty::Intermediate).unwrap();
        assert!(matches!(retry, ExplainOutcome::Started(_)));
        explorer.wait_idle().await;
        assert_eq!(explorer.text(), "full");
        assert_eq!(explorer.error_message(), None);
        assert_eq!(model.stream_calls(), 2);
    }

    #[test]
    fn test_unknown_topic_is_error() {
        let (mut explorer, _model) = explorer(vec![]);
        assert!(explorer.explain("kotlin", Difficulty::Beginner).is_err());
        assert!(explorer.toggle_complete("kotlin").is_err());
    }

    #[test]
    fn test_progress_percent_counts_catalog_topics() {
        let (mut explorer, _model) = explorer(vec![]);
        assert_eq!(explorer.progress_percent(), 0);
        explorer.toggle_complete("basics_syntax").unwrap();
        explorer.toggle_complete("control_flow").unwrap();
        assert!(explorer.is_complete("control_flow"));
        assert_eq!(explorer.progress_percent(), 13);
        explorer.toggle_complete("control_flow").unwrap();
        assert_eq!(explorer.progress_percent(), 6);
    }
}
