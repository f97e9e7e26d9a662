//! Explain command handler.

use std::io;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use jtutor_core::catalog::{self, Difficulty};
use jtutor_core::config::paths;
use jtutor_core::core::{Applied, ExplainOutcome, Progress, TopicExplorer};

use crate::cli::Tutor;
use crate::cli::output::{Printer, StreamPrinter};

pub async fn run(tutor: &Tutor, topic_id: &str, difficulty: Difficulty, done: bool) -> Result<()> {
    let mut explorer = TopicExplorer::new(
        Arc::clone(&tutor.model),
        Arc::clone(&tutor.prompts),
        Progress::load(&paths::progress_path()),
    );
    let outcome = explorer.explain(topic_id, difficulty)?;

    let printer = Printer::stdout();
    let mut stdout = io::stdout();
    if let Some(topic) = catalog::find_topic(topic_id) {
        println!("{}", printer.bold(&format!("{} ({difficulty})", topic.title)));
        println!();
    }

    let mut stream = StreamPrinter::new(printer);
    if let ExplainOutcome::Started(_) = outcome {
        while explorer.is_streaming() {
            if let Applied::Fragment = explorer.next_update().await {
                stream.update(&mut stdout, explorer.text())?;
            }
        }
    }
    stream.finish(&mut stdout, explorer.text())?;

    if let Some(message) = explorer.error_message() {
        bail!("{message}");
    }

    if done && !explorer.is_complete(topic_id) {
        explorer
            .toggle_complete(topic_id)
            .context("mark topic complete")?;
        println!();
        println!(
            "Marked complete. Course progress: {}%",
            explorer.progress_percent()
        );
    }
    Ok(())
}
