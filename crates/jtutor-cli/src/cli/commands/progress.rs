//! Progress command handlers.

use anyhow::{Context, Result, anyhow};
use jtutor_core::catalog;
use jtutor_core::config::paths;
use jtutor_core::core::Progress;

pub fn show() -> Result<()> {
    let progress = Progress::load(&paths::progress_path());
    let done: Vec<_> = catalog::TOPICS
        .iter()
        .filter(|topic| progress.is_complete(topic.id))
        .collect();

    println!(
        "{}/{} topics complete ({}%)",
        done.len(),
        catalog::TOPICS.len(),
        Progress::percent(done.len(), catalog::TOPICS.len())
    );
    for topic in done {
        println!("  {}  {}", topic.id, topic.title);
    }
    Ok(())
}

pub fn toggle(topic_id: &str) -> Result<()> {
    let topic = catalog::find_topic(topic_id)
        .ok_or_else(|| anyhow!("Unknown topic '{topic_id}'. Run `jtutor topics` to list them."))?;

    let path = paths::progress_path();
    let mut progress = Progress::load(&path);
    let complete = progress
        .toggle(topic.id)
        .with_context(|| format!("save progress to {}", path.display()))?;

    if complete {
        println!("Marked '{}' complete.", topic.title);
    } else {
        println!("Marked '{}' incomplete.", topic.title);
    }
    Ok(())
}
