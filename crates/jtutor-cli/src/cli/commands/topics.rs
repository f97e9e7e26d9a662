//! Topics command handler.

use anyhow::Result;
use jtutor_core::catalog;
use jtutor_core::config::paths;
use jtutor_core::core::Progress;

use crate::cli::output::Printer;

pub fn run() -> Result<()> {
    let progress = Progress::load(&paths::progress_path());
    let printer = Printer::stdout();

    for category in catalog::categories() {
        println!("{}", printer.bold(category));
        for topic in catalog::TOPICS.iter().filter(|t| t.category == category) {
            let mark = if progress.is_complete(topic.id) { "x" } else { " " };
            println!(
                "  [{mark}] {:<18} {}  {}",
                topic.id,
                topic.title,
                printer.dim(topic.description)
            );
        }
    }
    Ok(())
}
