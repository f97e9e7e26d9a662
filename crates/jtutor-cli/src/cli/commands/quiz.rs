//! Quiz command handler.
//!
//! Questions are asked one at a time on stdin; answers are 1-based option
//! numbers. Results and explanations are shown after the last answer.

use std::io::{self, BufRead, Write};

use anyhow::{Result, anyhow, bail};
use jtutor_core::catalog::{self, Difficulty};
use jtutor_core::core::{Quiz, QuizView};

use crate::cli::Tutor;
use crate::cli::output::Printer;

pub const QUIZ_FAILED: &str = "Failed to generate quiz. Please try again.";

pub async fn run(tutor: &Tutor, topic_id: &str, difficulty: Difficulty) -> Result<()> {
    let topic = catalog::find_topic(topic_id)
        .ok_or_else(|| anyhow!("Unknown topic '{topic_id}'. Run `jtutor topics` to list them."))?;

    println!("Knowledge Check: {} ({difficulty})", topic.title);
    let questions = tutor.orchestrator().generate_quiz(topic, difficulty).await;
    let mut view = QuizView::from_questions(questions);
    let Some(quiz) = view.quiz_mut() else {
        bail!(QUIZ_FAILED);
    };

    take_quiz(quiz, &mut io::stdin().lock(), &mut io::stdout(), Printer::stdout())
}

/// Asks every question, submits and prints the results.
pub fn take_quiz(
    quiz: &mut Quiz,
    input: &mut impl BufRead,
    out: &mut impl Write,
    printer: Printer,
) -> Result<()> {
    let questions = quiz.questions().to_vec();
    for (index, question) in questions.iter().enumerate() {
        writeln!(out)?;
        writeln!(out, "{}", printer.bold(&format!("Q{}. {}", index + 1, question.question)))?;
        for (number, option) in question.options.iter().enumerate() {
            writeln!(out, "  {}) {option}", number + 1)?;
        }

        loop {
            write!(out, "Answer [1-{}]: ", question.options.len())?;
            out.flush()?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                bail!("Quiz abandoned before every question was answered");
            }
            let choice = line.trim().parse::<usize>().ok().and_then(|n| n.checked_sub(1));
            if choice.is_some_and(|option| quiz.select(question.id, option)) {
                break;
            }
            writeln!(out, "Please enter a number between 1 and {}.", question.options.len())?;
        }
    }

    if !quiz.submit() {
        bail!("Quiz could not be submitted");
    }

    writeln!(out)?;
    for (index, question) in questions.iter().enumerate() {
        let verdict = if quiz.is_correct(question.id) == Some(true) {
            "correct"
        } else {
            "wrong"
        };
        let answer = question
            .options
            .get(question.correct_answer_index)
            .map_or("", String::as_str);
        writeln!(out, "Q{}: {verdict}. Answer: {answer}", index + 1)?;
        writeln!(out, "  {} {}", printer.bold("Explanation:"), question.explanation)?;
    }
    writeln!(
        out,
        "{}",
        printer.bold(&format!("Score: {} / {}", quiz.score(), questions.len()))
    )?;
    Ok(())
}
