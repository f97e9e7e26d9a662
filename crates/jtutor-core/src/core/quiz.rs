//! Quiz questions and the answer/submit state machine.

use std::collections::{BTreeMap, HashSet};

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// One multiple-choice question as returned by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub id: i64,
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer_index: usize,
    pub explanation: String,
}

/// Response schema sent with the quiz request.
pub fn response_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "id": { "type": "INTEGER" },
                "question": { "type": "STRING" },
                "options": { "type": "ARRAY", "items": { "type": "STRING" } },
                "correctAnswerIndex": { "type": "INTEGER" },
                "explanation": { "type": "STRING" }
            },
            "required": ["id", "question", "options", "correctAnswerIndex", "explanation"]
        }
    })
}

/// Parses and validates a quiz payload.
///
/// The whole list is rejected when any question is unusable: no options, a
/// correct index outside the options, or an id used twice.
///
/// # Errors
/// Returns an error describing the first problem found.
pub fn parse_questions(payload: &str) -> Result<Vec<QuizQuestion>> {
    let questions: Vec<QuizQuestion> = serde_json::from_str(strip_json_fence(payload))?;

    let mut ids = HashSet::new();
    for question in &questions {
        if question.options.is_empty() {
            bail!("question {} has no options", question.id);
        }
        if question.correct_answer_index >= question.options.len() {
            bail!(
                "question {} marks option {} correct but has {} options",
                question.id,
                question.correct_answer_index,
                question.options.len()
            );
        }
        if !ids.insert(question.id) {
            bail!("question id {} is used twice", question.id);
        }
    }
    Ok(questions)
}

fn strip_json_fence(payload: &str) -> &str {
    let trimmed = payload.trim();
    let Some(inner) = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
    else {
        return trimmed;
    };
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

/// A generated quiz and the learner's answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quiz {
    questions: Vec<QuizQuestion>,
    answers: BTreeMap<i64, usize>,
    submitted: bool,
}

impl Quiz {
    pub fn new(questions: Vec<QuizQuestion>) -> Self {
        Self {
            questions,
            answers: BTreeMap::new(),
            submitted: false,
        }
    }

    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }

    /// Records an answer. Returns false when it was ignored: after submit,
    /// for an unknown question, or for an option the question does not have.
    pub fn select(&mut self, question_id: i64, option: usize) -> bool {
        if self.submitted {
            return false;
        }
        let Some(question) = self.questions.iter().find(|q| q.id == question_id) else {
            return false;
        };
        if option >= question.options.len() {
            return false;
        }
        self.answers.insert(question_id, option);
        true
    }

    pub fn selected(&self, question_id: i64) -> Option<usize> {
        self.answers.get(&question_id).copied()
    }

    /// True once every question has an answer.
    pub fn can_submit(&self) -> bool {
        !self.submitted
            && !self.questions.is_empty()
            && self
                .questions
                .iter()
                .all(|q| self.answers.contains_key(&q.id))
    }

    /// Locks the answers. Returns false if the quiz was not ready.
    pub fn submit(&mut self) -> bool {
        if !self.can_submit() {
            return false;
        }
        self.submitted = true;
        true
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    /// Number of correctly answered questions.
    pub fn score(&self) -> usize {
        self.questions
            .iter()
            .filter(|q| self.selected(q.id) == Some(q.correct_answer_index))
            .count()
    }

    /// Whether a question was answered correctly; `None` before submit.
    pub fn is_correct(&self, question_id: i64) -> Option<bool> {
        if !self.submitted {
            return None;
        }
        let question = self.questions.iter().find(|q| q.id == question_id)?;
        Some(self.selected(question_id) == Some(question.correct_answer_index))
    }
}

/// What the quiz screen shows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum QuizView {
    /// Nothing requested yet.
    #[default]
    Idle,
    /// Generation came back with no usable questions.
    Failed,
    Ready(Quiz),
}

impl QuizView {
    /// View for a freshly generated question list. Any previous answers are
    /// discarded by the caller replacing the old view.
    pub fn from_questions(questions: Vec<QuizQuestion>) -> Self {
        if questions.is_empty() {
            QuizView::Failed
        } else {
            QuizView::Ready(Quiz::new(questions))
        }
    }

    pub fn quiz(&self) -> Option<&Quiz> {
        match self {
            QuizView::Ready(quiz) => Some(quiz),
            QuizView::Idle | QuizView::Failed => None,
        }
    }

    pub fn quiz_mut(&mut self) -> Option<&mut Quiz> {
        match self {
            QuizView::Ready(quiz) => Some(quiz),
            QuizView::Idle | QuizView::Failed => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = r#"[
        {"id": 1, "question": "Which keyword inherits?", "options": ["extends", "implements", "super"], "correctAnswerIndex": 0, "explanation": "Classes extend classes."},
        {"id": 2, "question": "Is Java pass-by-value?", "options": ["Yes", "No"], "correctAnswerIndex": 0, "explanation": "References are copied."}
    ]"#;

    fn quiz() -> Quiz {
        Quiz::new(parse_questions(PAYLOAD).unwrap())
    }

    #[test]
    fn test_parse_wire_names() {
        let questions = parse_questions(PAYLOAD).unwrap();
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].correct_answer_index, 0);
        assert_eq!(questions[1].options, vec!["Yes", "No"]);
    }

    #[test]
    fn test_parse_accepts_fenced_json() {
        let fenced = format!("```json\n{PAYLOAD}\n```");
        assert_eq!(parse_questions(&fenced).unwrap().len(), 2);
    }

    #[test]
    fn test_parse_rejects_invalid_payloads() {
        let cases = [
            "",
            "not json",
            r#"{"id": 1}"#,
            r#"[{"id": 1, "question": "q", "options": [], "correctAnswerIndex": 0, "explanation": ""}]"#,
            r#"[{"id": 1, "question": "q", "options": ["a"], "correctAnswerIndex": 1, "explanation": ""}]"#,
            r#"[{"id": 1, "question": "q", "options": ["a"], "correctAnswerIndex": -1, "explanation": ""}]"#,
            r#"[{"id": 1, "question": "q", "options": ["a"], "correctAnswerIndex": 0, "explanation": ""},
                {"id": 1, "question": "r", "options": ["b"], "correctAnswerIndex": 0, "explanation": ""}]"#,
        ];
        for payload in cases {
            assert!(parse_questions(payload).is_err(), "{payload}");
        }
    }

    #[test]
    fn test_submit_requires_every_answer() {
        let mut quiz = quiz();
        assert!(!quiz.can_submit());
        assert!(quiz.select(1, 0));
        assert!(!quiz.submit());
        assert!(quiz.select(2, 1));
        assert!(quiz.can_submit());
        assert!(quiz.submit());
        assert_eq!(quiz.score(), 1);
        assert_eq!(quiz.is_correct(1), Some(true));
        assert_eq!(quiz.is_correct(2), Some(false));
    }

    #[test]
    fn test_select_ignored_after_submit_and_for_bad_input() {
        let mut quiz = quiz();
        assert!(!quiz.select(99, 0));
        assert!(!quiz.select(1, 3));
        quiz.select(1, 1);
        quiz.select(2, 0);
        quiz.submit();

        assert!(!quiz.select(1, 0));
        assert_eq!(quiz.selected(1), Some(1));
        assert!(!quiz.submit());
        assert_eq!(quiz.score(), 1);
    }

    #[test]
    fn test_reselect_before_submit_overwrites() {
        let mut quiz = quiz();
        quiz.select(1, 2);
        quiz.select(1, 0);
        assert_eq!(quiz.selected(1), Some(0));
        assert_eq!(quiz.is_correct(1), None);
    }

    #[test]
    fn test_view_failed_is_distinct_from_idle() {
        assert_eq!(QuizView::default(), QuizView::Idle);
        let view = QuizView::from_questions(Vec::new());
        assert_eq!(view, QuizView::Failed);
        assert_ne!(view, QuizView::Idle);
        assert!(view.quiz().is_none());

        let ready = QuizView::from_questions(parse_questions(PAYLOAD).unwrap());
        assert_eq!(ready.quiz().unwrap().questions().len(), 2);
    }
}
