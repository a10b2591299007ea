//! Quiz session: per-question answer locks and a live score.
//!
//! Each question moves `Unanswered → Answered(label)` exactly once. There is no
//! submit step and no reset; a new quiz means a new session.

#[cfg(feature = "python")]
use pyo3::prelude::*;
use serde::{Deserialize, Serialize};

use crate::matching::labels_match;
use crate::parser::is_option_label;
use crate::questions::ParsedQuestion;

pub const NOT_ANSWERED: &str = "Not answered";

#[cfg_attr(feature = "python", pyclass(get_all, set_all))]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionOptions {
    /// Reject labels that are neither an option label nor the correct answer
    pub strict_label_validation: bool,
}

/// Outcome of [`QuizSession::select_answer`]. Only `Recorded` changes state.
#[cfg_attr(feature = "python", pyclass(eq, eq_int))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Recorded,
    AlreadyAnswered,
    OutOfRange,
    Rejected,
}

#[cfg_attr(feature = "python", pyclass(eq, eq_int))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionStatus {
    Unanswered,
    Correct,
    Incorrect,
}

#[cfg_attr(feature = "python", pyclass)]
#[derive(Debug, Clone)]
pub struct QuizSession {
    questions: Vec<ParsedQuestion>,
    answers: Vec<Option<String>>,
    options: SessionOptions,
}

/// One row of the exported results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportEntry {
    pub number: usize,
    pub question: String,
    pub options: Vec<String>,
    pub correct: String,
    pub explanation: String,
    pub user_answer: String,
    pub is_correct: bool,
}

/// Finished-quiz export handed to the host and the report generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub title: String,
    pub questions: Vec<ReportEntry>,
    pub score: usize,
    pub total: usize,
    pub percentage: u32,
}

impl QuizSession {
    pub fn new(questions: Vec<ParsedQuestion>, options: SessionOptions) -> Self {
        let answers = vec![None; questions.len()];
        Self {
            questions,
            answers,
            options,
        }
    }

    pub fn questions(&self) -> &[ParsedQuestion] {
        &self.questions
    }

    pub fn answers(&self) -> &[Option<String>] {
        &self.answers
    }

    fn label_allowed(&self, question: &ParsedQuestion, label: &str) -> bool {
        !self.options.strict_label_validation
            || is_option_label(question, label)
            || labels_match(&question.correct_answer, label)
    }

    /// Record `label` for question `index` unless it is already answered.
    /// Never fails; the returned [`Selection`] says what happened.
    pub fn select_answer(&mut self, index: usize, label: &str) -> Selection {
        let Some(question) = self.questions.get(index) else {
            log::debug!("selection for question index {} out of range", index);
            return Selection::OutOfRange;
        };
        if self.answers[index].is_some() {
            return Selection::AlreadyAnswered;
        }
        if !self.label_allowed(question, label) {
            log::debug!("rejected label '{}' for question {}", label, question.number);
            return Selection::Rejected;
        }
        self.answers[index] = Some(label.to_string());
        Selection::Recorded
    }

    pub fn answer(&self, index: usize) -> Option<&str> {
        self.answers.get(index).and_then(|a| a.as_deref())
    }

    pub fn is_answered(&self, index: usize) -> bool {
        self.answer(index).is_some()
    }

    fn is_correct_at(&self, index: usize) -> bool {
        match (self.answer(index), self.questions.get(index)) {
            (Some(answer), Some(q)) => labels_match(answer, &q.correct_answer),
            _ => false,
        }
    }

    /// Count of answers equal (case-insensitively) to the correct answer
    pub fn score(&self) -> usize {
        (0..self.questions.len()).filter(|&i| self.is_correct_at(i)).count()
    }

    pub fn total(&self) -> usize {
        self.questions.len()
    }

    pub fn answered_count(&self) -> usize {
        self.answers.iter().filter(|a| a.is_some()).count()
    }

    pub fn is_complete(&self) -> bool {
        self.answered_count() == self.total()
    }

    /// Rounded percentage; 0 for an empty quiz
    pub fn percentage(&self) -> u32 {
        if self.questions.is_empty() {
            return 0;
        }
        ((self.score() as f64 / self.total() as f64) * 100.0).round() as u32
    }

    pub fn status(&self, index: usize) -> QuestionStatus {
        if !self.is_answered(index) {
            QuestionStatus::Unanswered
        } else if self.is_correct_at(index) {
            QuestionStatus::Correct
        } else {
            QuestionStatus::Incorrect
        }
    }

    /// Verdict line shown under an answered question
    pub fn feedback(&self, index: usize) -> Option<String> {
        let question = self.questions.get(index)?;
        match self.status(index) {
            QuestionStatus::Unanswered => None,
            QuestionStatus::Correct => Some("Correct!".to_string()),
            QuestionStatus::Incorrect => Some(format!("Wrong. Correct answer: {}.", question.correct_answer)),
        }
    }

    pub fn report(&self, title: &str) -> SessionReport {
        let questions = self
            .questions
            .iter()
            .enumerate()
            .map(|(i, q)| ReportEntry {
                number: q.number,
                question: q.stem.clone(),
                options: q.options.iter().map(|o| format!("{}. {}", o.label, o.text)).collect(),
                correct: q.correct_answer.clone(),
                explanation: q.explanation.clone(),
                user_answer: self.answer(i).unwrap_or(NOT_ANSWERED).to_string(),
                is_correct: self.is_correct_at(i),
            })
            .collect();

        SessionReport {
            title: title.to_string(),
            questions,
            score: self.score(),
            total: self.total(),
            percentage: self.percentage(),
        }
    }
}

// ============= Python Bindings =============

#[cfg(feature = "python")]
#[pymethods]
impl SessionOptions {
    #[new]
    #[pyo3(signature = (strict_label_validation=false))]
    fn py_new(strict_label_validation: bool) -> Self {
        Self {
            strict_label_validation,
        }
    }
}

#[cfg(feature = "python")]
#[pymethods]
impl QuizSession {
    #[new]
    #[pyo3(signature = (questions, options=None))]
    fn py_new(questions: Vec<ParsedQuestion>, options: Option<SessionOptions>) -> Self {
        Self::new(questions, options.unwrap_or_default())
    }

    /// Parse raw generator output and open a session on it
    #[staticmethod]
    #[pyo3(signature = (body, strict_label_validation=false))]
    fn from_response(body: &str, strict_label_validation: bool) -> Self {
        let questions = crate::response::parse_response(body, &crate::parser::ParseOptions::default());
        Self::new(questions, SessionOptions { strict_label_validation })
    }

    #[getter(questions)]
    fn py_questions(&self) -> Vec<ParsedQuestion> {
        self.questions.clone()
    }

    #[getter(answers)]
    fn py_answers(&self) -> Vec<Option<String>> {
        self.answers.clone()
    }

    #[pyo3(name = "select_answer")]
    fn py_select_answer(&mut self, index: usize, label: &str) -> Selection {
        self.select_answer(index, label)
    }

    #[pyo3(name = "answer")]
    fn py_answer(&self, index: usize) -> Option<String> {
        self.answer(index).map(str::to_string)
    }

    #[pyo3(name = "score")]
    fn py_score(&self) -> usize {
        self.score()
    }

    #[pyo3(name = "total")]
    fn py_total(&self) -> usize {
        self.total()
    }

    #[pyo3(name = "answered_count")]
    fn py_answered_count(&self) -> usize {
        self.answered_count()
    }

    #[pyo3(name = "is_complete")]
    fn py_is_complete(&self) -> bool {
        self.is_complete()
    }

    #[pyo3(name = "percentage")]
    fn py_percentage(&self) -> u32 {
        self.percentage()
    }

    #[pyo3(name = "status")]
    fn py_status(&self, index: usize) -> QuestionStatus {
        self.status(index)
    }

    #[pyo3(name = "feedback")]
    fn py_feedback(&self, index: usize) -> Option<String> {
        self.feedback(index)
    }

    #[pyo3(signature = (title="Generated Quiz"))]
    fn report_json(&self, title: &str) -> PyResult<String> {
        serde_json::to_string_pretty(&self.report(title))
            .map_err(|e| pyo3::exceptions::PyRuntimeError::new_err(e.to_string()))
    }

    fn __len__(&self) -> usize {
        self.total()
    }

    fn __repr__(&self) -> String {
        format!(
            "QuizSession(score={}/{}, answered={})",
            self.score(),
            self.total(),
            self.answered_count()
        )
    }
}
