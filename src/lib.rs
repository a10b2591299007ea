//! ClassQuiz Core - Rust module for the classroom quiz generator
//!
//! Parses the AI backend's quiz text into structured questions, runs
//! answer-locking quiz sessions, and keeps past quizzes and results in SQLite.
//! Python bindings are built with the `python` feature.

mod client;
mod config;
mod db;
mod error;
mod export;
mod matching;
mod parser;
mod progress;
mod questions;
mod response;
mod session;

#[cfg(feature = "python")]
use pyo3::prelude::*;

pub use client::{is_allowed_file, GenerationRequest, HttpQuizGenerator, QuizGenerator};
pub use config::QuizConfig;
pub use db::{delete_quiz, get_quiz, init_database, list_quizzes, load_questions, save_quiz, StoredQuiz};
pub use error::{QuizError, Result};
pub use export::{export_report_csv, report_to_csv_string, write_report_csv};
pub use matching::{check_free_response, labels_match, resolve_correct_label, MatchResult};
pub use parser::{
    extract_correct_answer, extract_explanation, extract_options, extract_stem, parse_quiz, parse_quiz_with,
    split_blocks, AnswerToken, ParseOptions,
};
pub use progress::{get_missed_questions, get_stats, save_session_result, AttemptStats, MissedQuestion};
pub use questions::{ParsedQuestion, QuestionOption};
pub use response::{extract_quiz_text, parse_quiz_json, parse_response};
pub use session::{QuestionStatus, QuizSession, ReportEntry, Selection, SessionOptions, SessionReport};

/// ClassQuiz Core Python Module
#[cfg(feature = "python")]
#[pymodule]
fn classquiz_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Parsing
    m.add_function(wrap_pyfunction!(parser::py_parse_quiz, m)?)?;
    m.add_function(wrap_pyfunction!(response::py_parse_response, m)?)?;
    m.add_function(wrap_pyfunction!(response::py_extract_quiz_text, m)?)?;

    // Answer matching
    m.add_function(wrap_pyfunction!(matching::py_check_free_response, m)?)?;

    // Saved quizzes
    m.add_function(wrap_pyfunction!(db::py_init_database, m)?)?;
    m.add_function(wrap_pyfunction!(db::py_save_quiz, m)?)?;
    m.add_function(wrap_pyfunction!(db::py_get_quiz, m)?)?;
    m.add_function(wrap_pyfunction!(db::py_load_questions, m)?)?;
    m.add_function(wrap_pyfunction!(db::py_list_quizzes, m)?)?;
    m.add_function(wrap_pyfunction!(db::py_delete_quiz, m)?)?;

    // Progress tracking
    m.add_function(wrap_pyfunction!(progress::py_save_session_result, m)?)?;
    m.add_function(wrap_pyfunction!(progress::py_get_stats, m)?)?;
    m.add_function(wrap_pyfunction!(progress::py_get_missed_questions, m)?)?;

    // Export
    m.add_function(wrap_pyfunction!(export::py_export_results_csv, m)?)?;

    // Register classes
    m.add_class::<questions::QuestionOption>()?;
    m.add_class::<questions::ParsedQuestion>()?;
    m.add_class::<parser::ParseOptions>()?;
    m.add_class::<matching::MatchResult>()?;
    m.add_class::<session::SessionOptions>()?;
    m.add_class::<session::Selection>()?;
    m.add_class::<session::QuestionStatus>()?;
    m.add_class::<session::QuizSession>()?;
    m.add_class::<client::GenerationRequest>()?;
    m.add_class::<client::HttpQuizGenerator>()?;
    m.add_class::<db::StoredQuiz>()?;
    m.add_class::<progress::AttemptStats>()?;
    m.add_class::<progress::MissedQuestion>()?;

    Ok(())
}
