//! Database operations for saved quizzes (the "past quizzes" list)

use chrono::{Local, Utc};
#[cfg(feature = "python")]
use pyo3::prelude::*;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::error::{QuizError, Result};
use crate::parser::ParseOptions;
use crate::questions::ParsedQuestion;
use crate::response::parse_response;

/// A generated quiz kept for later review. Only the raw generator body (text
/// or the backend's JSON) is stored; questions are re-parsed on load.
#[cfg_attr(feature = "python", pyclass(get_all))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredQuiz {
    pub id: i64,
    pub title: String,
    pub raw_text: String,
    pub question_count: i64,
    pub created_at: String,
}

/// Initialize database with schema
pub fn init_database(db_path: &str) -> Result<Connection> {
    let conn = Connection::open(db_path)?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS quizzes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            raw_text TEXT NOT NULL,
            question_count INTEGER NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS attempts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            quiz_id INTEGER REFERENCES quizzes(id),
            question_number INTEGER NOT NULL,
            question_text TEXT NOT NULL,
            user_answer TEXT NOT NULL,
            correct_answer TEXT NOT NULL,
            is_correct INTEGER NOT NULL,
            attempted_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    Ok(conn)
}

fn default_title() -> String {
    format!("Generated Quiz {}", Local::now().format("%Y-%m-%d %H:%M"))
}

fn row_to_quiz(row: &Row<'_>) -> rusqlite::Result<StoredQuiz> {
    Ok(StoredQuiz {
        id: row.get(0)?,
        title: row.get(1)?,
        raw_text: row.get(2)?,
        question_count: row.get(3)?,
        created_at: row.get(4)?,
    })
}

/// Store raw generator output; returns the new quiz id
pub fn save_quiz(conn: &Connection, title: Option<&str>, raw_text: &str, opts: &ParseOptions) -> Result<i64> {
    let title = title
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .unwrap_or_else(default_title);
    let question_count = parse_response(raw_text, opts).len() as i64;

    conn.execute(
        "INSERT INTO quizzes (title, raw_text, question_count, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![title, raw_text, question_count, Utc::now().to_rfc3339()],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Get single quiz by ID
pub fn get_quiz(conn: &Connection, quiz_id: i64) -> Result<Option<StoredQuiz>> {
    let quiz = conn
        .query_row(
            "SELECT id, title, raw_text, question_count, created_at FROM quizzes WHERE id = ?1",
            params![quiz_id],
            row_to_quiz,
        )
        .optional()?;
    Ok(quiz)
}

/// Re-parse a stored quiz
pub fn load_questions(conn: &Connection, quiz_id: i64, opts: &ParseOptions) -> Result<Vec<ParsedQuestion>> {
    let quiz = get_quiz(conn, quiz_id)?.ok_or_else(|| QuizError::NotFound(format!("quiz {}", quiz_id)))?;
    Ok(parse_response(&quiz.raw_text, opts))
}

/// All saved quizzes, newest first
pub fn list_quizzes(conn: &Connection) -> Result<Vec<StoredQuiz>> {
    let mut stmt = conn.prepare(
        "SELECT id, title, raw_text, question_count, created_at FROM quizzes ORDER BY created_at DESC, id DESC",
    )?;
    let quizzes = stmt
        .query_map([], row_to_quiz)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(quizzes)
}

/// Delete a quiz and its recorded attempts
pub fn delete_quiz(conn: &Connection, quiz_id: i64) -> Result<usize> {
    conn.execute("DELETE FROM attempts WHERE quiz_id = ?1", params![quiz_id])?;
    let deleted = conn.execute("DELETE FROM quizzes WHERE id = ?1", params![quiz_id])?;
    Ok(deleted)
}

// ============= Python Bindings =============

#[cfg(feature = "python")]
#[pymethods]
impl StoredQuiz {
    fn __repr__(&self) -> String {
        format!(
            "StoredQuiz(id={}, title='{}', questions={})",
            self.id, self.title, self.question_count
        )
    }
}

#[cfg(feature = "python")]
pub(crate) fn open(db_path: &str) -> PyResult<Connection> {
    Ok(Connection::open(db_path).map_err(QuizError::from)?)
}

#[cfg(feature = "python")]
#[pyfunction]
#[pyo3(name = "init_database")]
pub fn py_init_database(db_path: &str) -> PyResult<()> {
    init_database(db_path)?;
    Ok(())
}

#[cfg(feature = "python")]
#[pyfunction]
#[pyo3(name = "save_quiz", signature = (db_path, raw_text, title=None, options=None))]
pub fn py_save_quiz(db_path: &str, raw_text: &str, title: Option<&str>, options: Option<ParseOptions>) -> PyResult<i64> {
    Ok(save_quiz(&open(db_path)?, title, raw_text, &options.unwrap_or_default())?)
}

#[cfg(feature = "python")]
#[pyfunction]
#[pyo3(name = "get_quiz")]
pub fn py_get_quiz(db_path: &str, quiz_id: i64) -> PyResult<Option<StoredQuiz>> {
    Ok(get_quiz(&open(db_path)?, quiz_id)?)
}

#[cfg(feature = "python")]
#[pyfunction]
#[pyo3(name = "load_questions", signature = (db_path, quiz_id, options=None))]
pub fn py_load_questions(db_path: &str, quiz_id: i64, options: Option<ParseOptions>) -> PyResult<Vec<ParsedQuestion>> {
    Ok(load_questions(&open(db_path)?, quiz_id, &options.unwrap_or_default())?)
}

#[cfg(feature = "python")]
#[pyfunction]
#[pyo3(name = "list_quizzes")]
pub fn py_list_quizzes(db_path: &str) -> PyResult<Vec<StoredQuiz>> {
    Ok(list_quizzes(&open(db_path)?)?)
}

#[cfg(feature = "python")]
#[pyfunction]
#[pyo3(name = "delete_quiz")]
pub fn py_delete_quiz(db_path: &str, quiz_id: i64) -> PyResult<usize> {
    Ok(delete_quiz(&open(db_path)?, quiz_id)?)
}
