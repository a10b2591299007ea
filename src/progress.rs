//! Progress tracking - finished-session results and statistics.
//!
//! Live sessions are never stored; results are written once the host decides
//! the quiz is over.

#[cfg(feature = "python")]
use pyo3::prelude::*;
use rusqlite::{params, Connection};

use crate::error::Result;
use crate::session::QuizSession;

/// Attempt statistics, optionally for one quiz
#[cfg_attr(feature = "python", pyclass(get_all))]
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptStats {
    pub total_attempts: i64,
    pub correct_count: i64,
    pub incorrect_count: i64,
    pub accuracy_percent: f64,
}

/// A question students keep getting wrong
#[cfg_attr(feature = "python", pyclass(get_all))]
#[derive(Debug, Clone, PartialEq)]
pub struct MissedQuestion {
    pub question_number: i64,
    pub question_text: String,
    pub correct_answer: String,
    pub miss_count: i64,
}

/// Record every answered question of a session; returns rows written
pub fn save_session_result(conn: &Connection, quiz_id: i64, session: &QuizSession) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let mut written = 0;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO attempts (quiz_id, question_number, question_text, user_answer, correct_answer, is_correct)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for (i, question) in session.questions().iter().enumerate() {
            let Some(answer) = session.answer(i) else {
                continue;
            };
            let is_correct = crate::matching::labels_match(answer, &question.correct_answer);
            stmt.execute(params![
                quiz_id,
                question.number as i64,
                question.stem,
                answer,
                question.correct_answer,
                is_correct as i32
            ])?;
            written += 1;
        }
    }
    tx.commit()?;

    log::info!(
        "saved {} answers for quiz {} (score {}/{})",
        written,
        quiz_id,
        session.score(),
        session.total()
    );
    Ok(written)
}

/// Get overall statistics, or statistics for one quiz
pub fn get_stats(conn: &Connection, quiz_id: Option<i64>) -> Result<AttemptStats> {
    let stats = conn.query_row(
        "SELECT COUNT(*), SUM(is_correct) FROM attempts WHERE ?1 IS NULL OR quiz_id = ?1",
        params![quiz_id],
        |row| {
            let total: i64 = row.get(0)?;
            let correct: i64 = row.get::<_, Option<i64>>(1)?.unwrap_or(0);
            let accuracy = if total > 0 {
                (correct as f64 / total as f64) * 100.0
            } else {
                0.0
            };

            Ok(AttemptStats {
                total_attempts: total,
                correct_count: correct,
                incorrect_count: total - correct,
                accuracy_percent: accuracy,
            })
        },
    )?;
    Ok(stats)
}

/// Questions of a quiz answered incorrectly, most-missed first
pub fn get_missed_questions(conn: &Connection, quiz_id: i64, limit: Option<usize>) -> Result<Vec<MissedQuestion>> {
    let limit_clause = limit.map(|l| format!(" LIMIT {}", l)).unwrap_or_default();
    let query = format!(
        "SELECT question_number, question_text, correct_answer, COUNT(*) AS misses
         FROM attempts
         WHERE quiz_id = ?1 AND is_correct = 0
         GROUP BY question_number
         ORDER BY misses DESC, question_number ASC{}",
        limit_clause
    );

    let mut stmt = conn.prepare(&query)?;
    let missed = stmt
        .query_map(params![quiz_id], |row| {
            Ok(MissedQuestion {
                question_number: row.get(0)?,
                question_text: row.get(1)?,
                correct_answer: row.get(2)?,
                miss_count: row.get(3)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(missed)
}

// ============= Python Bindings =============

#[cfg(feature = "python")]
#[pymethods]
impl AttemptStats {
    fn __repr__(&self) -> String {
        format!(
            "AttemptStats(total={}, correct={}, accuracy={:.1}%)",
            self.total_attempts, self.correct_count, self.accuracy_percent
        )
    }
}

#[cfg(feature = "python")]
#[pyfunction]
#[pyo3(name = "save_session_result")]
pub fn py_save_session_result(db_path: &str, quiz_id: i64, session: PyRef<'_, QuizSession>) -> PyResult<usize> {
    Ok(save_session_result(&crate::db::open(db_path)?, quiz_id, &session)?)
}

#[cfg(feature = "python")]
#[pyfunction]
#[pyo3(name = "get_stats", signature = (db_path, quiz_id=None))]
pub fn py_get_stats(db_path: &str, quiz_id: Option<i64>) -> PyResult<AttemptStats> {
    Ok(get_stats(&crate::db::open(db_path)?, quiz_id)?)
}

#[cfg(feature = "python")]
#[pyfunction]
#[pyo3(name = "get_missed_questions", signature = (db_path, quiz_id, limit=None))]
pub fn py_get_missed_questions(db_path: &str, quiz_id: i64, limit: Option<usize>) -> PyResult<Vec<MissedQuestion>> {
    Ok(get_missed_questions(&crate::db::open(db_path)?, quiz_id, limit)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init_database, save_quiz};
    use crate::parser::parse_quiz;
    use crate::session::SessionOptions;

    const RAW: &str = "**Question 1:**\n**Stem:** Q1?\nA. x\nB. y\nCorrect Answer: A\n\
**Question 2:**\n**Stem:** Q2?\nA. x\nB. y\nCorrect Answer: B\n\
**Question 3:**\n**Stem:** Q3?\nA. x\nB. y\nCorrect Answer: B\n";

    #[test]
    fn records_answered_questions_and_reports_stats() {
        let dir = tempfile::tempdir().unwrap();
        let conn = init_database(dir.path().join("p.db").to_str().unwrap()).unwrap();
        let quiz_id = save_quiz(&conn, Some("Stats"), RAW, &crate::parser::ParseOptions::default()).unwrap();

        for _ in 0..2 {
            let mut session = QuizSession::new(parse_quiz(RAW), SessionOptions::default());
            session.select_answer(0, "A");
            session.select_answer(1, "A");
            assert_eq!(save_session_result(&conn, quiz_id, &session).unwrap(), 2);
        }

        let stats = get_stats(&conn, Some(quiz_id)).unwrap();
        assert_eq!(stats.total_attempts, 4);
        assert_eq!(stats.correct_count, 2);
        assert_eq!(stats.incorrect_count, 2);
        assert!((stats.accuracy_percent - 50.0).abs() < f64::EPSILON);

        let missed = get_missed_questions(&conn, quiz_id, Some(5)).unwrap();
        assert_eq!(missed.len(), 1);
        assert_eq!(missed[0].question_number, 2);
        assert_eq!(missed[0].question_text, "Q2?");
        assert_eq!(missed[0].miss_count, 2);
    }

    #[test]
    fn empty_stats() {
        let dir = tempfile::tempdir().unwrap();
        let conn = init_database(dir.path().join("p.db").to_str().unwrap()).unwrap();
        let stats = get_stats(&conn, None).unwrap();
        assert_eq!(stats.total_attempts, 0);
        assert_eq!(stats.accuracy_percent, 0.0);
    }
}
