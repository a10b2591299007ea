//! CSV export of finished quizzes for the external report generator

#[cfg(feature = "python")]
use pyo3::prelude::*;
use csv::WriterBuilder;
use std::io::Write;
use std::path::Path;

use crate::error::Result;
use crate::session::SessionReport;

pub const CSV_HEADERS: [&str; 6] = ["number", "question", "correct", "user_answer", "is_correct", "explanation"];

/// Write one row per question
pub fn write_report_csv<W: Write>(writer: W, report: &SessionReport) -> Result<()> {
    let mut csv = WriterBuilder::new().has_headers(true).from_writer(writer);
    csv.write_record(CSV_HEADERS)?;

    for entry in &report.questions {
        csv.write_record([
            entry.number.to_string(),
            entry.question.clone(),
            entry.correct.clone(),
            entry.user_answer.clone(),
            entry.is_correct.to_string(),
            entry.explanation.clone(),
        ])?;
    }
    csv.flush()?;
    Ok(())
}

/// Export to a file; returns number of question rows written
pub fn export_report_csv(path: impl AsRef<Path>, report: &SessionReport) -> Result<usize> {
    let file = std::fs::File::create(path.as_ref())?;
    write_report_csv(file, report)?;
    Ok(report.questions.len())
}

/// Export to an in-memory string
pub fn report_to_csv_string(report: &SessionReport) -> Result<String> {
    let mut buf = Vec::new();
    write_report_csv(&mut buf, report)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

// ============= Python Bindings =============

#[cfg(feature = "python")]
#[pyfunction]
#[pyo3(name = "export_results_csv", signature = (session, path, title="Generated Quiz"))]
pub fn py_export_results_csv(session: PyRef<'_, crate::session::QuizSession>, path: &str, title: &str) -> PyResult<usize> {
    Ok(export_report_csv(path, &session.report(title))?)
}
