//! Generation backend payloads: pulling the quiz text out of a response body
//! and reading the backend's JSON quiz schema.

#[cfg(feature = "python")]
use pyo3::prelude::*;
use serde_json::{Map, Value};

use crate::matching::{resolve_correct_label, split_label_prefix};
use crate::parser::{parse_quiz_with, ParseOptions};
use crate::questions::{renumber, ParsedQuestion, QuestionOption};

const LABELS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Text to feed the parser: a JSON string body, the `raw_response` field,
/// a string `quizzes` field, or the body as-is.
pub fn extract_quiz_text(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::String(s)) => s,
        Ok(Value::Object(map)) => ["raw_response", "quizzes"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str))
            .map(str::to_string)
            .unwrap_or_else(|| body.to_string()),
        _ => body.to_string(),
    }
}

fn field<'a>(obj: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    obj.iter()
        .find(|(k, _)| names.iter().any(|n| k.eq_ignore_ascii_case(n)))
        .map(|(_, v)| v)
}

fn field_str(obj: &Map<String, Value>, names: &[&str]) -> String {
    match field(obj, names) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Bool(true)) => "True".to_string(),
        Some(Value::Bool(false)) => "False".to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn quiz_entries(value: &Value) -> Option<&Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::Object(map) => field(map, &["quizzes", "questions"]).and_then(Value::as_array),
        _ => None,
    }
}

fn labelled_options(raw: &[Value]) -> Vec<QuestionOption> {
    raw.iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .zip(LABELS.chars())
        .map(|(text, label)| {
            let text = split_label_prefix(text).map(|(_, body)| body).unwrap_or(text);
            QuestionOption::new(label.to_string(), text)
        })
        .collect()
}

fn entry_to_question(entry: &Value) -> Option<ParsedQuestion> {
    let obj = entry.as_object()?;
    let stem = field_str(obj, &["question", "stem"]);
    if stem.is_empty() {
        return None;
    }

    let options = field(obj, &["options", "choices"])
        .and_then(Value::as_array)
        .map(|raw| labelled_options(raw))
        .unwrap_or_default();

    let correct = field_str(obj, &["correct", "correct_answer", "correctAnswer", "answer"]);
    if correct.is_empty() {
        return None;
    }
    // without options the answer is a true/false or open-response key
    let correct_answer = if options.is_empty() {
        match correct.to_lowercase().as_str() {
            "true" => "True".to_string(),
            "false" => "False".to_string(),
            _ => correct,
        }
    } else {
        resolve_correct_label(&options, &correct)?
    };

    Some(ParsedQuestion {
        number: 0,
        stem,
        options,
        correct_answer,
        explanation: field_str(obj, &["explanation"]),
    })
}

/// Questions from the backend's JSON schema
/// (`[{"Question", "Options", "Correct", "Explanation"}]`, optionally under `quizzes`).
/// Returns an empty list when the body is not that shape.
pub fn parse_quiz_json(body: &str) -> Vec<ParsedQuestion> {
    let value: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(_) => return Vec::new(),
    };
    let entries = match quiz_entries(&value) {
        Some(entries) => entries,
        None => return Vec::new(),
    };

    let mut questions: Vec<ParsedQuestion> = entries.iter().filter_map(entry_to_question).collect();
    if questions.len() < entries.len() {
        log::debug!("accepted {} of {} JSON quiz entries", questions.len(), entries.len());
    }
    renumber(&mut questions);
    questions
}

/// Questions from any backend body: JSON schema first, then the text grammar
pub fn parse_response(body: &str, opts: &ParseOptions) -> Vec<ParsedQuestion> {
    let from_json = parse_quiz_json(body);
    if !from_json.is_empty() {
        return from_json;
    }
    parse_quiz_with(&extract_quiz_text(body), opts)
}

// ============= Python Bindings =============

#[cfg(feature = "python")]
#[pyfunction]
#[pyo3(name = "extract_quiz_text")]
pub fn py_extract_quiz_text(body: &str) -> String {
    extract_quiz_text(body)
}

#[cfg(feature = "python")]
#[pyfunction]
#[pyo3(name = "parse_response", signature = (body, options=None))]
pub fn py_parse_response(body: &str, options: Option<ParseOptions>) -> Vec<ParsedQuestion> {
    parse_response(body, &options.unwrap_or_default())
}
