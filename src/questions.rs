//! Question records produced by the parsers and consumed by quiz sessions

#[cfg(feature = "python")]
use pyo3::prelude::*;
use serde::{Deserialize, Serialize};

/// One selectable answer choice
#[cfg_attr(feature = "python", pyclass(get_all))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub label: String,
    pub text: String,
}

impl QuestionOption {
    pub fn new(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            text: text.into(),
        }
    }
}

/// A question recovered from the generator's output.
///
/// `number` is the 1-based position among accepted questions; numbers written
/// in the source text are ignored. `stem` and `correct_answer` are never empty.
#[cfg_attr(feature = "python", pyclass(get_all))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedQuestion {
    pub number: usize,
    pub stem: String,
    pub options: Vec<QuestionOption>,
    pub correct_answer: String,
    pub explanation: String,
}

impl ParsedQuestion {
    /// True/false and open-response questions carry no options; the host
    /// shows the answer directly instead of a selection list.
    pub fn has_options(&self) -> bool {
        !self.options.is_empty()
    }

    pub fn option(&self, label: &str) -> Option<&QuestionOption> {
        self.options
            .iter()
            .find(|o| crate::matching::labels_match(&o.label, label))
    }

    pub fn option_labels(&self) -> Vec<&str> {
        self.options.iter().map(|o| o.label.as_str()).collect()
    }
}

/// Renumber accepted questions 1..=N in order
pub(crate) fn renumber(questions: &mut [ParsedQuestion]) {
    for (idx, q) in questions.iter_mut().enumerate() {
        q.number = idx + 1;
    }
}

// ============= Python Binding =============

#[cfg(feature = "python")]
#[pymethods]
impl QuestionOption {
    fn __repr__(&self) -> String {
        format!("QuestionOption(label='{}', text='{}')", self.label, self.text)
    }
}

#[cfg(feature = "python")]
#[pymethods]
impl ParsedQuestion {
    fn __repr__(&self) -> String {
        format!(
            "ParsedQuestion(number={}, stem='{}...', correct='{}')",
            self.number,
            &self.stem.chars().take(40).collect::<String>(),
            self.correct_answer
        )
    }

    #[pyo3(name = "has_options")]
    fn py_has_options(&self) -> bool {
        self.has_options()
    }

    fn to_json(&self) -> PyResult<String> {
        serde_json::to_string(self)
            .map_err(|e| pyo3::exceptions::PyRuntimeError::new_err(e.to_string()))
    }
}
