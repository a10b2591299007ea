//! Quiz generation backend.
//!
//! The parser and session never talk to the network; hosts inject a
//! [`QuizGenerator`] and feed its text into [`crate::response::parse_response`].

#[cfg(feature = "python")]
use pyo3::prelude::*;
use reqwest::blocking::{multipart, Client};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::QuizConfig;
use crate::error::{QuizError, Result};
use crate::response::extract_quiz_text;

pub const MIN_QUIZZES: u32 = 1;
pub const MAX_QUIZZES: u32 = 20;

/// Lecture material types the backend accepts
pub const ALLOWED_EXTENSIONS: [&str; 17] = [
    "pdf", "txt", "docx", "doc", "pptx", "ppt", "xls", "xlsx", "csv", "png", "jpg", "jpeg", "gif", "bmp", "tiff",
    "ico", "webp",
];

#[cfg_attr(feature = "python", pyclass(get_all, set_all))]
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// Lecture content or topic
    pub prompt: String,
    pub num_quizzes: u32,
    /// Student questions the quiz should cover
    pub questions: Option<String>,
    /// Slides or other lecture material
    pub file: Option<PathBuf>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>, num_quizzes: u32) -> Self {
        Self {
            prompt: prompt.into(),
            num_quizzes,
            questions: None,
            file: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.prompt.trim().is_empty() {
            return Err(QuizError::Validation("Please provide lecture content or topic".to_string()));
        }
        if !(MIN_QUIZZES..=MAX_QUIZZES).contains(&self.num_quizzes) {
            return Err(QuizError::Validation(format!(
                "Number of questions must be between {} and {}",
                MIN_QUIZZES, MAX_QUIZZES
            )));
        }
        if let Some(file) = &self.file {
            if !is_allowed_file(file) {
                return Err(QuizError::Validation(format!(
                    "Invalid file type: {}",
                    file.display()
                )));
            }
        }
        Ok(())
    }
}

pub fn is_allowed_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .is_some_and(|e| ALLOWED_EXTENSIONS.contains(&e.as_str()))
}

/// Anything that turns a generation request into raw quiz text
pub trait QuizGenerator {
    fn generate(&self, request: &GenerationRequest) -> Result<String>;
}

/// Blocking multipart client for the `/generate-quiz` backend
#[cfg_attr(feature = "python", pyclass)]
#[derive(Debug, Clone)]
pub struct HttpQuizGenerator {
    endpoint: String,
    client: Client,
}

impl HttpQuizGenerator {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }

    pub fn from_config(config: &QuizConfig) -> Result<Self> {
        Self::new(config.endpoint.clone(), Duration::from_secs(config.timeout_secs))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn build_form(request: &GenerationRequest) -> Result<multipart::Form> {
        let mut form = multipart::Form::new()
            .text("prompt", request.prompt.clone())
            .text("num_quizzes", request.num_quizzes.to_string());
        if let Some(questions) = request.questions.as_ref().filter(|q| !q.trim().is_empty()) {
            form = form.text("questions", questions.clone());
        }
        if let Some(file) = &request.file {
            form = form.file("file", file)?;
        }
        Ok(form)
    }
}

/// Message from an error body: the JSON `error` field, else the raw body
pub fn backend_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                "Failed to generate quiz".to_string()
            } else {
                body.trim().to_string()
            }
        })
}

impl QuizGenerator for HttpQuizGenerator {
    fn generate(&self, request: &GenerationRequest) -> Result<String> {
        request.validate()?;
        let form = Self::build_form(request)?;

        log::debug!("requesting {} questions from {}", request.num_quizzes, self.endpoint);
        let response = self.client.post(&self.endpoint).multipart(form).send()?;
        let status = response.status();
        let body = response.text()?;

        if !status.is_success() {
            let message = backend_error_message(&body);
            log::warn!("quiz generation failed ({}): {}", status, message);
            return Err(QuizError::Backend {
                status: status.as_u16(),
                message,
            });
        }
        Ok(extract_quiz_text(&body))
    }
}

// ============= Python Bindings =============

#[cfg(feature = "python")]
#[pymethods]
impl GenerationRequest {
    #[new]
    #[pyo3(signature = (prompt, num_quizzes=5, questions=None, file=None))]
    fn py_new(prompt: String, num_quizzes: u32, questions: Option<String>, file: Option<PathBuf>) -> Self {
        Self {
            prompt,
            num_quizzes,
            questions,
            file,
        }
    }
}

#[cfg(feature = "python")]
#[pymethods]
impl HttpQuizGenerator {
    #[new]
    #[pyo3(signature = (endpoint=None, timeout_secs=None))]
    fn py_new(endpoint: Option<String>, timeout_secs: Option<u64>) -> PyResult<Self> {
        let config = QuizConfig::load()?;
        let endpoint = endpoint.unwrap_or(config.endpoint);
        let timeout = Duration::from_secs(timeout_secs.unwrap_or(config.timeout_secs));
        Ok(Self::new(endpoint, timeout)?)
    }

    #[pyo3(name = "generate")]
    fn py_generate(&self, py: Python<'_>, request: GenerationRequest) -> PyResult<String> {
        Ok(py.allow_threads(|| self.generate(&request))?)
    }

    #[getter(endpoint)]
    fn py_endpoint(&self) -> String {
        self.endpoint.clone()
    }
}
