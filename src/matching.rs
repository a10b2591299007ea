//! Answer matching: label comparison, resolving free-form correct answers
//! onto option labels, and fuzzy grading of open responses

#[cfg(feature = "python")]
use pyo3::prelude::*;
use strsim::{jaro_winkler, levenshtein, normalized_levenshtein};

use crate::questions::QuestionOption;

/// Minimum similarity for a free-form correct answer to resolve onto an option
pub const OPTION_MATCH_THRESHOLD: f64 = 0.85;

/// Result of fuzzy matching comparison
#[cfg_attr(feature = "python", pyclass(get_all))]
#[derive(Debug, Clone)]
pub struct MatchResult {
    pub is_correct: bool,
    pub similarity_score: f64,
    pub feedback: String,
}

/// Case-insensitive label equality used for scoring
pub fn labels_match(a: &str, b: &str) -> bool {
    a.to_uppercase() == b.to_uppercase()
}

fn normalize(s: &str) -> String {
    s.trim()
        .trim_matches(|c: char| c == '*' || c == '_' || c == '.' || c.is_whitespace())
        .to_lowercase()
}

/// Weighted similarity (Jaro-Winkler is better for typos)
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = normalize(a);
    let b = normalize(b);
    if a == b {
        return 1.0;
    }
    normalized_levenshtein(&a, &b) * 0.4 + jaro_winkler(&a, &b) * 0.6
}

/// Split a leading `A.`, `(a)`, `B)` or `C:` marker off an option-like string
pub fn split_label_prefix(s: &str) -> Option<(char, &str)> {
    let trimmed = s.trim_start();
    let (rest, parenthesized) = match trimmed.strip_prefix('(') {
        Some(r) => (r, true),
        None => (trimmed, false),
    };
    let mut chars = rest.char_indices();
    let (_, letter) = chars.next()?;
    if !letter.is_ascii_alphabetic() {
        return None;
    }
    let (sep_idx, sep) = chars.next()?;
    let ok = if parenthesized {
        sep == ')'
    } else {
        matches!(sep, '.' | ')' | ':')
    };
    if !ok {
        return None;
    }
    let body = &rest[sep_idx + sep.len_utf8()..];
    // "A.B" style abbreviations are not markers
    if !body.is_empty() && !body.starts_with(char::is_whitespace) {
        return None;
    }
    Some((letter.to_ascii_uppercase(), body.trim()))
}

/// Map a free-form correct answer onto one of the option labels.
///
/// Tries, in order: a bare letter, a letter-prefixed answer (`B) Paris`),
/// exact option text, then the most similar option text above
/// [`OPTION_MATCH_THRESHOLD`].
pub fn resolve_correct_label(options: &[QuestionOption], raw: &str) -> Option<String> {
    let raw = raw.trim().trim_matches(|c: char| c == '*' || c == '_').trim();
    if raw.is_empty() || options.is_empty() {
        return None;
    }

    let bare = raw.trim_start_matches('(').trim_end_matches(|c| c == ')' || c == '.');
    if bare.chars().count() == 1 {
        return options
            .iter()
            .find(|o| labels_match(&o.label, bare))
            .map(|o| o.label.clone());
    }

    if let Some((letter, _)) = split_label_prefix(raw) {
        let letter = letter.to_string();
        if let Some(o) = options.iter().find(|o| labels_match(&o.label, &letter)) {
            return Some(o.label.clone());
        }
    }

    let target = normalize(raw);
    if let Some(o) = options.iter().find(|o| normalize(&o.text) == target) {
        return Some(o.label.clone());
    }

    options
        .iter()
        .map(|o| (o, similarity(&o.text, raw)))
        .filter(|(_, score)| *score >= OPTION_MATCH_THRESHOLD)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(o, _)| o.label.clone())
}

/// Grade an open response against the expected answer
pub fn check_free_response(user_input: &str, expected: &str, threshold: f64) -> MatchResult {
    let input_normalized = user_input.trim().to_lowercase();
    let expected_normalized = expected.trim().to_lowercase();

    if input_normalized == expected_normalized {
        return MatchResult {
            is_correct: true,
            similarity_score: 1.0,
            feedback: "Correct!".to_string(),
        };
    }

    let score = similarity(&input_normalized, &expected_normalized);

    let (is_correct, feedback) = if score >= threshold {
        (true, format!("Close enough! ({}% match)", (score * 100.0) as i32))
    } else if score >= 0.5 {
        let distance = levenshtein(&input_normalized, &expected_normalized);
        (false, format!("Almost! {} characters off. Expected: '{}'", distance, expected))
    } else {
        (false, format!("Wrong. Expected: '{}'", expected))
    };

    MatchResult {
        is_correct,
        similarity_score: score,
        feedback,
    }
}

// ============= Python Binding =============

#[cfg(feature = "python")]
#[pymethods]
impl MatchResult {
    fn __repr__(&self) -> String {
        format!(
            "MatchResult(is_correct={}, score={:.2}, feedback='{}')",
            self.is_correct, self.similarity_score, self.feedback
        )
    }
}

#[cfg(feature = "python")]
#[pyfunction]
#[pyo3(name = "check_free_response")]
pub fn py_check_free_response(user_input: &str, expected: &str, threshold: Option<f64>) -> MatchResult {
    check_free_response(user_input, expected, threshold.unwrap_or(0.8))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> Vec<QuestionOption> {
        vec![
            QuestionOption::new("A", "Mitochondria"),
            QuestionOption::new("B", "Nucleus"),
            QuestionOption::new("C", "Ribosome"),
            QuestionOption::new("D", "Golgi apparatus"),
        ]
    }

    #[test]
    fn labels_compare_case_insensitively() {
        assert!(labels_match("b", "B"));
        assert!(!labels_match("B", "C"));
    }

    #[test]
    fn split_prefix_variants() {
        assert_eq!(split_label_prefix("A. Paris"), Some(('A', "Paris")));
        assert_eq!(split_label_prefix("(c) Rome"), Some(('C', "Rome")));
        assert_eq!(split_label_prefix("d) Oslo"), Some(('D', "Oslo")));
        assert_eq!(split_label_prefix("Paris"), None);
        assert_eq!(split_label_prefix("U.S. history"), None);
    }

    #[test]
    fn resolves_letters_prefixes_and_text() {
        let opts = options();
        assert_eq!(resolve_correct_label(&opts, "b").as_deref(), Some("B"));
        assert_eq!(resolve_correct_label(&opts, "(c)").as_deref(), Some("C"));
        assert_eq!(resolve_correct_label(&opts, "D) Golgi apparatus").as_deref(), Some("D"));
        assert_eq!(resolve_correct_label(&opts, "nucleus").as_deref(), Some("B"));
        assert_eq!(resolve_correct_label(&opts, "Mitochondrion").as_deref(), Some("A"));
    }

    #[test]
    fn unrelated_answer_does_not_resolve() {
        assert_eq!(resolve_correct_label(&options(), "Chloroplast wall"), None);
        assert_eq!(resolve_correct_label(&options(), "E"), None);
        assert_eq!(resolve_correct_label(&[], "A"), None);
    }

    #[test]
    fn free_response_grading() {
        assert!(check_free_response(" Photosynthesis ", "photosynthesis", 0.8).is_correct);
        let close = check_free_response("photosynthesys", "photosynthesis", 0.8);
        assert!(close.is_correct);
        assert!(close.similarity_score < 1.0);
        let wrong = check_free_response("gravity", "photosynthesis", 0.8);
        assert!(!wrong.is_correct);
    }
}
