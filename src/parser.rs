//! Heuristic parser for the generator's markdown-flavoured quiz text.
//!
//! Expected shape (punctuation, bold markers and label case all vary):
//!
//! ```text
//! **Question 1:**
//! **Stem:** Which organelle produces ATP?
//! **(a)** Nucleus
//! **(b)** Mitochondria
//! **Correct Answer:** (b)
//! **Explanation:** Mitochondria host oxidative phosphorylation.
//! ```
//!
//! Parsing runs in named stages: [`split_blocks`] → [`extract_stem`] →
//! [`extract_options`] → [`extract_correct_answer`] → [`extract_explanation`].
//! Blocks missing a stem or a correct answer are dropped; the parser never fails.

#[cfg(feature = "python")]
use pyo3::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::matching::{labels_match, resolve_correct_label};
use crate::questions::{renumber, ParsedQuestion, QuestionOption};

static HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?mi)^[ \t]*(?:#{1,6}[ \t]*)?(?:\*\*[ \t]*Question[ \t]+\d+[ \t]*[:.)]?(?:[ \t]*\*\*)?[ \t]*:?|Question[ \t]+\d+[ \t]*(?:[:.)]|$))",
    )
    .expect("header pattern")
});

static STEM_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\*{0,2}[ \t]*Stem[ \t]*\*{0,2}[ \t]*:[ \t]*\*{0,2}").expect("stem pattern")
});

static OPTION_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^[ \t]*(?:[-+][ \t]+|\*[ \t]+)?\*{0,2}[ \t]*(?:\(([A-Za-z])\)|([A-Za-z])[.)])(?:\*{1,2}[ \t]*|[ \t]+)(\S[^\n]*)$",
    )
    .expect("option pattern")
});

static CORRECT_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?mi)^[ \t]*(?:[-+*][ \t]+)?\*{0,2}[ \t]*(?:Correct[ \t]+Answer|Correct|Answer)[ \t]*\*{0,2}[ \t]*[:\-][ \t]*\*{0,2}[ \t]*",
    )
    .expect("correct answer pattern")
});

static EXPLANATION_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?mi)^[ \t]*(?:[-+*][ \t]+)?\*{0,2}[ \t]*Explanation[ \t]*\*{0,2}[ \t]*:[ \t]*\*{0,2}")
        .expect("explanation pattern")
});

static BOOLEAN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(true|false)\b").expect("boolean pattern"));

static LETTER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\(([A-Za-z])\)|([A-Za-z])(?:[.):]|\s|$))").expect("letter pattern")
});

/// A label and nothing else: `C`, `(c)`, `C.`, `C)`
static BARE_LETTER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\(?[A-Za-z][.):]?$").expect("bare letter pattern"));

/// Grammar switches. Defaults follow the lenient behaviour.
#[cfg_attr(feature = "python", pyclass(get_all, set_all))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Blocks with fewer options are dropped; 4 gives the strict four-choice grammar
    pub min_options: usize,
    /// Accept `True`/`False` correct answers
    pub allow_boolean_answers: bool,
    /// Drop blocks that repeat an option label
    pub reject_duplicate_labels: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            min_options: 0,
            allow_boolean_answers: true,
            reject_duplicate_labels: false,
        }
    }
}

/// Raw token found after a correct-answer label
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerToken {
    /// Option letter, uppercased
    Letter(String),
    /// `True` or `False`. Stored title-cased; scoring ignores case, so `TRUE` matches
    Boolean(String),
    /// Anything else; resolved against option texts, or kept verbatim when there are none
    Text(String),
}

/// Strip surrounding whitespace and emphasis marker runs. Interior text is untouched.
fn clean_field(s: &str) -> &str {
    s.trim_matches(|c: char| c.is_whitespace() || c == '*' || c == '_')
}

fn first_start(re: &Regex, text: &str) -> Option<usize> {
    re.find(text).map(|m| m.start())
}

/// Offset where the answer section (correct answer or explanation) begins
fn answer_section_start(block: &str) -> usize {
    [
        first_start(&CORRECT_LABEL_RE, block),
        first_start(&EXPLANATION_LABEL_RE, block),
    ]
    .into_iter()
    .flatten()
    .min()
    .unwrap_or(block.len())
}

/// Split the document into question blocks. Text before the first header is discarded.
pub fn split_blocks(raw: &str) -> Vec<&str> {
    let headers: Vec<_> = HEADER_RE.find_iter(raw).collect();
    headers
        .iter()
        .enumerate()
        .map(|(i, header)| {
            let end = headers.get(i + 1).map(|next| next.start()).unwrap_or(raw.len());
            &raw[header.end()..end]
        })
        .collect()
}

/// Question prompt: after the `Stem:` label (or from the block start) up to the
/// first option line or answer label.
pub fn extract_stem(block: &str) -> String {
    let section_end = answer_section_start(block);
    let stem_end = OPTION_LINE_RE
        .find(&block[..section_end])
        .map(|m| m.start())
        .unwrap_or(section_end);

    let stem_start = STEM_LABEL_RE
        .find(&block[..stem_end])
        .map(|m| m.end())
        .unwrap_or(0);

    clean_field(&block[stem_start..stem_end]).to_string()
}

/// Option lines in order of appearance. Labels are uppercased; duplicates are kept.
pub fn extract_options(block: &str) -> Vec<QuestionOption> {
    let section = &block[..answer_section_start(block)];
    OPTION_LINE_RE
        .captures_iter(section)
        .filter_map(|caps| {
            let label = caps.get(1).or_else(|| caps.get(2))?.as_str().to_uppercase();
            let text = clean_field(caps.get(3)?.as_str());
            if text.is_empty() {
                return None;
            }
            Some(QuestionOption::new(label, text))
        })
        .collect()
}

/// Text following the correct-answer label
fn answer_value(block: &str) -> Option<&str> {
    let label = CORRECT_LABEL_RE.find(block)?;
    // the token may sit on the line after a bare label
    let value = block[label.end()..]
        .lines()
        .map(clean_field)
        .find(|line| !line.is_empty())?;
    if EXPLANATION_LABEL_RE.is_match(value) {
        return None;
    }
    Some(value)
}

fn classify_answer(value: &str) -> AnswerToken {
    if let Some(caps) = BOOLEAN_RE.captures(value) {
        let word = if caps[1].eq_ignore_ascii_case("true") {
            "True"
        } else {
            "False"
        };
        return AnswerToken::Boolean(word.to_string());
    }
    if let Some(letter) = LETTER_RE.captures(value).and_then(|caps| caps.get(1).or_else(|| caps.get(2))) {
        return AnswerToken::Letter(letter.as_str().to_uppercase());
    }
    AnswerToken::Text(value.to_string())
}

/// Token following the correct-answer label, if the label is present
pub fn extract_correct_answer(block: &str) -> Option<AnswerToken> {
    answer_value(block).map(classify_answer)
}

/// Everything after the `Explanation:` label; empty when absent
pub fn extract_explanation(block: &str) -> String {
    EXPLANATION_LABEL_RE
        .find(block)
        .map(|m| clean_field(&block[m.end()..]).to_string())
        .unwrap_or_default()
}

/// Settle the correct answer for a block.
///
/// A boolean token stands on its own only when the block has no options;
/// otherwise it must name one of the options (e.g. `A. True`). Without options
/// any other answer is an open response and is kept as written, unless it is
/// a lone label.
fn resolve_answer(value: &str, options: &[QuestionOption], opts: &ParseOptions) -> Option<String> {
    match classify_answer(value) {
        AnswerToken::Letter(_) if options.is_empty() && !BARE_LETTER_RE.is_match(value) => Some(value.to_string()),
        AnswerToken::Letter(letter) => Some(letter),
        AnswerToken::Boolean(word) if !opts.allow_boolean_answers => {
            resolve_correct_label(options, &word)
        }
        AnswerToken::Boolean(word) if options.is_empty() => Some(word),
        AnswerToken::Text(text) if options.is_empty() => Some(text),
        AnswerToken::Boolean(word) | AnswerToken::Text(word) => resolve_correct_label(options, &word),
    }
}

fn has_duplicate_labels(options: &[QuestionOption]) -> bool {
    let mut seen = HashSet::new();
    options.iter().any(|o| !seen.insert(o.label.to_uppercase()))
}

fn parse_block(ordinal: usize, block: &str, opts: &ParseOptions) -> Option<ParsedQuestion> {
    let stem = extract_stem(block);
    if stem.is_empty() {
        log::debug!("question block {} dropped: no stem", ordinal);
        return None;
    }

    let options = extract_options(block);
    if options.len() < opts.min_options {
        log::debug!(
            "question block {} dropped: {} options, need {}",
            ordinal,
            options.len(),
            opts.min_options
        );
        return None;
    }
    if opts.reject_duplicate_labels && has_duplicate_labels(&options) {
        log::debug!("question block {} dropped: duplicate option labels", ordinal);
        return None;
    }

    let correct_answer = match answer_value(block).and_then(|v| resolve_answer(v, &options, opts)) {
        Some(answer) => answer,
        None => {
            log::debug!("question block {} dropped: no usable correct answer", ordinal);
            return None;
        }
    };

    Some(ParsedQuestion {
        number: 0,
        stem,
        options,
        correct_answer,
        explanation: extract_explanation(block),
    })
}

/// Parse with the lenient default grammar
pub fn parse_quiz(raw: &str) -> Vec<ParsedQuestion> {
    parse_quiz_with(raw, &ParseOptions::default())
}

/// Parse raw generator text into numbered questions
pub fn parse_quiz_with(raw: &str, opts: &ParseOptions) -> Vec<ParsedQuestion> {
    let text = raw.replace("\r\n", "\n");
    let blocks = split_blocks(&text);

    let mut questions: Vec<ParsedQuestion> = blocks
        .iter()
        .enumerate()
        .filter_map(|(i, block)| parse_block(i + 1, block, opts))
        .collect();
    renumber(&mut questions);

    if questions.len() < blocks.len() {
        log::debug!("parsed {} of {} question blocks", questions.len(), blocks.len());
    }
    questions
}

/// Whether `answer` names one of the question's options
pub fn is_option_label(question: &ParsedQuestion, answer: &str) -> bool {
    question.options.iter().any(|o| labels_match(&o.label, answer))
}

// ============= Python Bindings =============

#[cfg(feature = "python")]
#[pymethods]
impl ParseOptions {
    #[new]
    #[pyo3(signature = (min_options=0, allow_boolean_answers=true, reject_duplicate_labels=false))]
    fn py_new(min_options: usize, allow_boolean_answers: bool, reject_duplicate_labels: bool) -> Self {
        Self {
            min_options,
            allow_boolean_answers,
            reject_duplicate_labels,
        }
    }
}

#[cfg(feature = "python")]
#[pyfunction]
#[pyo3(name = "parse_quiz", signature = (raw_text, options=None))]
pub fn py_parse_quiz(raw_text: &str, options: Option<ParseOptions>) -> Vec<ParsedQuestion> {
    parse_quiz_with(raw_text, &options.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOLD_PAREN: &str = "Here is your quiz.\n\n\
**Question 1:**\n\n\
**Stem:** Which organelle produces most of a cell's ATP?\n\
**(a)** Nucleus\n\
**(b)** Mitochondria\n\
**(c)** Ribosome\n\
**(d)** Lysosome\n\
**Correct Answer:** (b)\n\
**Explanation:** Oxidative phosphorylation happens in the *inner* membrane.\n\n\
**Question 2:**\n\n\
**Stem:** What does DNA stand for?\n\
**(a)** Deoxyribonucleic acid\n\
**(b)** Dinitrogen acid\n\
**(c)** Diribose acid\n\
**(d)** None of these\n\
**Correct Answer:** (a)\n\
**Explanation:** It is deoxyribonucleic acid.**\n";

    const PLAIN_LETTERS: &str = "**Question 1:**\n\
**Stem:** Capital of France?\n\
**A.** Berlin\n\
**B.** Paris\n\
**C.** Rome\n\
**D.** Madrid\n\
Correct Answer: B\n\
Explanation: Paris is the capital.\n\
**Question 2:**\n\
**Stem:** 2 + 2 = ?\n\
**A.** 3\n\
**B.** 5\n\
**C.** 22\n\
**D.** 4\n\
Correct Answer: D\n\
Explanation: Basic arithmetic.\n";

    #[test]
    fn split_discards_preamble() {
        let blocks = split_blocks(BOLD_PAREN);
        assert_eq!(blocks.len(), 2);
        assert!(!blocks[0].contains("Here is your quiz"));
    }

    #[test]
    fn parses_parenthesized_lowercase_format() {
        let qs = parse_quiz(BOLD_PAREN);
        assert_eq!(qs.len(), 2);
        assert_eq!(qs[0].number, 1);
        assert_eq!(qs[0].stem, "Which organelle produces most of a cell's ATP?");
        assert_eq!(qs[0].option_labels(), vec!["A", "B", "C", "D"]);
        assert_eq!(qs[0].options[1].text, "Mitochondria");
        assert_eq!(qs[0].correct_answer, "B");
        assert_eq!(
            qs[0].explanation,
            "Oxidative phosphorylation happens in the *inner* membrane."
        );
        assert_eq!(qs[1].correct_answer, "A");
        assert_eq!(qs[1].explanation, "It is deoxyribonucleic acid.");
    }

    #[test]
    fn header_with_inline_stem() {
        let raw = "**Question 1: Which planet is red?**\nA. Mars\nB. Venus\nCorrect Answer: A\n";
        let qs = parse_quiz(raw);
        assert_eq!(qs.len(), 1);
        assert_eq!(qs[0].stem, "Which planet is red?");
    }

    #[test]
    fn parses_bold_letter_format() {
        let qs = parse_quiz(PLAIN_LETTERS);
        assert_eq!(qs.len(), 2);
        assert_eq!(qs[0].stem, "Capital of France?");
        assert_eq!(qs[0].correct_answer, "B");
        assert_eq!(qs[1].correct_answer, "D");
        assert_eq!(qs[1].options[3].text, "4");
    }

    #[test]
    fn unstructured_text_yields_nothing() {
        assert!(parse_quiz("The model could not produce a quiz today.").is_empty());
        assert!(parse_quiz("").is_empty());
    }

    #[test]
    fn block_without_answer_is_dropped_and_rest_renumbered() {
        let raw = "**Question 1:**\n**Stem:** First?\nA. x\nB. y\nCorrect Answer: A\n\
**Question 2:**\n**Stem:** Second, no answer?\nA. x\nB. y\n\
**Question 3:**\n**Stem:** Third?\nA. x\nB. y\nCorrect Answer: (b)\n";
        let qs = parse_quiz(raw);
        assert_eq!(qs.len(), 2);
        assert_eq!(qs[0].stem, "First?");
        assert_eq!(qs[1].stem, "Third?");
        assert_eq!(qs[1].number, 2);
        assert_eq!(qs[1].correct_answer, "B");
    }

    #[test]
    fn true_false_without_options() {
        let raw = "**Question 1:**\n**Stem:** The sun is a star.\n**Correct Answer:** True\n";
        let qs = parse_quiz(raw);
        assert_eq!(qs.len(), 1);
        assert!(qs[0].options.is_empty());
        assert!(qs[0].correct_answer.eq_ignore_ascii_case("TRUE"));
        assert_eq!(qs[0].correct_answer, "True");
        assert_eq!(qs[0].explanation, "");
    }

    #[test]
    fn boolean_answer_with_options_maps_to_label() {
        let raw = "**Question 1:**\nWater boils at 100C at sea level.\nA. True\nB. False\nCorrect Answer: False\n";
        let qs = parse_quiz(raw);
        assert_eq!(qs.len(), 1);
        assert_eq!(qs[0].correct_answer, "B");

        let raw = "**Question 1:**\nPick one.\nA. Red\nB. Blue\nCorrect Answer: True\n";
        assert!(parse_quiz(raw).is_empty());
    }

    #[test]
    fn booleans_can_be_disabled() {
        let raw = "**Question 1:**\n**Stem:** The sun is a star.\n**Correct Answer:** True\n";
        let opts = ParseOptions {
            allow_boolean_answers: false,
            ..ParseOptions::default()
        };
        assert!(parse_quiz_with(raw, &opts).is_empty());
    }

    #[test]
    fn stem_without_label_uses_block_text() {
        let raw = "## Question 1\nWhat color is the sky?\n- A) Green\n- B) Blue\nCorrect: B\n";
        let qs = parse_quiz(raw);
        assert_eq!(qs.len(), 1);
        assert_eq!(qs[0].stem, "What color is the sky?");
        assert_eq!(qs[0].options.len(), 2);
        assert_eq!(qs[0].options[1].text, "Blue");
    }

    #[test]
    fn duplicate_labels_are_kept_in_order_by_default() {
        let raw = "**Question 1:**\n**Stem:** Pick?\nA. one\nA. two\nB. three\nCorrect Answer: A\n";
        let qs = parse_quiz(raw);
        assert_eq!(qs[0].option_labels(), vec!["A", "A", "B"]);
        assert_eq!(qs[0].options[1].text, "two");

        let strict = ParseOptions {
            reject_duplicate_labels: true,
            ..ParseOptions::default()
        };
        assert!(parse_quiz_with(raw, &strict).is_empty());
    }

    #[test]
    fn min_options_reproduces_four_choice_grammar() {
        let raw = "**Question 1:**\n**Stem:** Two options only?\nA. x\nB. y\nCorrect Answer: A\n";
        let four = ParseOptions {
            min_options: 4,
            ..ParseOptions::default()
        };
        assert!(parse_quiz_with(raw, &four).is_empty());
        assert_eq!(parse_quiz(raw).len(), 1);
    }

    #[test]
    fn correct_answer_as_option_text() {
        let raw = "**Question 1:**\n**Stem:** Largest planet?\nA. Mars\nB. Jupiter\nC. Venus\nCorrect Answer: Jupiter\n";
        assert_eq!(parse_quiz(raw)[0].correct_answer, "B");
    }

    #[test]
    fn explanation_lines_are_not_options() {
        let raw = "**Question 1:**\n**Stem:** Q?\nA. yes\nB. no\nCorrect Answer: A\nExplanation: Because:\nB. is wrong here\n";
        let qs = parse_quiz(raw);
        assert_eq!(qs[0].options.len(), 2);
        assert_eq!(qs[0].explanation, "Because:\nB. is wrong here");
    }

    #[test]
    fn crlf_input_is_handled() {
        let raw = PLAIN_LETTERS.replace('\n', "\r\n");
        assert_eq!(parse_quiz(&raw), parse_quiz(PLAIN_LETTERS));
    }

    #[test]
    fn parsing_is_idempotent() {
        assert_eq!(parse_quiz(BOLD_PAREN), parse_quiz(BOLD_PAREN));
    }

    #[test]
    fn answer_token_shapes() {
        assert_eq!(
            extract_correct_answer("Correct Answer: (c)"),
            Some(AnswerToken::Letter("C".into()))
        );
        assert_eq!(
            extract_correct_answer("**Correct Answer:** false"),
            Some(AnswerToken::Boolean("False".into()))
        );
        assert_eq!(
            extract_correct_answer("Correct Answer: Because"),
            Some(AnswerToken::Text("Because".into()))
        );
        assert_eq!(
            extract_correct_answer("**Correct Answer:**\n\n(d) Oslo"),
            Some(AnswerToken::Letter("D".into()))
        );
        assert_eq!(
            extract_correct_answer("**Answer:** B"),
            Some(AnswerToken::Letter("B".into()))
        );
        assert_eq!(extract_correct_answer("Correct Answer:\nExplanation: none given"), None);
        assert_eq!(extract_correct_answer("no label here"), None);
    }

    #[test]
    fn open_response_answer_is_kept_verbatim() {
        let raw = "**Question 1:**\n**Stem:** Name the process plants use to make food.\n**Correct Answer:** Photosynthesis\n**Explanation:** Light becomes sugar.\n";
        let qs = parse_quiz(raw);
        assert_eq!(qs.len(), 1);
        assert!(qs[0].options.is_empty());
        assert_eq!(qs[0].correct_answer, "Photosynthesis");
        assert_eq!(qs[0].explanation, "Light becomes sugar.");
    }

    #[test]
    fn formula_answer_is_not_a_letter() {
        assert_eq!(
            extract_correct_answer("Correct Answer: H2O"),
            Some(AnswerToken::Text("H2O".into()))
        );
        let raw = "**Question 1:**\n**Stem:** Chemical formula of water?\n**Correct Answer:** H2O\n";
        let qs = parse_quiz(raw);
        assert_eq!(qs.len(), 1);
        assert_eq!(qs[0].correct_answer, "H2O");

        let raw = "**Question 1:**\n**Stem:** Capital of Norway?\n**Correct Answer:** (d) Oslo\n";
        assert_eq!(parse_quiz(raw)[0].correct_answer, "(d) Oslo");
        let raw = "**Question 1:**\n**Stem:** Which vitamin comes from sunlight?\n**Correct Answer:** D\n";
        assert_eq!(parse_quiz(raw)[0].correct_answer, "D");
    }

    #[test]
    fn answer_phrase_inside_stem_is_not_a_label() {
        let raw = "**Question 1:**\n**Stem:** Choose the correct answer: which planet is largest?\nA. Mars\nB. Jupiter\nCorrect Answer: B\nExplanation: The correct answer: Jupiter.\n";
        let qs = parse_quiz(raw);
        assert_eq!(qs.len(), 1);
        assert_eq!(qs[0].stem, "Choose the correct answer: which planet is largest?");
        assert_eq!(qs[0].correct_answer, "B");
        assert_eq!(qs[0].explanation, "The correct answer: Jupiter.");
    }

    #[test]
    fn bold_header_mentioned_in_prose_does_not_split() {
        let raw = "**Question 1:**\n**Stem:** Q?\nA. x\nB. y\nCorrect Answer: A\nExplanation: Unlike **Question 2**, this one is easy.\n\
**Question 2:**\n**Stem:** R?\nA. x\nB. y\nCorrect Answer: B\n";
        assert_eq!(split_blocks(raw).len(), 2);
        let qs = parse_quiz(raw);
        assert_eq!(qs.len(), 2);
        assert_eq!(qs[0].explanation, "Unlike **Question 2**, this one is easy.");
    }

    #[test]
    fn emphasis_stripped_only_at_edges() {
        assert_eq!(clean_field("  **a *b* c**  "), "a *b* c");
        assert_eq!(extract_explanation("Explanation: snake_case wins__"), "snake_case wins");
    }
}
