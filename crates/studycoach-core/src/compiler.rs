//! Quiz compiler.
//!
//! Turns the free text a model returns for a quiz request into validated
//! [`QuizItem`]s. Models wrap the array in code fences, add chatter around
//! it, and paraphrase the answer, so the compiler salvages what it can:
//! bad elements are dropped one by one and near-miss answers are rewritten
//! to the option they refer to. Only a batch with no usable element fails.

use serde_json::{Map, Value};

use crate::error::QuizError;
use crate::model::QuizItem;

/// Number of options every question must carry.
pub const OPTIONS_PER_QUESTION: usize = 4;

/// An element that did not make it into the quiz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedElement {
    /// Position in the generator's array.
    pub index: usize,
    pub reason: String,
}

/// An element whose answer was rewritten to an option's exact text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairedAnswer {
    pub index: usize,
    pub original: String,
    pub repaired: String,
}

/// Full outcome of a compilation, including what was dropped or fixed.
#[derive(Debug, Clone)]
pub struct Compilation {
    pub items: Vec<QuizItem>,
    pub dropped: Vec<DroppedElement>,
    pub repaired: Vec<RepairedAnswer>,
}

/// Compile a raw generator response into quiz items.
///
/// `expected_count` is advisory: returning fewer items is not an error.
pub fn compile(raw: &str, expected_count: Option<usize>) -> Result<Vec<QuizItem>, QuizError> {
    compile_detailed(raw, expected_count).map(|c| c.items)
}

/// Like [`compile`], but also reports dropped elements and repaired answers.
pub fn compile_detailed(
    raw: &str,
    expected_count: Option<usize>,
) -> Result<Compilation, QuizError> {
    let cleaned = strip_code_fences(raw);
    let candidate = extract_array(&cleaned)?;

    let value: Value = serde_json::from_str(candidate)
        .map_err(|e| QuizError::MalformedPayload(format!("invalid JSON: {e}")))?;

    let elements = match value {
        Value::Array(elements) => elements,
        other => {
            return Err(QuizError::MalformedPayload(format!(
                "expected a JSON array, found {}",
                json_kind(&other)
            )))
        }
    };
    if elements.is_empty() {
        return Err(QuizError::EmptyResult);
    }

    let mut items = Vec::with_capacity(elements.len());
    let mut dropped = Vec::new();
    let mut repaired = Vec::new();

    for (index, element) in elements.iter().enumerate() {
        match validate_element(element) {
            Ok((item, original)) => {
                if let Some(original) = original {
                    tracing::debug!(
                        "question {index}: answer {original:?} repaired to {:?}",
                        item.correct_option()
                    );
                    repaired.push(RepairedAnswer {
                        index,
                        original,
                        repaired: item.correct_option().to_string(),
                    });
                }
                items.push(item);
            }
            Err(reason) => {
                tracing::debug!("question {index}: dropped ({reason})");
                dropped.push(DroppedElement { index, reason });
            }
        }
    }

    if items.is_empty() {
        return Err(QuizError::EmptyResult);
    }

    if let Some(expected) = expected_count {
        if items.len() < expected {
            tracing::warn!(
                "quiz compiled to {} of {} requested questions",
                items.len(),
                expected
            );
        }
    }

    Ok(Compilation {
        items,
        dropped,
        repaired,
    })
}

/// Remove triple-backtick fence markers, with or without a language tag,
/// wherever they occur.
pub fn strip_code_fences(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(pos) = rest.find("```") {
        out.push_str(&rest[..pos]);
        rest = rest[pos..].trim_start_matches('`');
        // A language tag is only a tag when the line ends right after it.
        let tag_len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+')))
            .unwrap_or(rest.len());
        if rest[tag_len..]
            .chars()
            .next()
            .map_or(true, |c| matches!(c, '\n' | '\r'))
        {
            rest = &rest[tag_len..];
        }
        rest = rest.trim_start();
    }
    out.push_str(rest);
    out
}

/// Slice from the first `[` to the last `]`, inclusive.
fn extract_array(text: &str) -> Result<&str, QuizError> {
    let start = text.find('[');
    let end = text.rfind(']');
    match (start, end) {
        (Some(start), Some(end)) if start < end => Ok(&text[start..=end]),
        _ => Err(QuizError::MalformedPayload(
            "no JSON array found in response".into(),
        )),
    }
}

/// Check one element; on success also return the original answer text if
/// it had to be repaired.
fn validate_element(element: &Value) -> Result<(QuizItem, Option<String>), String> {
    let object = element
        .as_object()
        .ok_or_else(|| format!("expected an object, found {}", json_kind(element)))?;

    let question = required_str(object, "question")?;
    if question.is_empty() {
        return Err("question is empty".into());
    }

    let options = object
        .get("options")
        .ok_or("missing key 'options'")?
        .as_array()
        .ok_or("'options' is not an array")?;
    if options.len() != OPTIONS_PER_QUESTION {
        return Err(format!(
            "expected {OPTIONS_PER_QUESTION} options, found {}",
            options.len()
        ));
    }

    let mut texts: Vec<String> = Vec::with_capacity(OPTIONS_PER_QUESTION);
    for option in options {
        let text = option
            .as_str()
            .map(str::trim)
            .ok_or("option is not a string")?;
        if text.is_empty() {
            return Err("option is empty".into());
        }
        if texts.iter().any(|t| t == text) {
            return Err(format!("duplicate option {text:?}"));
        }
        texts.push(text.to_string());
    }

    let answer = required_str(object, "answer")?;
    if answer.is_empty() {
        return Err("answer is empty".into());
    }

    let matched = match_option(answer, &texts)
        .ok_or_else(|| format!("answer {answer:?} matches no option"))?;
    let correct = texts[matched].clone();
    let original = (correct != answer).then(|| answer.to_string());

    Ok((QuizItem::new(question.to_string(), texts, correct), original))
}

fn required_str<'a>(object: &'a Map<String, Value>, key: &str) -> Result<&'a str, String> {
    object
        .get(key)
        .ok_or_else(|| format!("missing key '{key}'"))?
        .as_str()
        .map(str::trim)
        .ok_or_else(|| format!("'{key}' is not a string"))
}

/// Find the option an answer refers to.
///
/// A case-insensitive exact match wins; otherwise the first option (in
/// declared order) that contains the answer or is contained by it.
fn match_option(answer: &str, options: &[String]) -> Option<usize> {
    let answer = answer.to_lowercase();
    let lowered: Vec<String> = options.iter().map(|o| o.to_lowercase()).collect();

    lowered.iter().position(|o| *o == answer).or_else(|| {
        lowered
            .iter()
            .position(|o| o.contains(answer.as_str()) || answer.contains(o.as_str()))
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BARE: &str = r#"[
  {"question": "What is the capital of France?", "options": ["London", "Paris", "Berlin", "Madrid"], "answer": "Paris"},
  {"question": "2 + 2 = ?", "options": ["3", "4", "5", "22"], "answer": "4"}
]"#;

    #[test]
    fn compile_single_question() {
        let items = compile(
            r#"[{"question":"Q1","options":["A","B","C","D"],"answer":"B"}]"#,
            None,
        )
        .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].question(), "Q1");
        assert_eq!(items[0].options(), ["A", "B", "C", "D"]);
        assert_eq!(items[0].correct_option(), "B");
    }

    #[test]
    fn compile_empty_text_is_malformed() {
        assert!(matches!(
            compile("", None),
            Err(QuizError::MalformedPayload(_))
        ));
    }

    #[test]
    fn fenced_and_prose_wrapped_matches_bare() {
        let bare = compile(BARE, Some(2)).unwrap();

        let wrapped = format!("Sure! Here is your quiz:\n\n```json\n{BARE}\n```\n\nGood luck!");
        assert_eq!(compile(&wrapped, Some(2)).unwrap(), bare);

        let untagged = format!("```\n{BARE}\n```");
        assert_eq!(compile(&untagged, Some(2)).unwrap(), bare);
    }

    #[test]
    fn compile_is_idempotent() {
        assert_eq!(compile(BARE, None).unwrap(), compile(BARE, None).unwrap());
    }

    #[test]
    fn answer_substring_is_repaired() {
        let raw = r#"[{"question":"Capital of France?","options":["London","Paris","Berlin","Madrid"],"answer":"paris, france"}]"#;
        let compiled = compile_detailed(raw, None).unwrap();
        assert_eq!(compiled.items[0].correct_option(), "Paris");
        assert_eq!(compiled.repaired.len(), 1);
        assert_eq!(compiled.repaired[0].original, "paris, france");

        let raw = r#"[{"question":"Speed of light?","options":["About 300,000 km/s","Sound","Slow","Zero"],"answer":"300,000 km/s"}]"#;
        let items = compile(raw, None).unwrap();
        assert_eq!(items[0].correct_option(), "About 300,000 km/s");
    }

    #[test]
    fn answer_case_mismatch_uses_option_text() {
        let raw = r#"[{"question":"Q","options":["Alpha","Beta","Gamma","Delta"],"answer":"BETA"}]"#;
        let items = compile(raw, None).unwrap();
        assert_eq!(items[0].correct_option(), "Beta");
    }

    #[test]
    fn multi_match_first_option_wins() {
        let raw = r#"[{"question":"Q","options":["Red","Green","Blue","Yellow"],"answer":"Green or Red"}]"#;
        let items = compile(raw, None).unwrap();
        assert_eq!(items[0].correct_option(), "Red");
    }

    #[test]
    fn unmatched_answer_drops_only_that_element() {
        let raw = r#"[
  {"question":"Q1","options":["A1","B1","C1","D1"],"answer":"Z9"},
  {"question":"Q2","options":["A2","B2","C2","D2"],"answer":"C2"}
]"#;
        let compiled = compile_detailed(raw, Some(2)).unwrap();
        assert_eq!(compiled.items.len(), 1);
        assert_eq!(compiled.items[0].question(), "Q2");
        assert_eq!(compiled.dropped[0].index, 0);
    }

    #[test]
    fn wrong_option_count_is_dropped() {
        let three = r#"[{"question":"Q","options":["A","B","C"],"answer":"A"}]"#;
        assert_eq!(compile(three, None), Err(QuizError::EmptyResult));

        let five = r#"[{"question":"Q","options":["A","B","C","D","E"],"answer":"A"}]"#;
        assert_eq!(compile(five, None), Err(QuizError::EmptyResult));
    }

    #[test]
    fn structural_failures_are_dropped() {
        let raw = r#"[
  "just a string",
  {"options":["A","B","C","D"],"answer":"A"},
  {"question":"","options":["A","B","C","D"],"answer":"A"},
  {"question":"dup","options":["A","A","C","D"],"answer":"A"},
  {"question":"blank","options":["A"," ","C","D"],"answer":"A"},
  {"question":"num","options":["A","B","C","D"],"answer":1},
  {"question":"empty answer","options":["A","B","C","D"],"answer":""},
  {"question":"ok","options":["A","B","C","D"],"answer":"D"}
]"#;
        let compiled = compile_detailed(raw, None).unwrap();
        assert_eq!(compiled.items.len(), 1);
        assert_eq!(compiled.items[0].question(), "ok");
        let indices: Vec<usize> = compiled.dropped.iter().map(|d| d.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn empty_array_is_empty_result() {
        assert_eq!(compile("[]", None), Err(QuizError::EmptyResult));
    }

    #[test]
    fn invalid_json_is_malformed() {
        let err = compile(r#"[{"question": "Q", "options": [}]"#, None).unwrap_err();
        assert!(matches!(err, QuizError::MalformedPayload(_)));
    }

    #[test]
    fn missing_brackets_is_malformed() {
        assert!(matches!(
            compile("I could not generate a quiz, sorry.", None),
            Err(QuizError::MalformedPayload(_))
        ));
        assert!(matches!(
            compile("] backwards [", None),
            Err(QuizError::MalformedPayload(_))
        ));
    }

    #[test]
    fn fewer_than_expected_is_not_an_error() {
        let items = compile(BARE, Some(10)).unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn order_is_preserved() {
        let items = compile(BARE, None).unwrap();
        assert_eq!(items[0].question(), "What is the capital of France?");
        assert_eq!(items[1].question(), "2 + 2 = ?");
    }

    #[test]
    fn strip_fences_anywhere() {
        assert_eq!(strip_code_fences("a```json\nb```\nc"), "abc");
        assert_eq!(strip_code_fences("```[1]```"), "[1]");
        assert_eq!(strip_code_fences("no fences"), "no fences");
    }

    #[test]
    fn strip_fences_keeps_prose_after_fence() {
        assert_eq!(
            strip_code_fences("```Here is the quiz```"),
            "Here is the quiz"
        );
        assert_eq!(strip_code_fences("```json [1]```"), "json [1]");
        assert_eq!(strip_code_fences("```rust\r\n[1]\r\n```"), "[1]\r\n");
    }
}
