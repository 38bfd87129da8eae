//! Answer extraction from free-form model output.
//!
//! The subject is asked to answer as `You: The best answer is: "(X) ..."`, so
//! the canonical label is the first parenthesized uppercase letter. Labels are
//! matched case-sensitively: `(b)` is an extraction miss, never `B`, since
//! lowercase letters in parentheses also show up as prose enumerations.
//!
//! | Function | Pattern | Use |
//! |----------|---------|-----|
//! | [`extract_answer`] | `(X)` | Primary extraction, with majority vote for self-consistency |
//! | [`extract_loose`] | `(X)`, `X.`, `"X)` followed by whitespace | Recovery pass over stored results |
//! | [`backfill_answers`] | loose | Fill empty predictions in place |

use crate::result::ResultEntry;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

static STRICT_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([A-Z])\)").expect("static regex"));

static LOOSE_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[("]?([A-Z])[).]\s"#).expect("static regex"));

/// Extract the answer label from a response.
///
/// With `votes <= 1` the first `(X)` wins. With more votes the response holds
/// one completion per line; each line votes with its first label and the most
/// frequent label wins, ties going to the label seen first. Returns an empty
/// string when nothing matches.
///
/// # Examples
///
/// ```
/// use conformity_domain::extraction::extract_answer;
///
/// assert_eq!(extract_answer("You: The best answer is: \"(C) foo\"", 1), "C");
/// assert_eq!(extract_answer("(A) x\n(A) x\n(B) y\n(A) x\n(C) z", 5), "A");
/// assert_eq!(extract_answer("no idea", 1), "");
/// ```
pub fn extract_answer(raw: &str, votes: usize) -> String {
    if votes <= 1 {
        return first_label(&STRICT_LABEL, raw).unwrap_or_default();
    }

    let labels: Vec<String> = raw
        .trim()
        .lines()
        .filter_map(|line| first_label(&STRICT_LABEL, line))
        .collect();
    majority(&labels).unwrap_or_default()
}

/// Looser single-label extraction tolerating `A.` and a missing opening parenthesis
pub fn extract_loose(raw: &str) -> Option<String> {
    first_label(&LOOSE_LABEL, raw)
}

/// Fill empty predictions from their raw responses with [`extract_loose`].
///
/// Skips entries without a response and task-error encodings. The first
/// loose match whose label is among the entry's choices wins, so stray
/// capitals such as the `K.` in `OK.` are passed over. Returns how many
/// entries were filled; a second pass over the same entries fills nothing.
pub fn backfill_answers(entries: &mut [ResultEntry]) -> usize {
    let mut filled = 0;
    for entry in entries.iter_mut().filter(|e| !e.has_answer() && !e.is_task_error()) {
        let Some(raw) = entry.raw_response.as_deref() else {
            continue;
        };
        let label = LOOSE_LABEL
            .captures_iter(raw)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str())
            .find(|label| entry.choices.iter().any(|c| c.label == *label))
            .map(str::to_string);
        if let Some(label) = label {
            entry.model_answer = label;
            filled += 1;
        }
    }
    filled
}

/// Remove every `open ... close` segment, shortest match first.
///
/// An unterminated `open` is left in place.
///
/// ```
/// use conformity_domain::extraction::strip_reasoning;
///
/// let text = "<think>weighing options\nB?</think>\nYou: The best answer is: \"(A) x\"";
/// assert_eq!(
///     strip_reasoning(text, "<think>", "</think>"),
///     "\nYou: The best answer is: \"(A) x\""
/// );
/// ```
pub fn strip_reasoning(text: &str, open: &str, close: &str) -> String {
    if open.is_empty() || close.is_empty() {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find(open) {
        let after_open = &rest[start + open.len()..];
        let Some(end) = after_open.find(close) else {
            break;
        };
        out.push_str(&rest[..start]);
        rest = &after_open[end + close.len()..];
    }
    out.push_str(rest);
    out
}

fn first_label(pattern: &Regex, text: &str) -> Option<String> {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Most frequent label; ties resolved by first appearance
fn majority(labels: &[String]) -> Option<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for label in labels {
        *counts.entry(label.as_str()).or_default() += 1;
    }

    let mut best: Option<(&str, usize)> = None;
    for label in labels {
        let count = counts[label.as_str()];
        if best.is_none_or(|(_, c)| count > c) {
            best = Some((label.as_str(), count));
        }
    }
    best.map(|(label, _)| label.to_string())
}
