use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

#[cfg(test)]
mod tests;

static ANSI_ESCAPES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1b\[[0-9;]*[A-Za-z]").expect("hard-coded pattern must compile")
});

static LOOSE_PAYLOAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\[.*?\]|\{.*?\}").expect("hard-coded pattern must compile")
});

const PREVIEW_CHARS: usize = 1000;

type SpanStrategy = for<'a> fn(&'a str) -> Option<&'a str>;

// Ordered from most to least precise; the first span that decodes wins.
const SPAN_STRATEGIES: &[SpanStrategy] = &[balanced_span, outer_span, loose_span];

pub fn recover(raw: &str) -> Option<Vec<Value>> {
    if raw.trim().is_empty() {
        return None;
    }
    let cleaned = clean_control_text(raw);
    for strategy in SPAN_STRATEGIES {
        let Some(span) = strategy(&cleaned) else {
            continue;
        };
        if let Ok(value) = serde_json::from_str::<Value>(span) {
            return Some(into_sequence(value));
        }
    }
    None
}

pub fn clean_control_text(raw: &str) -> String {
    let stripped = ANSI_ESCAPES.replace_all(raw, "");
    stripped
        .chars()
        .filter_map(|ch| match ch {
            '\r' | '\n' | '\t' => Some(' '),
            c if (c as u32) < 0x20 || (0x7f..=0x9f).contains(&(c as u32)) => None,
            c => Some(c),
        })
        .collect()
}

pub fn bounded_preview(raw: &str) -> &str {
    match raw.char_indices().nth(PREVIEW_CHARS) {
        Some((idx, _)) => &raw[..idx],
        None => raw,
    }
}

fn into_sequence(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        other => vec![other],
    }
}

// Depth walk from the first opening delimiter, skipping delimiters inside
// quoted strings. A truncated payload yields the unbalanced remainder, which
// fails decoding and falls through to the next strategy.
fn balanced_span(text: &str) -> Option<&str> {
    let start = text.find(['[', '{'])?;
    let mut stack: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;
    for (idx, ch) in text[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            _ if in_string => {}
            '[' | '{' => stack.push(ch),
            ']' | '}' => {
                let Some(top) = stack.last().copied() else {
                    // unmatched closer before the payload, skip it
                    continue;
                };
                let closes_top = (top == '[' && ch == ']') || (top == '{' && ch == '}');
                if !closes_top {
                    return None;
                }
                stack.pop();
                if stack.is_empty() {
                    return Some(&text[start..start + idx + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    Some(&text[start..])
}

// First opening to last closing delimiter. Often recovers payloads whose tail
// was cut off after the final closer but before trailing noise.
fn outer_span(text: &str) -> Option<&str> {
    let first = text.find(['[', '{'])?;
    let last = text.rfind([']', '}'])?;
    if last <= first {
        return None;
    }
    Some(&text[first..last + 1])
}

fn loose_span(text: &str) -> Option<&str> {
    LOOSE_PAYLOAD.find(text).map(|found| found.as_str())
}
