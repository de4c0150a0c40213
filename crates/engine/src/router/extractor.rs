use serde_json::Value;
use switchboard_shared::{schema_for, ToolId};

use crate::tools::ToolArgs;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExtractionError {
    #[error("Could not find an arithmetic expression in query")]
    MissingExpression,

    #[error("Could not determine location from query")]
    MissingLocation,
}

/// Words that trail a place name in weather questions. Longer phrases first.
const TRAILING_TIME_WORDS: &[&str] = &[
    "right now", "this morning", "this afternoon", "this evening", "today", "tonight",
    "tomorrow", "currently", "now",
];

/// Words that introduce a place name in weather questions.
const LOCATION_MARKERS: &[&str] = &[" in ", " at ", " for ", " of "];

/// Build the arguments for `tool`, preferring what the classifier extracted
/// and falling back to reading the raw query.
pub fn extract(tool: ToolId, query: &str, arguments: &Value) -> Result<ToolArgs, ExtractionError> {
    let provided = schema_for(tool)
        .primary_parameter()
        .and_then(|p| arguments.get(p.name))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty());

    match tool {
        ToolId::Math => provided
            .map(str::to_string)
            .or_else(|| expression_from_query(query))
            .map(|expression| ToolArgs::Math { expression })
            .ok_or(ExtractionError::MissingExpression),
        ToolId::Weather => provided
            .map(str::to_string)
            .or_else(|| location_from_query(query))
            .map(|location| ToolArgs::Weather { location })
            .ok_or(ExtractionError::MissingLocation),
        // The answer backend gets the caller's own words, not a paraphrase.
        ToolId::Llm => Ok(ToolArgs::Llm {
            question: query.trim().to_string(),
        }),
    }
}

fn is_arithmetic_char(c: char) -> bool {
    c.is_ascii_digit() || c == '.' || c == ' ' || "+-*/()".contains(c)
}

/// The longest run of arithmetic characters that contains a digit.
pub fn expression_from_query(query: &str) -> Option<String> {
    query
        .split(|c: char| !is_arithmetic_char(c))
        .map(|run| run.trim().trim_end_matches('.').trim())
        .filter(|run| run.chars().any(|c| c.is_ascii_digit()))
        .max_by_key(|run| run.len())
        .map(str::to_string)
}

/// The last place name found after a location marker, minus trailing
/// punctuation and time words. Each candidate runs up to the next marker, so
/// "in Paris for tomorrow" yields "Paris".
pub fn location_from_query(query: &str) -> Option<String> {
    let padded = format!(" {} ", query.trim());
    // ASCII lowering keeps byte offsets aligned with `padded`.
    let lower = padded.to_ascii_lowercase();

    let mut markers: Vec<(usize, usize)> = LOCATION_MARKERS
        .iter()
        .flat_map(|m| lower.match_indices(m).map(move |(i, _)| (i, i + m.len())))
        .collect();
    markers.sort_unstable();

    (0..markers.len()).rev().find_map(|k| {
        let start = markers[k].1;
        let end = markers.get(k + 1).map_or(padded.len(), |next| next.0);
        padded.get(start..end).and_then(clean_location)
    })
}

fn trim_punctuation(text: &str) -> &str {
    text.trim()
        .trim_end_matches(|c: char| "?!.,;:".contains(c))
        .trim()
}

fn clean_location(candidate: &str) -> Option<String> {
    let mut location = trim_punctuation(candidate);

    while let Some(word) = TRAILING_TIME_WORDS.iter().find(|w| {
        let lower = location.to_ascii_lowercase();
        lower == **w || lower.ends_with(&format!(" {}", w))
    }) {
        let cut = location.len() - word.len();
        location = trim_punctuation(location.get(..cut)?);
    }

    if location.chars().next().is_some_and(char::is_alphabetic) {
        Some(location.to_string())
    } else {
        None
    }
}
