use once_cell::sync::Lazy;
use regex::Regex;

static REASONING_BLOCK_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<(think|thinking|reasoning|internal)>.*?</(think|thinking|reasoning|internal)>|<think\s*/>")
        .unwrap()
});

static TRAILING_SPACE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+\n").unwrap());

static MULTIPLE_NEWLINES_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// Strip model reasoning blocks and layout noise from an analysis answer.
/// The analysis text itself is left untouched.
pub fn clean_analysis_text(response: &str) -> String {
    let without_reasoning = REASONING_BLOCK_PATTERN.replace_all(response, "");
    let normalized = without_reasoning.replace("\r\n", "\n");
    let normalized = TRAILING_SPACE_PATTERN.replace_all(&normalized, "\n");

    MULTIPLE_NEWLINES_PATTERN
        .replace_all(normalized.trim(), "\n\n")
        .into_owned()
}
