//! Text helpers shared by the resolver and the front-ends.

/// Normalize a user utterance for allow-list comparison.
///
/// Trims the input, collapses runs of inner whitespace to a single space and
/// lower-cases the result, so `"  Nokia   PSS "` becomes `"nokia pss"`.
pub fn normalize(input: &str) -> String {
    input
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Shorten a string to at most `max_chars` Unicode characters for log lines.
///
/// Longer strings keep their first `max_chars - 3` characters followed by
/// `...`. Limits of three or less yield only dots.
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    if max_chars <= 3 {
        return ".".repeat(max_chars);
    }
    let head: String = s.chars().take(max_chars - 3).collect();
    format!("{head}...")
}
