//! Message fingerprinting for duplicate detection

/// Normalize text to its space-separated sequence of lowercase alphanumeric tokens
///
/// Two messages are duplicates when their tokenized forms are equal, so
/// punctuation, casing and spacing differences never hide a repeat.
pub fn tokenize(text: &str) -> String {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Case-insensitive substring match
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    !needle.is_empty() && haystack.to_lowercase().contains(&needle.to_lowercase())
}
