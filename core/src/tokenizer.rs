use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref RE: Regex = Regex::new(r"[\p{L}\p{N}]+").expect("valid regex");
}

/// Lowercase and strip diacritics so accented and plain spellings compare equal.
///
/// `đ` has no canonical decomposition and is mapped by hand.
pub fn fold(text: &str) -> String {
    text.to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| match c {
            'đ' => 'd',
            _ => c,
        })
        .collect()
}

/// Tokenize text into terms: fold, then split on anything that is not a letter or digit.
pub fn tokenize(text: &str) -> Vec<String> {
    let folded = fold(text);
    RE.find_iter(&folded).map(|m| m.as_str().to_string()).collect()
}

/// Like [`tokenize`], keeping only the first occurrence of each term.
pub fn tokenize_unique(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    tokenize(text).into_iter().filter(|t| seen.insert(t.clone())).collect()
}
