//! Hybrid word counting for pricing.
//!
//! Translation is billed by a language-agnostic "word" proxy: each CJK
//! ideograph counts as one word, and each whitespace-separated token
//! containing at least one letter counts as one word. This is a billing
//! heuristic, not a linguistic tokenizer.

/// Replaces every markup tag (`<...>`) in the input with a single space.
///
/// An unterminated `<` swallows the rest of the input. This keeps tag
/// boundaries from gluing adjacent words together when counting.
pub fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;

    for c in html.chars() {
        match c {
            '<' if !in_tag => {
                in_tag = true;
                out.push(' ');
            }
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }

    out
}

/// Counts words in already-stripped text.
///
/// Each CJK code point is one word; each remaining whitespace-delimited
/// token with at least one alphabetic character is one word.
pub fn count_words(text: &str) -> usize {
    let cjk_count = text.chars().filter(|&c| is_cjk(c)).count();

    let token_count = text
        .split_whitespace()
        .filter(|token| token.chars().any(|c| c.is_alphabetic() && !is_cjk(c)))
        .count();

    cjk_count + token_count
}

/// Strips markup and counts words in one pass over a content document.
pub fn count_document_words(html: &str) -> usize {
    count_words(&strip_tags(html))
}

/// Returns true for code points in the CJK ideograph ranges.
fn is_cjk(c: char) -> bool {
    matches!(c,
        '\u{4E00}'..='\u{9FFF}'     // CJK Unified Ideographs
        | '\u{3400}'..='\u{4DBF}'   // Extension A
        | '\u{F900}'..='\u{FAFF}'   // Compatibility Ideographs
        | '\u{20000}'..='\u{2A6DF}' // Extension B
    )
}
