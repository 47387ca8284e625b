//! Identifier-aware tokenization.
//!
//! Text is split on non-word characters. Each identifier is indexed whole and,
//! when it is camelCase or snake_case, by its parts as well. Tokens are
//! lowercased and shorter tokens are dropped.

/// Minimum token length in characters.
pub const MIN_TOKEN_LEN: usize = 2;

/// Tokenize text, keeping duplicates so callers can count term frequency.
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    for word in words(text) {
        push_token(&mut tokens, word);
        let parts = split_identifier(word);
        if parts.len() > 1 {
            for part in parts {
                push_token(&mut tokens, part);
            }
        }
    }
    tokens
}

/// Tokenize query text into distinct terms in first-seen order.
#[must_use]
pub fn query_terms(text: &str) -> Vec<String> {
    let mut terms = Vec::new();
    for token in tokenize(text) {
        if !terms.contains(&token) {
            terms.push(token);
        }
    }
    terms
}

/// Runs of alphanumeric characters and underscores.
pub fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !is_word_char(c))
        .filter(|w| !w.is_empty())
}

#[must_use]
pub fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Split an identifier on underscores and case transitions.
///
/// `parseHTTPResponse` yields `parse`, `HTTP`, `Response`.
#[must_use]
pub fn split_identifier(word: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    for segment in word.split('_').filter(|s| !s.is_empty()) {
        let chars: Vec<(usize, char)> = segment.char_indices().collect();
        let mut start = 0;
        for i in 1..chars.len() {
            let (idx, c) = chars[i];
            let prev = chars[i - 1].1;
            let next = chars.get(i + 1).map(|(_, n)| *n);
            let boundary = (prev.is_lowercase() && c.is_uppercase())
                || (prev.is_uppercase() && c.is_uppercase() && next.is_some_and(char::is_lowercase));
            if boundary {
                parts.push(&segment[start..idx]);
                start = idx;
            }
        }
        parts.push(&segment[start..]);
    }
    parts
}

fn push_token(tokens: &mut Vec<String>, raw: &str) {
    if raw.chars().count() >= MIN_TOKEN_LEN {
        tokens.push(raw.to_lowercase());
    }
}
