//! Text helpers shared by the predicates and the page sources.

use std::sync::LazyLock;

use regex::Regex;

/// Characters dropped from keywords before segmentation.
pub const STOPWORDS: &[char] = &['的', '了', '和', '是', '在', '对', '及', '与', '有', '不'];

static TOKEN_RUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\x{4e00}-\x{9fa5}]+|[A-Za-z0-9]+").expect("token pattern is valid")
});

/// Collapse every whitespace run to a single space and trim the ends.
#[must_use]
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Number of whitespace-delimited tokens.
#[must_use]
pub fn token_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Split a keyword into sub-tokens.
///
/// Keeps runs of CJK ideographs and runs of ASCII alphanumerics. CJK runs are
/// split at stop-word characters and then cut into consecutive two-character
/// chunks; ASCII runs stay whole.
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    for run in TOKEN_RUN.find_iter(text).map(|m| m.as_str()) {
        if run.is_ascii() {
            tokens.push(run.to_owned());
            continue;
        }
        for piece in run.split(STOPWORDS).filter(|p| !p.is_empty()) {
            let chars: Vec<char> = piece.chars().collect();
            tokens.extend(chars.chunks(2).map(|c| c.iter().collect::<String>()));
        }
    }
    tokens
}

/// Edit distance over characters (insertions, deletions, substitutions).
#[must_use]
pub fn levenshtein(a: &[char], b: &[char]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            curr[j + 1] = substitution.min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}
