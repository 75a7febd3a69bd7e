//! The three text predicates available to rule expressions.
//!
//! Degenerate inputs (no tokens, empty keyword, NaN threshold) make a
//! predicate false instead of failing the rule.

use crate::text;

/// `contains(keyword)`: `keyword` is a substring of `text`.
#[must_use]
pub fn contains(text: &str, keyword: &str) -> bool {
    text.contains(keyword)
}

/// `percentage(keyword, threshold)`: non-overlapping occurrences of `keyword`
/// per whitespace token, times 100, is at least `threshold`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn percentage(text: &str, keyword: &str, threshold: f64) -> bool {
    let tokens = text::token_count(text);
    if tokens == 0 {
        tracing::debug!(keyword, "percentage on text without tokens");
        return false;
    }
    let occurrences = text.matches(keyword).count();
    (occurrences as f64 / tokens as f64) * 100.0 >= threshold
}

/// `similar(keyword, threshold)`: fuzzy containment.
///
/// Every occurrence of the keyword's first sub-token in `text` anchors a
/// window as long as the keyword. An exact window matches outright; otherwise
/// the window matches when `(len - distance) / len >= threshold`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn similar(text: &str, keyword: &str, threshold: f64) -> bool {
    if threshold.is_nan() {
        tracing::debug!(keyword, "similar called with NaN threshold");
        return false;
    }
    let Some(anchor) = text::tokenize(keyword).into_iter().next() else {
        tracing::debug!(keyword, "similar keyword has no sub-tokens");
        return false;
    };

    let key: Vec<char> = keyword.chars().collect();
    let hay: Vec<char> = text.chars().collect();
    let anchor: Vec<char> = anchor.chars().collect();
    let key_len = key.len() as f64;

    let mut start = 0;
    while let Some(pos) = find_from(&hay, &anchor, start) {
        let end = (pos + key.len()).min(hay.len());
        let window = &hay[pos..end];
        if window == key.as_slice() {
            return true;
        }
        let distance = text::levenshtein(&key, window) as f64;
        if (key_len - distance) / key_len >= threshold {
            return true;
        }
        start = pos + 1;
    }
    false
}

fn find_from(hay: &[char], needle: &[char], start: usize) -> Option<usize> {
    if needle.is_empty() || start >= hay.len() || needle.len() > hay.len() - start {
        return None;
    }
    hay[start..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|offset| start + offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_substring() {
        assert!(contains("增值税专用发票", "发票"));
        assert!(!contains("收据", "发票"));
        assert!(contains("anything", ""));
    }

    #[test]
    fn percentage_counts_per_token() {
        // 2 occurrences over 4 tokens = 50%
        assert!(percentage("税 税 a b", "税", 50.0));
        assert!(!percentage("税 税 a b", "税", 50.1));
    }

    #[test]
    fn percentage_counts_non_overlapping() {
        // "aaaa" holds two non-overlapping "aa"; one token -> 200%
        assert!(percentage("aaaa", "aa", 200.0));
        assert!(!percentage("aaaa", "aa", 201.0));
    }

    #[test]
    fn percentage_without_tokens_is_false() {
        assert!(!percentage("", "税", 0.0));
        assert!(!percentage("   ", "税", -1.0));
    }

    #[test]
    fn similar_exact_window() {
        assert!(similar("开具发票号码12345", "发票号码", 1.0));
    }

    #[test]
    fn similar_one_substitution() {
        // anchor "发票" found; window "发票号玛" is 1 edit away: 3/4 = 0.75
        assert!(similar("开具发票号玛12345", "发票号码", 0.75));
        assert!(!similar("开具发票号玛12345", "发票号码", 0.8));
    }

    #[test]
    fn similar_truncated_window_at_end() {
        // window "发票号" is one deletion away from "发票号码"
        assert!(similar("开具发票号", "发票号码", 0.75));
        assert!(!similar("开具发票号", "发票号码", 0.76));
    }

    #[test]
    fn similar_scans_every_anchor() {
        // first anchor window is poor, second is exact
        assert!(similar("发票XX 发票号码", "发票号码", 1.0));
    }

    #[test]
    fn similar_without_anchor_is_false() {
        assert!(!similar("收据", "发票号码", 0.0));
        assert!(!similar("发票", "---", 0.0));
        assert!(!similar("发票", "", 0.0));
        assert!(!similar("发票", "发票", f64::NAN));
    }

    #[test]
    fn find_from_bounds() {
        let hay: Vec<char> = "abcabc".chars().collect();
        let needle: Vec<char> = "bc".chars().collect();
        assert_eq!(find_from(&hay, &needle, 0), Some(1));
        assert_eq!(find_from(&hay, &needle, 2), Some(4));
        assert_eq!(find_from(&hay, &needle, 5), None);
        assert_eq!(find_from(&hay, &needle, 10), None);
    }
}
