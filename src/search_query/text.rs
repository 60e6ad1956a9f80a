//! Case folding shared by the evaluator and the index.
//!
//! Both sides of every comparison are folded per character with
//! `char::to_lowercase`, so a substring found by the evaluator always has
//! all of its trigrams present in the index.

pub fn fold(s: &str) -> String {
    s.chars().flat_map(char::to_lowercase).collect()
}

/// Folded copy of a field that remembers which original character each
/// folded byte came from, so match offsets can be reported against the
/// text the user sees.
#[derive(Debug, Clone)]
pub struct FoldedText {
    folded: String,
    origin: Vec<usize>,
}

impl FoldedText {
    pub fn new(text: &str) -> Self {
        let mut folded = String::with_capacity(text.len());
        let mut origin = Vec::with_capacity(text.len());
        for (idx, ch) in text.chars().enumerate() {
            for lower in ch.to_lowercase() {
                folded.push(lower);
                origin.extend(std::iter::repeat(idx).take(lower.len_utf8()));
            }
        }
        Self { folded, origin }
    }

    pub fn as_str(&self) -> &str {
        &self.folded
    }

    /// First occurrence of an already folded needle, as a character range
    /// `[start, end)` of the original text.
    pub fn find(&self, needle: &str) -> Option<(usize, usize)> {
        if needle.is_empty() {
            return None;
        }
        let start = self.folded.find(needle)?;
        let end = start + needle.len();
        Some((self.origin[start], self.origin[end - 1] + 1))
    }

    /// Non-overlapping occurrences of an already folded needle.
    pub fn occurrences(&self, needle: &str) -> usize {
        if needle.is_empty() {
            return 0;
        }
        self.folded.matches(needle).count()
    }
}

/// Character trigrams of folded text. Text shorter than three characters
/// has none.
pub fn trigrams(folded: &str) -> Vec<String> {
    let chars: Vec<char> = folded.chars().collect();
    chars.windows(3).map(|w| w.iter().collect()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_lowercases() {
        assert_eq!(fold("Rust GUIDE"), "rust guide");
    }

    #[test]
    fn test_find_reports_char_offsets() {
        let text = FoldedText::new("Intro to Machine Learning");
        assert_eq!(text.find("machine"), Some((9, 16)));
        assert_eq!(text.find("python"), None);
    }

    #[test]
    fn test_find_after_multibyte_chars() {
        let text = FoldedText::new("Café Über Guide");
        assert_eq!(text.find("über"), Some((5, 9)));
        assert_eq!(text.find("guide"), Some((10, 15)));
    }

    #[test]
    fn test_find_when_folding_expands_a_char() {
        // 'İ' folds to two chars; offsets still point at the original
        let text = FoldedText::new("İstanbul guide");
        assert_eq!(text.find("guide"), Some((9, 14)));
    }

    #[test]
    fn test_empty_needle_never_matches() {
        let text = FoldedText::new("anything");
        assert_eq!(text.find(""), None);
        assert_eq!(text.occurrences(""), 0);
    }

    #[test]
    fn test_occurrences_non_overlapping() {
        let text = FoldedText::new("Go go GO gogo");
        assert_eq!(text.occurrences("go"), 5);
        assert_eq!(FoldedText::new("aaaa").occurrences("aa"), 2);
    }

    #[test]
    fn test_trigrams() {
        assert_eq!(trigrams("rust"), vec!["rus", "ust"]);
        assert!(trigrams("go").is_empty());
    }
}
