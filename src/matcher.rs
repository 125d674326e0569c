//! Phrase compilation: literal phrase -> whitespace-tolerant, case-insensitive regex
//!
//! A phrase such as `"not selected"` becomes `(?i)\bnot\s+selected\b`:
//! - every regex metacharacter is escaped, so any input compiles safely
//! - each whitespace run matches any whitespace run (line wraps in HTML-stripped text)
//! - word-boundary anchors keep the phrase from matching inside a larger word
//!
//! A boundary anchor is only emitted on a side where the phrase has a word
//! character. `\b` next to a trailing `.` would require a word character to
//! follow the period, so `"position has been filled."` could never match at
//! the end of a sentence.

use regex::Regex;

use crate::error::{LabelerError, Result};

/// Matches either apostrophe form; curated phrases use the typographic one,
/// real mail often uses the ASCII one.
const APOSTROPHE_CLASS: &str = "['’]";

/// A compiled matcher derived from exactly one phrase
#[derive(Debug, Clone)]
pub struct PhraseMatcher {
    phrase: String,
    regex: Regex,
}

impl PhraseMatcher {
    /// The literal phrase this matcher was compiled from
    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    /// The generated regex source
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    /// True if the phrase occurs anywhere in `text`
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

/// Compile a literal phrase into a [`PhraseMatcher`]
///
/// Leading and trailing whitespace is ignored. A blank phrase is rejected
/// since it would match every message.
pub fn compile(phrase: &str) -> Result<PhraseMatcher> {
    let pattern = phrase_pattern(phrase).ok_or_else(|| LabelerError::InvalidPhrase {
        phrase: phrase.to_string(),
        reason: "phrase is blank".to_string(),
    })?;

    let regex = Regex::new(&pattern).map_err(|e| LabelerError::InvalidPhrase {
        phrase: phrase.to_string(),
        reason: e.to_string(),
    })?;

    Ok(PhraseMatcher {
        phrase: phrase.to_string(),
        regex,
    })
}

/// Compile a list of phrases, failing on the first bad one
pub fn compile_all<S: AsRef<str>>(phrases: &[S]) -> Result<Vec<PhraseMatcher>> {
    phrases.iter().map(|p| compile(p.as_ref())).collect()
}

/// Build the regex source for a phrase, or `None` if the phrase is blank
pub fn phrase_pattern(phrase: &str) -> Option<String> {
    let trimmed = phrase.trim();
    if trimmed.is_empty() {
        return None;
    }

    let body = trimmed
        .split_whitespace()
        .map(escape_word)
        .collect::<Vec<_>>()
        .join(r"\s+");

    let mut pattern = String::with_capacity(body.len() + 10);
    pattern.push_str("(?i)");
    if trimmed.chars().next().is_some_and(is_word_char) {
        pattern.push_str(r"\b");
    }
    pattern.push_str(&body);
    if trimmed.chars().next_back().is_some_and(is_word_char) {
        pattern.push_str(r"\b");
    }

    Some(pattern)
}

/// Characters on which `\b` can anchor
fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn escape_word(word: &str) -> String {
    let mut escaped = String::with_capacity(word.len());
    let mut buf = [0u8; 4];
    for c in word.chars() {
        if c == '\'' || c == '’' {
            escaped.push_str(APOSTROPHE_CLASS);
        } else {
            escaped.push_str(&regex::escape(c.encode_utf8(&mut buf)));
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_pattern_shape() {
        assert_eq!(
            phrase_pattern("not selected").unwrap(),
            r"(?i)\bnot\s+selected\b"
        );
        assert_eq!(
            phrase_pattern("  interview   request ").unwrap(),
            r"(?i)\binterview\s+request\b"
        );
    }

    #[test]
    fn test_blank_phrase_rejected() {
        assert!(phrase_pattern("").is_none());
        assert!(phrase_pattern(" \t\n").is_none());

        let err = compile("   ").unwrap_err();
        assert!(matches!(err, LabelerError::InvalidPhrase { .. }));
    }

    #[test]
    fn test_case_insensitive() {
        let m = compile("interview invitation").unwrap();
        assert!(m.is_match("INTERVIEW Invitation from Acme"));
        assert_eq!(m.phrase(), "interview invitation");
    }

    #[test]
    fn test_whitespace_runs_match_any_whitespace() {
        let m = compile("not selected").unwrap();
        assert!(m.is_match("you were not    selected"));
        assert!(m.is_match("you were not\r\n\tselected"));
        assert!(!m.is_match("you were notselected"));
    }

    #[test]
    fn test_word_boundaries() {
        let m = compile("not selected").unwrap();
        assert!(!m.is_match("wenotselectedyou"));
        assert!(!m.is_match("a knot selected at random"));
        assert!(!m.is_match("not selectedness"));
        assert!(m.is_match("sadly you were not selected, sorry"));
        assert!(m.is_match("not selected"));
    }

    #[test]
    fn test_metacharacters_are_literal() {
        let m = compile("c++ (senior)").unwrap();
        assert!(m.is_match("Role: C++  (Senior) engineer"));
        assert!(!m.is_match("Role: cc (senior)"));

        let dot = compile("a.b").unwrap();
        assert!(dot.is_match("see a.b now"));
        assert!(!dot.is_match("see axb now"));

        let slash = compile("good day/time").unwrap();
        assert!(slash.is_match("a good day/time for us"));
    }

    #[test]
    fn test_trailing_punctuation_phrase() {
        let m = compile("position has been filled.").unwrap();
        assert_eq!(m.pattern(), r"(?i)\bposition\s+has\s+been\s+filled\.");
        assert!(m.is_match("The position has been filled. Thank you."));
        assert!(m.is_match("the position has been filled."));
        assert!(!m.is_match("the position has been filled"));
        assert!(!m.is_match("preposition has been filled."));
    }

    #[test]
    fn test_anchors_follow_edge_characters() {
        assert_eq!(phrase_pattern("…next").unwrap(), r"(?i)…next\b");
        assert_eq!(phrase_pattern("(senior) role").unwrap(), r"(?i)\(senior\)\s+role\b");
        assert_eq!(phrase_pattern("_ref 7").unwrap(), r"(?i)\b_ref\s+7\b");

        let accented = compile("poste pourvu déjà").unwrap();
        assert!(accented.pattern().ends_with(r"déjà\b"));
        assert!(accented.is_match("Le poste pourvu déjà, merci"));
        assert!(!accented.is_match("le poste pourvu déjàvu"));
    }

    #[test]
    fn test_apostrophe_forms_are_interchangeable() {
        let curly = compile("we won’t be moving forward").unwrap();
        assert!(curly.is_match("we won't be moving forward"));
        assert!(curly.is_match("we won’t be moving forward"));

        let straight = compile("we'd like to invite you").unwrap();
        assert!(straight.is_match("We’d like to invite you"));
    }

    #[test]
    fn test_compile_all_preserves_order() {
        let matchers = compile_all(&["b phrase", "a phrase"]).unwrap();
        assert_eq!(matchers[0].phrase(), "b phrase");
        assert_eq!(matchers[1].phrase(), "a phrase");

        assert!(compile_all(&["ok", ""]).is_err());
    }

    proptest! {
        #[test]
        fn prop_any_non_blank_phrase_compiles(phrase in ".{1,40}") {
            prop_assume!(!phrase.trim().is_empty());
            prop_assert!(compile(&phrase).is_ok());
        }

        #[test]
        fn prop_phrase_matches_itself_verbatim(
            phrase in "[a-zA-Z0-9 .,!?'()*+\\[\\]{}|^$\\\\/-]{1,40}",
        ) {
            prop_assume!(!phrase.trim().is_empty());
            let matcher = compile(&phrase).unwrap();
            let text = format!("before {} after", phrase);
            prop_assert!(matcher.is_match(&text), "pattern {} vs {:?}", matcher.pattern(), text);
            prop_assert!(matcher.is_match(&text.to_uppercase()));
        }
    }
}
