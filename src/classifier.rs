//! Job mail classification engine built on compiled phrase matchers

use crate::error::Result;
use crate::matcher::{self, PhraseMatcher};
use crate::models::{Classification, JobCategory};
use crate::phrases::{INTERVIEW_PHRASES, REJECTION_PHRASES};

/// Classifies (subject, body) pairs as rejection and/or interview mail
///
/// Both matcher sets are compiled once in [`JobMailClassifier::new`] and never
/// change afterwards. Every predicate is a pure function of its input.
#[derive(Debug, Clone)]
pub struct JobMailClassifier {
    rejection: Vec<PhraseMatcher>,
    interview: Vec<PhraseMatcher>,
}

impl JobMailClassifier {
    /// Compile both phrase lists
    pub fn new<R, I>(rejection_phrases: &[R], interview_phrases: &[I]) -> Result<Self>
    where
        R: AsRef<str>,
        I: AsRef<str>,
    {
        let rejection = matcher::compile_all(rejection_phrases)?;
        let interview = matcher::compile_all(interview_phrases)?;

        tracing::debug!(
            "Compiled {} rejection and {} interview matchers",
            rejection.len(),
            interview.len()
        );

        Ok(Self {
            rejection,
            interview,
        })
    }

    /// Classifier over the built-in phrase lists
    pub fn with_default_phrases() -> Result<Self> {
        Self::new(REJECTION_PHRASES, INTERVIEW_PHRASES)
    }

    pub fn is_rejection(&self, subject: &str, body: &str) -> bool {
        self.matches(JobCategory::Rejection, subject, body)
    }

    pub fn is_interview(&self, subject: &str, body: &str) -> bool {
        self.matches(JobCategory::Interview, subject, body)
    }

    /// True if any matcher of `category` occurs in the subject or body
    pub fn matches(&self, category: JobCategory, subject: &str, body: &str) -> bool {
        self.matching_phrase(category, subject, body).is_some()
    }

    /// First phrase of `category` (in list order) found in the message
    pub fn matching_phrase(&self, category: JobCategory, subject: &str, body: &str) -> Option<&str> {
        let text = normalize(subject, body);
        self.matchers(category)
            .iter()
            .find(|m| m.is_match(&text))
            .map(|m| m.phrase())
    }

    /// Evaluate both predicates independently
    pub fn classify(&self, subject: &str, body: &str) -> Classification {
        let text = normalize(subject, body);
        Classification {
            rejection: self.rejection.iter().any(|m| m.is_match(&text)),
            interview: self.interview.iter().any(|m| m.is_match(&text)),
        }
    }

    pub fn matchers(&self, category: JobCategory) -> &[PhraseMatcher] {
        match category {
            JobCategory::Rejection => &self.rejection,
            JobCategory::Interview => &self.interview,
        }
    }
}

// The matchers are already case-insensitive; lower-casing keeps debug output uniform.
fn normalize(subject: &str, body: &str) -> String {
    let mut text = String::with_capacity(subject.len() + body.len() + 1);
    text.push_str(subject);
    text.push(' ');
    text.push_str(body);
    text.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> JobMailClassifier {
        JobMailClassifier::with_default_phrases().unwrap()
    }

    #[test]
    fn test_rejection_scenario() {
        let c = classifier();
        let subject = "Update on your application";
        let body = "Unfortunately, we will not be moving forward with your application";
        assert!(c.is_rejection(subject, body));
        assert!(!c.is_interview(subject, body));
    }

    #[test]
    fn test_interview_scenario() {
        let c = classifier();
        let subject = "Interview invitation";
        let body = "We'd like to invite you to an interview next week";
        assert!(c.is_interview(subject, body));
        assert!(!c.is_rejection(subject, body));
    }

    #[test]
    fn test_empty_message_is_neither() {
        let c = classifier();
        assert!(!c.is_rejection("", ""));
        assert!(!c.is_interview("", ""));
        assert_eq!(c.classify("", ""), Classification::default());
    }

    #[test]
    fn test_predicates_are_independent() {
        let c = classifier();
        let body = "Unfortunately the first role is closed, but we'd like to set up a phone screen for another.";
        let result = c.classify("Your application", body);
        assert!(result.rejection);
        assert!(result.interview);
        assert!(c.is_rejection("Your application", body));
        assert!(c.is_interview("Your application", body));
    }

    #[test]
    fn test_subject_and_body_are_joined_with_space() {
        let c = JobMailClassifier::new(&["not selected"], &["next steps"]).unwrap();
        // Without the separator the two halves would fuse into "notselected"
        assert!(c.is_rejection("You were not", "selected"));
        assert!(c.is_interview("Next", "steps"));
        assert!(!c.is_rejection("You were knot", "selected"));
    }

    #[test]
    fn test_word_boundary_respected() {
        let c = classifier();
        assert!(!c.is_rejection("Hello", "wenotselectedyou"));
        assert!(c.is_rejection("Hello", "Sadly you were not selected."));
    }

    #[test]
    fn test_matching_phrase_reports_first_in_list_order() {
        let c = classifier();
        let phrase = c.matching_phrase(
            JobCategory::Rejection,
            "",
            "Unfortunately, you have not been selected",
        );
        assert_eq!(phrase, Some("unfortunately"));
        assert_eq!(c.matching_phrase(JobCategory::Interview, "hi", "there"), None);
    }

    #[test]
    fn test_custom_phrase_lists_replace_defaults() {
        let c = JobMailClassifier::new(&["thanks but no thanks"], &["come visit us"]).unwrap();
        assert!(!c.is_rejection("", "Unfortunately"));
        assert!(c.is_rejection("", "Thanks  but no\nthanks"));
        assert!(c.is_interview("Come visit us", ""));
        assert_eq!(c.matchers(JobCategory::Rejection).len(), 1);
    }

    #[test]
    fn test_blank_phrase_fails_construction() {
        assert!(JobMailClassifier::new(&["ok", " "], &["fine"]).is_err());
        assert!(JobMailClassifier::new(&["ok"], &[""]).is_err());
    }

    #[test]
    fn test_every_builtin_phrase_matches_verbatim() {
        let c = classifier();
        for phrase in REJECTION_PHRASES {
            let body = format!("Dear candidate, {} Best regards", phrase.to_uppercase());
            assert!(c.is_rejection("", &body), "rejection phrase missed: {}", phrase);
        }
        for phrase in INTERVIEW_PHRASES {
            let body = format!("Hi! {} Thanks", phrase);
            assert!(c.is_interview("", &body), "interview phrase missed: {}", phrase);
        }
    }

    #[test]
    fn test_every_builtin_phrase_tolerates_wrapped_whitespace() {
        let c = classifier();
        for phrase in REJECTION_PHRASES {
            let wrapped = phrase.replace(' ', " \n  ");
            assert!(c.is_rejection(&wrapped, ""), "rejection phrase missed: {:?}", wrapped);
        }
        for phrase in INTERVIEW_PHRASES {
            let wrapped = phrase.replace(' ', "\t\r\n");
            assert!(c.is_interview("", &wrapped), "interview phrase missed: {:?}", wrapped);
        }
    }
}
