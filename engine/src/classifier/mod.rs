//! C1: decide a request's shape (§4.1).
//!
//! The decision is a total function over an ordered rule table, not a
//! cascade of inline `if`/`else` checks, per the redesign note in §9 ("make
//! the rules data, not control flow"). The classifier never fails.

mod signals;

pub use signals::{DetectedSignals, SignalSet};

use crate::domain::Shape;

type Predicate = fn(&DetectedSignals) -> bool;

struct Rule {
    #[allow(dead_code)]
    name: &'static str,
    predicate: Predicate,
    shape: Shape,
}

// Rule 1 alone is guarded with `!is_complex`: a request naming three or more
// distinct actions (or explicit sequencing) is routed to the planner even
// when it also happens to carry a web signal and a file-output signal, since
// that combination alone is common to ordinary two-step hybrid requests too.
// Rules 2 and 3 carry no such exception (§4.1): a direct-file or web-only
// request stays direct-file/web-only no matter how many action verbs it uses.
static RULES: &[Rule] = &[
    Rule {
        name: "hybrid: web + file-output signals",
        predicate: |s| s.has_web_signal && s.has_file_output_signal && !s.is_complex,
        shape: Shape::Hybrid,
    },
    Rule {
        name: "direct-file: creation verb, no web signal",
        predicate: |s| s.has_creation_verb && !s.has_web_signal,
        shape: Shape::DirectFile,
    },
    Rule {
        name: "web-only: web signal, no file-output signal",
        predicate: |s| s.has_web_signal && !s.has_file_output_signal,
        shape: Shape::WebOnly,
    },
    Rule {
        name: "complex: multiple action verbs or sequencing",
        predicate: |s| s.is_complex,
        shape: Shape::Complex,
    },
];

/// Classifies a request into a [`Shape`] using an ordered, data-driven rule
/// table (§4.1 rules 1-4), falling back to rule 5's explicit tie-break when
/// no table entry matches.
pub struct Classifier {
    signals: SignalSet,
}

impl Default for Classifier {
    fn default() -> Self {
        Self {
            signals: SignalSet::default(),
        }
    }
}

impl Classifier {
    pub fn new(signals: SignalSet) -> Self {
        Self { signals }
    }

    /// `classify(request) -> Shape` (§4.1). Total: never fails.
    pub fn classify(&self, request: &str) -> Shape {
        let detected = self.signals.detect(request);

        for rule in RULES {
            if (rule.predicate)(&detected) {
                return rule.shape;
            }
        }

        // Rule 5: no table entry matched.
        if detected.has_creation_verb {
            Shape::DirectFile
        } else if detected.has_web_signal {
            Shape::WebOnly
        } else {
            Shape::Complex
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(request: &str) -> Shape {
        Classifier::default().classify(request)
    }

    #[test]
    fn direct_file_creation() {
        assert_eq!(classify("Create a poem about autumn and save it as autumn_poem.txt"), Shape::DirectFile);
    }

    #[test]
    fn pure_web_browsing() {
        assert_eq!(classify("Search for information about climate change"), Shape::WebOnly);
    }

    #[test]
    fn hybrid_when_web_and_save_signals_present() {
        assert_eq!(
            classify("Search for information about climate change and create a summary file"),
            Shape::Hybrid
        );
    }

    #[test]
    fn url_plus_save_verb_is_hybrid_not_web_only() {
        assert_eq!(classify("Save https://example.com/article as notes.txt"), Shape::Hybrid);
    }

    #[test]
    fn creation_verb_plus_domain_is_hybrid() {
        assert_eq!(classify("Write a summary of reuters.com coverage"), Shape::Hybrid);
    }

    #[test]
    fn complex_with_sequencing_markers() {
        assert_eq!(
            classify("Research AI papers, summarize them, find images of the top 3, and compile a report"),
            Shape::Complex
        );
    }

    #[test]
    fn classifier_is_total_for_empty_input() {
        // Neither web nor creation signal: falls all the way to rule 5's Complex default.
        assert_eq!(classify("hello"), Shape::Complex);
    }

    #[test]
    fn web_only_stays_web_only_even_with_many_action_verbs() {
        // Three distinct web-only action verbs and no file-output signal: rule 3
        // is unconditional (§4.1), unlike rule 1, so this must not fall to Complex.
        assert_eq!(classify("Search, browse, and research the latest AI developments"), Shape::WebOnly);
    }
}
