//! Signal sets (§4.1): word lists and detectors, kept as data rather than
//! scattered inline string checks, so a test can substitute its own sets.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

/// A request's pre-computed signal booleans, consumed by the classifier's rule table.
#[derive(Debug, Clone, Default)]
pub struct DetectedSignals {
    pub has_web_signal: bool,
    pub has_file_output_signal: bool,
    pub has_creation_verb: bool,
    pub is_complex: bool,
}

pub struct SignalSet {
    pub web_verbs: HashSet<&'static str>,
    pub news_nouns: HashSet<&'static str>,
    pub temporal_qualifiers: HashSet<&'static str>,
    pub file_output_verbs: HashSet<&'static str>,
    pub file_output_nouns: HashSet<&'static str>,
    pub creation_verbs: HashSet<&'static str>,
    pub allowed_tlds: HashSet<&'static str>,
    pub sequencing_markers: HashSet<&'static str>,
    /// Broader than `web_verbs`/`file_output_verbs`: used only to count how
    /// many distinct actions a request names, for rule 4's complexity check.
    pub action_verbs: HashSet<&'static str>,
}

impl Default for SignalSet {
    fn default() -> Self {
        Self {
            web_verbs: ["search", "find", "look up", "browse", "visit", "go to", "research", "open", "check"]
                .into_iter()
                .collect(),
            news_nouns: ["news", "headlines", "article"].into_iter().collect(),
            temporal_qualifiers: ["latest", "current", "today"].into_iter().collect(),
            file_output_verbs: ["save", "write", "store", "create", "generate", "compile", "draft", "compose"]
                .into_iter()
                .collect(),
            file_output_nouns: [
                "file", "document", "report", "summary", "story", "poem", "essay", "note", "analysis",
            ]
            .into_iter()
            .collect(),
            creation_verbs: ["create", "write", "generate", "draft", "compose"].into_iter().collect(),
            allowed_tlds: ["com", "org", "net", "edu", "gov", "io", "ai", "co.uk", "co"].into_iter().collect(),
            sequencing_markers: ["and then", "after that", "first", "second", "third"].into_iter().collect(),
            action_verbs: [
                "search", "research", "find", "look up", "browse", "visit", "summarize", "summarise", "compile",
                "create", "write", "generate", "draft", "compose", "analyze", "analyse", "compare", "gather",
                "collect", "review", "save",
            ]
            .into_iter()
            .collect(),
        }
    }
}

static URL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[a-zA-Z][a-zA-Z0-9+.\-]*://\S+").unwrap());
static BARE_DOMAIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[a-zA-Z0-9][a-zA-Z0-9-]*(?:\.[a-zA-Z0-9][a-zA-Z0-9-]*)+\b").unwrap());
static QUOTED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#""([^"]+)""#).unwrap());

impl SignalSet {
    fn has_url(&self, lower: &str) -> bool {
        URL_RE.is_match(lower)
    }

    fn has_bare_domain(&self, lower: &str) -> bool {
        BARE_DOMAIN_RE.find_iter(lower).any(|m| {
            let candidate = m.as_str();
            self.allowed_tlds
                .iter()
                .any(|tld| candidate.ends_with(&format!(".{tld}")))
        })
    }

    fn contains_word(&self, lower: &str, words: &HashSet<&'static str>) -> bool {
        words.iter().any(|w| lower.contains(w))
    }

    fn named_output_file_count(&self, lower: &str) -> usize {
        QUOTED_RE.find_iter(lower).count()
    }

    fn distinct_action_verb_count(&self, lower: &str) -> usize {
        self.action_verbs.iter().filter(|verb| lower.contains(*verb)).count()
    }

    /// Compute the signal booleans the classifier's rule table consumes.
    pub fn detect(&self, request: &str) -> DetectedSignals {
        let lower = request.to_lowercase();

        let has_web_signal = self.has_url(&lower)
            || self.has_bare_domain(&lower)
            || self.contains_word(&lower, &self.web_verbs)
            || self.contains_word(&lower, &self.news_nouns)
            || self.contains_word(&lower, &self.temporal_qualifiers);

        let has_file_output_signal = self.contains_word(&lower, &self.file_output_verbs)
            || self.contains_word(&lower, &self.file_output_nouns)
            || lower.contains("named");

        let has_creation_verb = self.contains_word(&lower, &self.creation_verbs);

        // Threshold is 3, not 2: a simple hybrid request ("search X and save it")
        // already names two actions, so requiring 3 is what keeps rule 4 from
        // shadowing rule 1 on the common two-step case.
        let has_sequencing = self.sequencing_markers.iter().any(|m| lower.contains(m));
        let is_complex =
            self.distinct_action_verb_count(&lower) >= 3 || has_sequencing || self.named_output_file_count(&lower) >= 2;

        DetectedSignals {
            has_web_signal,
            has_file_output_signal,
            has_creation_verb,
            is_complex,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_url_as_web_signal() {
        let signals = SignalSet::default().detect("Go look at https://example.com/page");
        assert!(signals.has_web_signal);
    }

    #[test]
    fn detects_bare_domain_with_allowed_tld() {
        let signals = SignalSet::default().detect("Check reuters.com for updates");
        assert!(signals.has_web_signal);
    }

    #[test]
    fn detects_file_output_signal_from_verb() {
        let signals = SignalSet::default().detect("Write a short story about dragons");
        assert!(signals.has_file_output_signal);
        assert!(signals.has_creation_verb);
    }

    #[test]
    fn detects_sequencing_as_complex() {
        let signals = SignalSet::default().detect("First research AI papers, then summarize them");
        assert!(signals.is_complex);
    }
}
