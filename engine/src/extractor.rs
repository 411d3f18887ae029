//! C2: derive a target filename and content type from a request (§4.2).

use std::sync::LazyLock;

use regex::Regex;

/// `extract(request) -> (filename, content_type)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    pub filename: String,
    pub content_type: String,
}

struct NamedPattern {
    #[allow(dead_code)]
    label: &'static str,
    regex: &'static LazyLock<Regex>,
    /// If true, the matched text is a complete `<base>.<ext>` token used
    /// verbatim (rule 6): no `.txt` default, no post-processing.
    verbatim: bool,
}

static NAMED_QUOTED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"(?i)named\s+"([^"]+)""#).unwrap());
static NAMED_BARE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"(?i)named\s+([a-zA-Z0-9_.\-]+)"#).unwrap());
static SAVE_AS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)save\s+(?:it|this|that)?\s*(?:to|as|in)\s+"([^"]+)""#).unwrap());
static SAVE_FILE_NAMED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)save\s+(?:to|in|as)\s+(?:a\s+)?(?:file|document)\s+(?:named|called)\s+"([^"]+)""#).unwrap()
});
static CREATE_FILE_NAMED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:create|write)\s+(?:a\s+)?(?:file|document)\s+(?:named|called)\s+"([^"]+)""#).unwrap()
});
static ANY_QUOTED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#""([^"]+)""#).unwrap());
static BASE_DOT_EXT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b([\w-]+\.[A-Za-z]{2,4})\b").unwrap());
static FILE_NAMED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)file\s+(?:named|called)\s+"?([a-zA-Z0-9_.\- ]+?)"?(?:[.,]|$)"#).unwrap());
static NAMED_EOL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"(?i)named\s+"([^"]+)"\s*\.?\s*$"#).unwrap());

static PATTERNS: &[NamedPattern] = &[
    NamedPattern { label: "save as quoted", regex: &SAVE_AS, verbatim: false },
    NamedPattern { label: "save file named", regex: &SAVE_FILE_NAMED, verbatim: false },
    NamedPattern { label: "create file named", regex: &CREATE_FILE_NAMED, verbatim: false },
    NamedPattern { label: "any quoted", regex: &ANY_QUOTED, verbatim: false },
    NamedPattern { label: "base.ext token", regex: &BASE_DOT_EXT, verbatim: true },
    NamedPattern { label: "file named bare", regex: &FILE_NAMED, verbatim: false },
    NamedPattern { label: "named at end of sentence", regex: &NAMED_EOL, verbatim: false },
];

const CONTENT_TYPE_KEYWORDS: &[&str] = &[
    "essay", "story", "poem", "report", "summary", "letter", "script", "code", "recipe", "note", "document",
];

/// Extract a filename and content type from a natural-language request.
///
/// Patterns are tried in order (first match wins), per §4.2. If none match,
/// the content type is derived from a keyword scan and the filename is
/// synthesized as `<content_type>.txt`.
pub fn extract(request: &str) -> Extracted {
    // Rule 1: "named <X>", quoted or bare, tried before everything else.
    if let Some(raw) = capture_nonempty(&NAMED_QUOTED, request).or_else(|| capture_nonempty(&NAMED_BARE, request)) {
        return Extracted {
            filename: finalize_filename(&raw),
            content_type: detect_content_type(request),
        };
    }

    for pattern in PATTERNS {
        if let Some(raw) = capture_nonempty(pattern.regex, request) {
            let filename = if pattern.verbatim { raw } else { finalize_filename(&raw) };
            return Extracted {
                filename,
                content_type: detect_content_type(request),
            };
        }
    }

    let content_type = detect_content_type(request);
    Extracted {
        filename: format!("{content_type}.txt"),
        content_type,
    }
}

fn capture_nonempty(regex: &LazyLock<Regex>, request: &str) -> Option<String> {
    let caps = regex.captures(request)?;
    let raw = caps.get(1)?.as_str().trim();
    if raw.is_empty() { None } else { Some(raw.to_string()) }
}

fn detect_content_type(request: &str) -> String {
    let lower = request.to_lowercase();
    CONTENT_TYPE_KEYWORDS
        .iter()
        .find(|kw| lower.contains(*kw))
        .map(|kw| kw.to_string())
        .unwrap_or_else(|| "document".to_string())
}

/// Append `.txt` if the extracted name has no extension (post-processing, §4.2).
fn finalize_filename(raw: &str) -> String {
    let has_extension = raw.rsplit_once('.').is_some_and(|(_, ext)| {
        !ext.is_empty() && ext.len() <= 4 && ext.chars().all(|c| c.is_ascii_alphabetic())
    });
    if has_extension {
        raw.to_string()
    } else {
        format!("{raw}.txt")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_filename_after_save_as_with_quotes() {
        let e = extract(r#"Create a poem about autumn and save it as "autumn_poem.txt""#);
        assert_eq!(e.filename, "autumn_poem.txt");
    }

    #[test]
    fn extracts_filename_from_bare_extension_token() {
        let e = extract("Create a poem about autumn and save it as autumn_poem.txt");
        assert_eq!(e.filename, "autumn_poem.txt");
    }

    #[test]
    fn falls_back_to_content_type_dot_txt_when_nothing_matches() {
        let e = extract("Search for information about climate change and create a report");
        assert_eq!(e.content_type, "report");
        assert_eq!(e.filename, "report.txt");
    }

    #[test]
    fn extraction_is_idempotent_when_filename_is_re_embedded() {
        let first = extract(r#"Write a story and save it as "my_tale.txt""#);
        let reembedded = format!(r#"Write a story and save it as "{}""#, first.filename);
        let second = extract(&reembedded);
        assert_eq!(first.filename, second.filename);
    }

    #[test]
    fn detects_content_type_keyword_when_no_filename_present() {
        let e = extract("Write an essay about the French revolution");
        assert_eq!(e.content_type, "essay");
        assert_eq!(e.filename, "essay.txt");
    }
}
