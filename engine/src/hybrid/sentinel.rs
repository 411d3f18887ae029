//! Sentinel protocol (§6, §4.7): the literal markers delimiting a block that
//! must survive LLM processing byte-for-byte. Not generalized or reformatted
//! without versioning — these are part of the external contract.

pub const START: &str = "!!DETAILED_ANALYSIS_SECTION_START!!";
pub const END: &str = "!!DETAILED_ANALYSIS_SECTION_END!!";

const PRESERVED_HEADING: &str = "Detailed Analysis from Top Sources";

/// Extract the sentinel-delimited block (inclusive of the markers) and the
/// remaining content with that substring removed, to avoid sending it twice
/// through the LLM.
pub fn extract(content: &str) -> (Option<String>, String) {
    let Some(start_idx) = content.find(START) else {
        return (None, content.to_string());
    };
    let Some(end_rel) = content[start_idx..].find(END) else {
        return (None, content.to_string());
    };
    let end_idx = start_idx + end_rel + END.len();

    let block = content[start_idx..end_idx].to_string();
    let mut remainder = String::with_capacity(content.len() - block.len());
    remainder.push_str(&content[..start_idx]);
    remainder.push_str(&content[end_idx..]);

    (Some(block), remainder)
}

/// Splice `preserved_block` back into `draft`, before a `# Sources` section
/// if one exists, else appended. No-op if the draft already names the
/// preserved heading (the LLM may have reproduced it itself).
pub fn splice_preserved(draft: &str, preserved_block: &str) -> String {
    if draft.contains(PRESERVED_HEADING) {
        return draft.to_string();
    }

    match draft.find("\n# Sources") {
        Some(idx) => format!("{}\n\n{}\n{}", &draft[..idx], preserved_block, &draft[idx..]),
        None => format!("{draft}\n\n{preserved_block}\n"),
    }
}

/// Every `http(s)://` URL literally present in a string, in order of first appearance.
pub fn find_urls(text: &str) -> Vec<String> {
    let mut urls = Vec::new();
    for scheme in ["https://", "http://"] {
        let mut start = 0;
        while let Some(rel) = text[start..].find(scheme) {
            let begin = start + rel;
            let end = text[begin..]
                .find(|c: char| c.is_whitespace() || c == ')' || c == ']' || c == '"')
                .map(|o| begin + o)
                .unwrap_or(text.len());
            urls.push(text[begin..end].to_string());
            start = end;
        }
    }
    urls
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_preserved_block_and_removes_it_from_remainder() {
        let content = format!("before\n{START}\nALPHA\nBETA\n{END}\nafter");
        let (block, remainder) = extract(&content);
        let block = block.unwrap();
        assert!(block.contains("ALPHA\nBETA"));
        assert!(!remainder.contains("ALPHA"));
        assert!(remainder.contains("before"));
        assert!(remainder.contains("after"));
    }

    #[test]
    fn extract_is_none_when_sentinels_absent() {
        let (block, remainder) = extract("plain text, no markers");
        assert!(block.is_none());
        assert_eq!(remainder, "plain text, no markers");
    }

    #[test]
    fn splice_inserts_before_sources_heading() {
        let draft = "# Title\n\nbody\n\n# Sources\n- http://a.example\n";
        let spliced = splice_preserved(draft, "PRESERVED BLOCK");
        let sources_idx = spliced.find("# Sources").unwrap();
        let preserved_idx = spliced.find("PRESERVED BLOCK").unwrap();
        assert!(preserved_idx < sources_idx);
    }

    #[test]
    fn splice_is_noop_when_draft_already_has_the_heading() {
        let draft = "# Title\n\n## Detailed Analysis from Top Sources\nalready here\n";
        let spliced = splice_preserved(draft, "PRESERVED BLOCK");
        assert_eq!(spliced, draft);
    }

    #[test]
    fn find_urls_collects_in_order() {
        let text = "see https://a.example and also http://b.example/page)";
        let urls = find_urls(text);
        assert_eq!(urls, vec!["https://a.example", "http://b.example/page"]);
    }
}
