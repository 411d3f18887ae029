//! Domain ID generation: `{6-char-hex}-{type}-{slug}`, e.g. `019430-task-fetch-climate-news`.

/// Generate a domain ID from a type tag and a human title.
pub fn generate_id(domain_type: &str, title: &str) -> String {
    let uuid = uuid::Uuid::now_v7();
    let hex_prefix = &uuid.to_string()[..6];
    let slug = slugify(title);
    format!("{hex_prefix}-{domain_type}-{slug}")
}

/// Slugify a title for use in an ID: lowercase, apostrophes stripped,
/// everything else non-alphanumeric collapsed to single hyphens.
pub fn slugify(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .filter_map(|c| {
            if c.is_alphanumeric() {
                Some(c)
            } else if c == '\'' || c == '\u{2019}' || c == '\u{2018}' {
                None
            } else {
                Some('-')
            }
        })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
