//! Language code → display name lookup.
//!
//! The server reports detected languages as lowercase codes (`"en"`,
//! `"zh-cn"`, …). The UI shows a human-readable badge; codes the table does
//! not know pass through verbatim so a server upgrade never breaks the badge.

/// Languages offered by the speech server, in selector order.
pub const LANGUAGES: [(&str, &str); 11] = [
    ("en", "English"),
    ("fr", "French"),
    ("es", "Spanish"),
    ("de", "German"),
    ("it", "Italian"),
    ("pt", "Portuguese"),
    ("ru", "Russian"),
    ("zh-cn", "Chinese"),
    ("ja", "Japanese"),
    ("ar", "Arabic"),
    ("hi", "Hindi"),
];

/// Display name for a language code; unmapped codes are returned verbatim.
pub fn display_name(code: &str) -> &str {
    LANGUAGES
        .iter()
        .find(|(c, _)| *c == code)
        .map_or(code, |(_, name)| *name)
}

/// Whether `code` is one of the selector options.
pub fn is_selectable(code: &str) -> bool {
    LANGUAGES.iter().any(|(c, _)| *c == code)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_map_to_names() {
        assert_eq!(display_name("en"), "English");
        assert_eq!(display_name("zh-cn"), "Chinese");
        assert_eq!(display_name("hi"), "Hindi");
    }

    #[test]
    fn unmapped_code_passes_through_verbatim() {
        assert_eq!(display_name("xx"), "xx");
        assert_eq!(display_name(""), "");
    }

    #[test]
    fn selectable_matches_table() {
        assert!(is_selectable("ja"));
        assert!(!is_selectable("xx"));
    }
}
