//! Thread naming and command parsing.
//!
//! Everything here is pure: text in, derived value out. Missing text is the
//! caller's empty string and never an error.

use crate::rules::{ThreadRules, DEFAULT_NAME_MAX_CHARS, ELLIPSIS, UNTITLED_NAME};

/// Derive a display name from the root message of a thread.
///
/// The trimmed text is kept verbatim up to 30 characters, otherwise it is cut
/// to 30 characters and suffixed with `...`. Empty input gives an empty name.
pub fn derive_default_name(root_text: &str) -> String {
    let cleaned = root_text.trim();
    if cleaned.chars().count() <= DEFAULT_NAME_MAX_CHARS {
        return cleaned.to_string();
    }
    let mut name: String = cleaned.chars().take(DEFAULT_NAME_MAX_CHARS).collect();
    name.push_str(ELLIPSIS);
    name
}

/// Same as [`derive_default_name`] but never returns an empty name
pub fn default_name_or_fallback(root_text: &str) -> String {
    let name = derive_default_name(root_text);
    if name.is_empty() {
        UNTITLED_NAME.to_string()
    } else {
        name
    }
}

/// Extract the new name from a rename command such as `name: Release plan`.
///
/// Prefixes are tried in configured order and matched case-insensitively; the
/// returned name keeps its original casing. A prefix with nothing after it is
/// not a command.
pub fn extract_rename_command(text: &str, rules: &ThreadRules) -> Option<String> {
    let trimmed = text.trim();

    for prefix in &rules.rename_prefixes {
        if let Some(rest) = strip_prefix_ignore_case(trimmed, prefix) {
            let name = rest.trim();
            if name.is_empty() {
                return None;
            }
            return Some(name.to_string());
        }
    }

    None
}

/// True iff the whole message is one of the close keywords
pub fn is_close_signal(text: &str, rules: &ThreadRules) -> bool {
    let normalized = text.trim().to_lowercase();
    rules
        .close_keywords
        .iter()
        .any(|keyword| normalized == keyword.to_lowercase())
}

/// Find the most recent rename command in a chronologically ordered batch.
///
/// Older commands in the same batch are superseded by the newest one.
pub fn latest_rename<'a, I>(texts: I, rules: &ThreadRules) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
    I::IntoIter: DoubleEndedIterator,
{
    texts
        .into_iter()
        .rev()
        .find_map(|text| extract_rename_command(text, rules))
}

/// Strip `prefix` from the start of `text`, comparing characters case-insensitively.
///
/// Works on characters rather than byte offsets so lowercasing a non-ASCII
/// prefix can never split a character of `text`.
fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    if prefix.is_empty() {
        return None;
    }

    let mut text_chars = text.char_indices();
    for expected in prefix.chars() {
        let (_, actual) = text_chars.next()?;
        if !actual.to_lowercase().eq(expected.to_lowercase()) {
            return None;
        }
    }

    match text_chars.next() {
        Some((idx, _)) => Some(&text[idx..]),
        None => Some(""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> ThreadRules {
        ThreadRules::default()
    }

    #[test]
    fn test_default_name_short_text_verbatim() {
        assert_eq!(derive_default_name("short"), "short");
        assert_eq!(derive_default_name("  padded  "), "padded");
    }

    #[test]
    fn test_default_name_truncates_after_30_chars() {
        let long = "a".repeat(31);
        assert_eq!(derive_default_name(&long), format!("{}...", "a".repeat(30)));

        let exact = "b".repeat(30);
        assert_eq!(derive_default_name(&exact), exact);
    }

    #[test]
    fn test_default_name_counts_characters_not_bytes() {
        let text = "é".repeat(31);
        assert_eq!(derive_default_name(&text), format!("{}...", "é".repeat(30)));
    }

    #[test]
    fn test_default_name_empty() {
        assert_eq!(derive_default_name(""), "");
        assert_eq!(derive_default_name("   "), "");
        assert_eq!(default_name_or_fallback("   "), "(untitled)");
        assert_eq!(default_name_or_fallback("Deploy"), "Deploy");
    }

    #[test]
    fn test_extract_rename_command() {
        let rules = rules();
        assert_eq!(extract_rename_command("name: Foo", &rules), Some("Foo".to_string()));
        assert_eq!(extract_rename_command(":thread: Bar baz", &rules), Some("Bar baz".to_string()));
        assert_eq!(extract_rename_command("  rename:   Qux  ", &rules), Some("Qux".to_string()));
    }

    #[test]
    fn test_extract_rename_prefix_is_case_insensitive_name_keeps_case() {
        let rules = rules();
        assert_eq!(
            extract_rename_command("NAME: Release Plan", &rules),
            Some("Release Plan".to_string())
        );
        assert_eq!(
            extract_rename_command("ReNaMe:MixedCase", &rules),
            Some("MixedCase".to_string())
        );
    }

    #[test]
    fn test_extract_rename_empty_remainder_is_not_a_command() {
        let rules = rules();
        assert_eq!(extract_rename_command("name:", &rules), None);
        assert_eq!(extract_rename_command("name:    ", &rules), None);
    }

    #[test]
    fn test_extract_rename_requires_prefix_at_start() {
        let rules = rules();
        assert_eq!(extract_rename_command("hello", &rules), None);
        assert_eq!(extract_rename_command("my name: Foo", &rules), None);
        assert_eq!(extract_rename_command("", &rules), None);
    }

    #[test]
    fn test_extract_rename_first_matching_prefix_wins() {
        let rules = ThreadRules::new().with_rename_prefixes(["re:", "rename:"]);
        // "rename:" never gets a chance because "re:" is not a prefix of "rename:"
        assert_eq!(extract_rename_command("rename: X", &rules), Some("X".to_string()));

        let rules = ThreadRules::new().with_rename_prefixes(["t", "title:"]);
        assert_eq!(extract_rename_command("title: X", &rules), Some("itle: X".to_string()));
    }

    #[test]
    fn test_close_signal_exact_match_only() {
        let rules = rules();
        assert!(is_close_signal("close", &rules));
        assert!(is_close_signal("  CLOSE ", &rules));
        assert!(is_close_signal(":lock:", &rules));
        assert!(!is_close_signal("let's close this", &rules));
        assert!(!is_close_signal("closed", &rules));
        assert!(!is_close_signal("", &rules));
    }

    #[test]
    fn test_latest_rename_takes_most_recent_command() {
        let rules = rules();
        let texts = ["hello", "name: Foo", "rename: Bar"];
        assert_eq!(latest_rename(texts, &rules), Some("Bar".to_string()));

        let texts = ["name: Foo", "rename: Bar", "ok thanks"];
        assert_eq!(latest_rename(texts, &rules), Some("Bar".to_string()));

        let texts = ["hello", "world"];
        assert_eq!(latest_rename(texts, &rules), None);
    }

    #[test]
    fn test_latest_rename_skips_empty_commands() {
        let rules = rules();
        let texts = ["name: Foo", "name:"];
        assert_eq!(latest_rename(texts, &rules), Some("Foo".to_string()));
    }
}
