use serde::{Deserialize, Serialize};

/// Default prefixes that turn a message into a rename command
pub const DEFAULT_RENAME_PREFIXES: &[&str] = &["name:", ":thread:", "rename:"];

/// Default messages that close a thread when they are its latest message
pub const DEFAULT_CLOSE_KEYWORDS: &[&str] = &["close", ":lock:"];

/// Maximum number of characters kept from the root message for a default name
pub const DEFAULT_NAME_MAX_CHARS: usize = 30;

/// Appended to a default name that was truncated
pub const ELLIPSIS: &str = "...";

/// Name used when the root message has no usable text
pub const UNTITLED_NAME: &str = "(untitled)";

/// Naming and status rules shared by the parser and the registry.
///
/// Prefix and keyword matching is case-insensitive; the lists are stored as
/// configured and folded at comparison time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadRules {
    /// Checked in order, first match wins
    #[serde(default = "default_rename_prefixes")]
    pub rename_prefixes: Vec<String>,
    #[serde(default = "default_close_keywords")]
    pub close_keywords: Vec<String>,
}

fn default_rename_prefixes() -> Vec<String> {
    DEFAULT_RENAME_PREFIXES.iter().map(|s| s.to_string()).collect()
}

fn default_close_keywords() -> Vec<String> {
    DEFAULT_CLOSE_KEYWORDS.iter().map(|s| s.to_string()).collect()
}

impl Default for ThreadRules {
    fn default() -> Self {
        Self {
            rename_prefixes: default_rename_prefixes(),
            close_keywords: default_close_keywords(),
        }
    }
}

impl ThreadRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rename_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rename_prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_close_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.close_keywords = keywords.into_iter().map(Into::into).collect();
        self
    }
}
