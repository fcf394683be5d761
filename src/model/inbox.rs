//! Inbox aggregate: captured inputs and their tags

use std::collections::BTreeSet;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::Identity;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInput {
    pub id: Identity,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub tags: Vec<Tag>,
}

impl UserInput {
    pub fn tag_names(&self) -> Vec<String> {
        self.tags.iter().map(|t| t.name.clone()).collect()
    }

    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.iter().any(|t| t.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: Identity,
    /// Lowercase, without the leading `#`
    pub name: String,
    /// Number of live inputs referencing this tag
    pub usage_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Input for creating or rewriting an inbox entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUserInput {
    pub text: String,
    /// Normalized, deduplicated tag names
    pub tags: Vec<String>,
}

impl NewUserInput {
    /// Build from raw text, taking tags from its `#hashtags`
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let tags = extract_tags(&text);
        Self { text, tags }
    }
}

/// Result of an inbox write: the input plus the tag table after the write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputWrite {
    pub input: UserInput,
    pub tags: Vec<Tag>,
}

fn hashtag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?:^|\s)#([\p{L}\p{N}_-]+)").expect("hashtag pattern is valid")
    })
}

/// Extract `#hashtags` as lowercase names; repeats collapse to one
pub fn extract_tags(text: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut tags = Vec::new();
    for caps in hashtag_pattern().captures_iter(text) {
        let name = caps[1].to_lowercase();
        if seen.insert(name.clone()) {
            tags.push(name);
        }
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_tags() {
        assert_eq!(
            extract_tags("#groceries buy milk #groceries"),
            vec!["groceries".to_string()]
        );
        assert_eq!(
            extract_tags("#Work call #feira-livre"),
            vec!["work".to_string(), "feira-livre".to_string()]
        );
    }

    #[test]
    fn test_hash_inside_word_is_not_a_tag() {
        assert!(extract_tags("issue#42 and C#").is_empty());
    }

    #[test]
    fn test_from_text_keeps_text() {
        let input = NewUserInput::from_text("#Casa trocar lâmpada");
        assert_eq!(input.text, "#Casa trocar lâmpada");
        assert_eq!(input.tags, vec!["casa".to_string()]);
    }
}
