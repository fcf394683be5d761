//! Text filters shared by the store views

/// Free-text query, trimmed and lowercased once
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query(String);

impl Query {
    pub fn new(text: &str) -> Self {
        Self(text.trim().to_lowercase())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Empty queries match everything
    pub fn matches(&self, haystack: &str) -> bool {
        self.is_empty() || haystack.to_lowercase().contains(&self.0)
    }

    /// True if any of `fields` matches
    pub fn matches_any<'a>(&self, fields: impl IntoIterator<Item = &'a str>) -> bool {
        self.is_empty() || fields.into_iter().any(|f| self.matches(f))
    }
}

impl From<&str> for Query {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

/// Case-insensitive name equality, used for category, tag and list lookups
pub fn same_name(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_matching() {
        let q = Query::new("  LEITE ");
        assert!(q.matches("Leite integral"));
        assert!(!q.matches("Café"));
        assert!(Query::default().matches("anything"));
        assert!(q.matches_any(["pão", "leite de coco"]));
    }

    #[test]
    fn test_same_name() {
        assert!(same_name("Laticínios", " laticínios"));
        assert!(same_name("AÇOUGUE", "açougue"));
        assert!(!same_name("Bebidas", "Bebida"));
    }
}
