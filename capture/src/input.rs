//! Parse results for captured text

use serde::{Deserialize, Serialize};

/// Flags describing where the text is being typed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseContext {
    /// Enables `R$` price extraction
    pub is_shopping_list: bool,
    /// Name of the list the user is currently looking at, if any
    pub current_list_name: Option<String>,
}

impl ParseContext {
    /// Context for the shopping list screen
    pub fn shopping() -> Self {
        Self {
            is_shopping_list: true,
            current_list_name: None,
        }
    }

    /// Context for a named list screen
    pub fn in_list(name: impl Into<String>) -> Self {
        Self {
            is_shopping_list: false,
            current_list_name: Some(name.into()),
        }
    }
}

/// Structured intent extracted from one line of text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedInput {
    /// Remaining text with every recognized token removed
    pub title: String,
    /// Target list from `@list`
    pub list_name: Option<String>,
    /// Target section from `@list:section` or a standalone `:section`
    pub section_name: Option<String>,
    /// Quantity with its unit, verbatim (`2L`, `1,5 kg`)
    pub quantity: Option<String>,
    /// Price from `R$` (shopping context only)
    pub price: Option<f64>,
    /// The input, untouched
    pub raw_text: String,
    /// Recognized tokens ordered by `start`
    pub highlights: Vec<Highlight>,
}

impl ParsedInput {
    /// Result for input that holds nothing but whitespace
    pub fn empty(raw: &str) -> Self {
        Self {
            title: String::new(),
            list_name: None,
            section_name: None,
            quantity: None,
            price: None,
            raw_text: raw.to_string(),
            highlights: Vec::new(),
        }
    }

    /// The list the text targets: an explicit `@list`, else the current list.
    pub fn target_list<'a>(&'a self, context: &'a ParseContext) -> Option<&'a str> {
        self.list_name
            .as_deref()
            .or(context.current_list_name.as_deref())
    }
}

/// A recognized token anchored in the raw text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Highlight {
    #[serde(rename = "type")]
    pub kind: HighlightKind,
    /// Byte offset of the first byte of the token
    pub start: usize,
    /// Byte offset one past the token
    pub end: usize,
    /// `raw_text[start..end]`
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightKind {
    List,
    Section,
    Price,
    Quantity,
}
