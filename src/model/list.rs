//! Named user lists and their entries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Identity;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserList {
    pub id: Identity,
    /// Unique, compared case-insensitively
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListItem {
    pub id: Identity,
    pub list_id: i64,
    pub title: String,
    pub kind: ItemKind,
    pub position: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What an entry is; each kind carries its own payload and completion flag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ItemKind {
    Note {
        #[serde(default)]
        body: String,
        #[serde(default)]
        archived: bool,
    },
    Shopping {
        quantity: Option<String>,
        price_minor: Option<i64>,
        #[serde(default)]
        purchased: bool,
    },
    Movie {
        year: Option<i32>,
        #[serde(default)]
        watched: bool,
    },
    Book {
        author: Option<String>,
        #[serde(default)]
        read: bool,
    },
    Game {
        platform: Option<String>,
        #[serde(default)]
        finished: bool,
    },
}

impl ItemKind {
    pub const LABELS: [&'static str; 5] = ["note", "shopping", "movie", "book", "game"];

    pub fn note() -> Self {
        ItemKind::Note {
            body: String::new(),
            archived: false,
        }
    }

    /// Blank payload for a kind label
    pub fn blank(label: &str) -> Option<Self> {
        match label {
            "note" => Some(Self::note()),
            "shopping" => Some(ItemKind::Shopping {
                quantity: None,
                price_minor: None,
                purchased: false,
            }),
            "movie" => Some(ItemKind::Movie {
                year: None,
                watched: false,
            }),
            "book" => Some(ItemKind::Book {
                author: None,
                read: false,
            }),
            "game" => Some(ItemKind::Game {
                platform: None,
                finished: false,
            }),
            _ => None,
        }
    }

    /// Discriminator stored in the `kind` column
    pub fn label(&self) -> &'static str {
        match self {
            ItemKind::Note { .. } => "note",
            ItemKind::Shopping { .. } => "shopping",
            ItemKind::Movie { .. } => "movie",
            ItemKind::Book { .. } => "book",
            ItemKind::Game { .. } => "game",
        }
    }

    pub fn is_complete(&self) -> bool {
        match self {
            ItemKind::Note { archived, .. } => *archived,
            ItemKind::Shopping { purchased, .. } => *purchased,
            ItemKind::Movie { watched, .. } => *watched,
            ItemKind::Book { read, .. } => *read,
            ItemKind::Game { finished, .. } => *finished,
        }
    }

    pub fn set_complete(&mut self, done: bool) {
        match self {
            ItemKind::Note { archived, .. } => *archived = done,
            ItemKind::Shopping { purchased, .. } => *purchased = done,
            ItemKind::Movie { watched, .. } => *watched = done,
            ItemKind::Book { read, .. } => *read = done,
            ItemKind::Game { finished, .. } => *finished = done,
        }
    }

    /// One-line detail shown next to the title
    pub fn summary(&self) -> Option<String> {
        match self {
            ItemKind::Note { body, .. } => body.lines().next().map(str::to_string),
            ItemKind::Shopping {
                quantity,
                price_minor,
                ..
            } => match (quantity, price_minor) {
                (Some(q), Some(p)) => Some(format!("{} · {}", q, format_minor(*p))),
                (Some(q), None) => Some(q.clone()),
                (None, Some(p)) => Some(format_minor(*p)),
                (None, None) => None,
            },
            ItemKind::Movie { year, .. } => year.map(|y| y.to_string()),
            ItemKind::Book { author, .. } => author.clone(),
            ItemKind::Game { platform, .. } => platform.clone(),
        }
    }

    /// Whether the kind's own text fields contain `needle` (already lowercase)
    pub fn mentions(&self, needle: &str) -> bool {
        let hay = match self {
            ItemKind::Note { body, .. } => Some(body.as_str()),
            ItemKind::Shopping { quantity, .. } => quantity.as_deref(),
            ItemKind::Movie { .. } => None,
            ItemKind::Book { author, .. } => author.as_deref(),
            ItemKind::Game { platform, .. } => platform.as_deref(),
        };
        hay.is_some_and(|h| h.to_lowercase().contains(needle))
    }
}

/// Input for creating a list entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewListItem {
    pub list_id: i64,
    pub title: String,
    pub kind: ItemKind,
}

/// `1234` minor units as `12,34`
pub fn format_minor(minor: i64) -> String {
    let sign = if minor < 0 { "-" } else { "" };
    let abs = minor.unsigned_abs();
    format!("{}{},{:02}", sign, abs / 100, abs % 100)
}
