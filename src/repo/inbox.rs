//! Inbox inputs and tags
//!
//! `tags.usage_count` always equals the number of `input_tags` rows pointing
//! at the tag. Every write that changes an input's tag set adjusts the counts
//! and rewrites the join rows inside one transaction.

use std::collections::HashMap;

use chrono::Utc;
use rusqlite::{params, Row};

use crate::db::{Executor, FromRow};
use crate::error::{Error, Result};
use crate::model::{Identity, InputWrite, NewUserInput, Tag, UserInput};
use crate::validation::{normalize_tag, validate_text};

use super::like_pattern;

const INPUT_COLUMNS: &str = "i.id, i.text, i.created_at, i.updated_at";

const TAG_COLUMNS: &str = "id, name, usage_count, created_at";

pub struct InboxRepository<'e, E> {
    exec: &'e E,
}

impl<'e, E: Executor> InboxRepository<'e, E> {
    pub fn new(exec: &'e E) -> Self {
        Self { exec }
    }

    // =========================================================================
    // Inputs
    // =========================================================================

    pub fn create_input(&self, new: &NewUserInput) -> Result<InputWrite> {
        validate_text(&new.text)?;
        let tags = normalize_all(&new.tags)?;
        self.exec.transaction(|tx| {
            let repo = InboxRepository::new(tx);
            tx.run(
                "INSERT INTO user_inputs (text, created_at, updated_at) VALUES (?1, ?2, ?2)",
                params![new.text, Utc::now()],
            )?;
            let id = tx.last_insert_id();
            repo.retag(id, &[], &tags)?;
            repo.write_result(id)
        })
    }

    /// Re-insert a deleted input under its original id, with its tags
    pub fn restore_input(&self, input: &UserInput) -> Result<InputWrite> {
        let id = input.id.require("input")?;
        let tags = normalize_all(&input.tag_names())?;
        self.exec.transaction(|tx| {
            let repo = InboxRepository::new(tx);
            tx.run(
                "INSERT INTO user_inputs (id, text, created_at, updated_at) VALUES (?1, ?2, ?3, ?4)",
                params![id, input.text, input.created_at, input.updated_at],
            )?;
            repo.retag(id, &[], &tags)?;
            repo.write_result(id)
        })
    }

    pub fn get_input_by_id(&self, id: i64) -> Result<Option<UserInput>> {
        let input: Option<UserInput> = self.exec.get_first(
            &format!("SELECT {} FROM user_inputs i WHERE i.id = ?1", INPUT_COLUMNS),
            params![id],
        )?;
        match input {
            Some(mut input) => {
                input.tags = self.tags_for(id)?;
                Ok(Some(input))
            }
            None => Ok(None),
        }
    }

    /// Every input, newest first
    pub fn get_all_inputs(&self) -> Result<Vec<UserInput>> {
        let inputs = self.exec.get_all(
            &format!(
                "SELECT {} FROM user_inputs i ORDER BY i.created_at DESC, i.id DESC",
                INPUT_COLUMNS
            ),
            [],
        )?;
        self.attach_tags(inputs)
    }

    pub fn get_inputs_by_tag_id(&self, tag_id: i64) -> Result<Vec<UserInput>> {
        let inputs = self.exec.get_all(
            &format!(
                "SELECT {} FROM user_inputs i
                 JOIN input_tags it ON it.input_id = i.id
                 WHERE it.tag_id = ?1
                 ORDER BY i.created_at DESC, i.id DESC",
                INPUT_COLUMNS
            ),
            params![tag_id],
        )?;
        self.attach_tags(inputs)
    }

    pub fn search_inputs(&self, query: &str) -> Result<Vec<UserInput>> {
        let inputs = self.exec.get_all(
            &format!(
                "SELECT {} FROM user_inputs i WHERE i.text LIKE ?1 ESCAPE '\\'
                 ORDER BY i.created_at DESC, i.id DESC",
                INPUT_COLUMNS
            ),
            params![like_pattern(query)],
        )?;
        self.attach_tags(inputs)
    }

    /// Inputs under each tag, most used tags first. Untagged inputs are not
    /// part of any group.
    pub fn group_by_tag(&self) -> Result<Vec<(Tag, Vec<UserInput>)>> {
        let inputs = self.get_all_inputs()?;
        let groups = self
            .get_all_tags()?
            .into_iter()
            .filter_map(|tag| {
                let members: Vec<UserInput> = inputs
                    .iter()
                    .filter(|input| input.has_tag(&tag.name))
                    .cloned()
                    .collect();
                (!members.is_empty()).then_some((tag, members))
            })
            .collect();
        Ok(groups)
    }

    /// Rewrite an input's text and tag set
    pub fn update_input(&self, id: i64, new: &NewUserInput) -> Result<InputWrite> {
        validate_text(&new.text)?;
        let tags = normalize_all(&new.tags)?;
        self.exec.transaction(|tx| {
            let repo = InboxRepository::new(tx);
            let changed = tx.run(
                "UPDATE user_inputs SET text = ?1, updated_at = ?2 WHERE id = ?3",
                params![new.text, Utc::now(), id],
            )?;
            if changed == 0 {
                return Err(Error::not_found("input", id));
            }
            let old = repo.tag_names_for(id)?;
            repo.retag(id, &old, &tags)?;
            repo.write_result(id)
        })
    }

    /// Delete an input, returning the tag table afterwards
    pub fn delete_input(&self, id: i64) -> Result<Vec<Tag>> {
        self.exec.transaction(|tx| {
            let repo = InboxRepository::new(tx);
            let old = repo.tag_names_for(id)?;
            repo.retag(id, &old, &[])?;
            let changed = tx.run("DELETE FROM user_inputs WHERE id = ?1", params![id])?;
            if changed == 0 {
                return Err(Error::not_found("input", id));
            }
            repo.get_all_tags()
        })
    }

    // =========================================================================
    // Tags
    // =========================================================================

    /// All tags, most used first
    pub fn get_all_tags(&self) -> Result<Vec<Tag>> {
        self.exec.get_all(
            &format!(
                "SELECT {} FROM tags ORDER BY usage_count DESC, name",
                TAG_COLUMNS
            ),
            [],
        )
    }

    pub fn get_tag_by_name(&self, name: &str) -> Result<Option<Tag>> {
        let name = normalize_tag(name)?;
        self.exec.get_first(
            &format!("SELECT {} FROM tags WHERE name = ?1", TAG_COLUMNS),
            params![name],
        )
    }

    fn tags_for(&self, input_id: i64) -> Result<Vec<Tag>> {
        self.exec.get_all(
            "SELECT t.id, t.name, t.usage_count, t.created_at FROM tags t
             JOIN input_tags it ON it.tag_id = t.id
             WHERE it.input_id = ?1
             ORDER BY t.name",
            params![input_id],
        )
    }

    fn tag_names_for(&self, input_id: i64) -> Result<Vec<String>> {
        Ok(self
            .tags_for(input_id)?
            .into_iter()
            .map(|t| t.name)
            .collect())
    }

    fn attach_tags(&self, mut inputs: Vec<UserInput>) -> Result<Vec<UserInput>> {
        if inputs.is_empty() {
            return Ok(inputs);
        }

        let links: Vec<TagLink> = self.exec.get_all(
            "SELECT it.input_id, t.id, t.name, t.usage_count, t.created_at FROM input_tags it
             JOIN tags t ON t.id = it.tag_id
             ORDER BY t.name",
            [],
        )?;
        let mut by_input: HashMap<i64, Vec<Tag>> = HashMap::new();
        for link in links {
            by_input.entry(link.input_id).or_default().push(link.tag);
        }

        for input in &mut inputs {
            if let Identity::Persisted(id) = input.id {
                input.tags = by_input.remove(&id).unwrap_or_default();
            }
        }
        Ok(inputs)
    }

    /// Move an input from tag set `old` to `new`. Must run inside a transaction.
    fn retag(&self, input_id: i64, old: &[String], new: &[String]) -> Result<()> {
        let now = Utc::now();
        for name in old.iter().filter(|name| !new.contains(name)) {
            self.exec.run(
                "UPDATE tags SET usage_count = usage_count - 1 WHERE name = ?1",
                params![name],
            )?;
        }
        for name in new.iter().filter(|name| !old.contains(name)) {
            self.exec.run(
                "INSERT INTO tags (name, usage_count, created_at) VALUES (?1, 1, ?2)
                 ON CONFLICT(name) DO UPDATE SET usage_count = usage_count + 1",
                params![name, now],
            )?;
        }

        self.exec.run(
            "DELETE FROM input_tags WHERE input_id = ?1",
            params![input_id],
        )?;
        for name in new {
            self.exec.run(
                "INSERT INTO input_tags (input_id, tag_id) SELECT ?1, id FROM tags WHERE name = ?2",
                params![input_id, name],
            )?;
        }
        Ok(())
    }

    fn write_result(&self, input_id: i64) -> Result<InputWrite> {
        let input = self
            .get_input_by_id(input_id)?
            .ok_or_else(|| Error::not_found("input", input_id))?;
        Ok(InputWrite {
            input,
            tags: self.get_all_tags()?,
        })
    }
}

/// Normalize and dedupe tag names, keeping first-seen order
fn normalize_all(raw: &[String]) -> Result<Vec<String>> {
    let mut names: Vec<String> = Vec::with_capacity(raw.len());
    for tag in raw {
        let name = normalize_tag(tag)?;
        if !names.contains(&name) {
            names.push(name);
        }
    }
    Ok(names)
}

// =============================================================================
// Row mapping
// =============================================================================

impl FromRow for UserInput {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Identity::Persisted(row.get(0)?),
            text: row.get(1)?,
            created_at: row.get(2)?,
            updated_at: row.get(3)?,
            tags: Vec::new(),
        })
    }
}

impl FromRow for Tag {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Identity::Persisted(row.get(0)?),
            name: row.get(1)?,
            usage_count: row.get(2)?,
            created_at: row.get(3)?,
        })
    }
}

struct TagLink {
    input_id: i64,
    tag: Tag,
}

impl FromRow for TagLink {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            input_id: row.get(0)?,
            tag: Tag {
                id: Identity::Persisted(row.get(1)?),
                name: row.get(2)?,
                usage_count: row.get(3)?,
                created_at: row.get(4)?,
            },
        })
    }
}
