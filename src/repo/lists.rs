//! Named user lists and their typed entries

use chrono::Utc;
use rusqlite::types::Type;
use rusqlite::{params, Row};

use crate::db::{Executor, FromRow};
use crate::error::{Error, Result};
use crate::model::{Identity, ItemKind, ListItem, NewListItem, UserList};
use crate::validation::{validate_name, ValidationError};

use super::like_pattern;

const LIST_COLUMNS: &str = "id, name, created_at, updated_at";

const ENTRY_COLUMNS: &str = "id, list_id, title, payload, position, created_at, updated_at";

pub struct ListsRepository<'e, E> {
    exec: &'e E,
}

impl<'e, E: Executor> ListsRepository<'e, E> {
    pub fn new(exec: &'e E) -> Self {
        Self { exec }
    }

    // =========================================================================
    // Lists
    // =========================================================================

    pub fn create_list(&self, name: &str) -> Result<UserList> {
        validate_name(name)?;
        self.exec.transaction(|tx| {
            let repo = ListsRepository::new(tx);
            if repo.find_list_by_name(name)?.is_some() {
                return Err(duplicate(name));
            }
            tx.run(
                "INSERT INTO user_lists (name, created_at, updated_at) VALUES (?1, ?2, ?2)",
                params![name.trim(), Utc::now()],
            )?;
            repo.require_list(tx.last_insert_id())
        })
    }

    /// Re-insert a deleted list under its original id, with its entries
    pub fn restore_list(&self, list: &UserList, entries: &[ListItem]) -> Result<UserList> {
        let id = list.id.require("list")?;
        self.exec.transaction(|tx| {
            let repo = ListsRepository::new(tx);
            tx.run(
                "INSERT INTO user_lists (id, name, created_at, updated_at) VALUES (?1, ?2, ?3, ?4)",
                params![id, list.name, list.created_at, list.updated_at],
            )?;
            for entry in entries {
                repo.restore_item(entry)?;
            }
            repo.require_list(id)
        })
    }

    pub fn get_list_by_id(&self, id: i64) -> Result<Option<UserList>> {
        self.exec.get_first(
            &format!("SELECT {} FROM user_lists WHERE id = ?1", LIST_COLUMNS),
            params![id],
        )
    }

    fn require_list(&self, id: i64) -> Result<UserList> {
        self.get_list_by_id(id)?
            .ok_or_else(|| Error::not_found("list", id))
    }

    /// Case-insensitive lookup
    pub fn find_list_by_name(&self, name: &str) -> Result<Option<UserList>> {
        self.exec.get_first(
            &format!("SELECT {} FROM user_lists WHERE name = ?1", LIST_COLUMNS),
            params![name.trim()],
        )
    }

    pub fn get_all_lists(&self) -> Result<Vec<UserList>> {
        self.exec.get_all(
            &format!("SELECT {} FROM user_lists ORDER BY name, id", LIST_COLUMNS),
            [],
        )
    }

    pub fn search_lists(&self, query: &str) -> Result<Vec<UserList>> {
        self.exec.get_all(
            &format!(
                "SELECT {} FROM user_lists WHERE name LIKE ?1 ESCAPE '\\' ORDER BY name, id",
                LIST_COLUMNS
            ),
            params![like_pattern(query)],
        )
    }

    pub fn rename_list(&self, id: i64, name: &str) -> Result<UserList> {
        validate_name(name)?;
        self.exec.transaction(|tx| {
            let repo = ListsRepository::new(tx);
            if let Some(existing) = repo.find_list_by_name(name)? {
                if existing.id != Identity::Persisted(id) {
                    return Err(duplicate(name));
                }
            }
            let changed = tx.run(
                "UPDATE user_lists SET name = ?1, updated_at = ?2 WHERE id = ?3",
                params![name.trim(), Utc::now(), id],
            )?;
            if changed == 0 {
                return Err(Error::not_found("list", id));
            }
            repo.require_list(id)
        })
    }

    /// Delete a list, returning the entries that went with it
    pub fn delete_list(&self, id: i64) -> Result<Vec<ListItem>> {
        self.exec.transaction(|tx| {
            let repo = ListsRepository::new(tx);
            let entries = repo.get_items_by_list_id(id)?;
            let changed = tx.run("DELETE FROM user_lists WHERE id = ?1", params![id])?;
            if changed == 0 {
                return Err(Error::not_found("list", id));
            }
            Ok(entries)
        })
    }

    // =========================================================================
    // Entries
    // =========================================================================

    /// Append an entry to the end of its list
    pub fn create_item(&self, new: &NewListItem) -> Result<ListItem> {
        validate_name(&new.title)?;
        let payload = serde_json::to_string(&new.kind)?;
        self.exec.transaction(|tx| {
            let repo = ListsRepository::new(tx);
            let position = repo.next_position(new.list_id)?;
            tx.run(
                "INSERT INTO list_entries (list_id, title, kind, payload, position,
                     created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
                params![
                    new.list_id,
                    new.title.trim(),
                    new.kind.label(),
                    payload,
                    position,
                    Utc::now()
                ],
            )?;
            repo.require_item(tx.last_insert_id())
        })
    }

    pub fn restore_item(&self, item: &ListItem) -> Result<ListItem> {
        let id = item.id.require("entry")?;
        self.exec.run(
            "INSERT INTO list_entries (id, list_id, title, kind, payload, position,
                 created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                id,
                item.list_id,
                item.title,
                item.kind.label(),
                serde_json::to_string(&item.kind)?,
                item.position,
                item.created_at,
                item.updated_at
            ],
        )?;
        self.require_item(id)
    }

    pub fn get_item_by_id(&self, id: i64) -> Result<Option<ListItem>> {
        self.exec.get_first(
            &format!("SELECT {} FROM list_entries WHERE id = ?1", ENTRY_COLUMNS),
            params![id],
        )
    }

    fn require_item(&self, id: i64) -> Result<ListItem> {
        self.get_item_by_id(id)?
            .ok_or_else(|| Error::not_found("entry", id))
    }

    pub fn get_items_by_list_id(&self, list_id: i64) -> Result<Vec<ListItem>> {
        self.exec.get_all(
            &format!(
                "SELECT {} FROM list_entries WHERE list_id = ?1 ORDER BY position, id",
                ENTRY_COLUMNS
            ),
            params![list_id],
        )
    }

    /// Entries whose title contains `query`, across all lists or within one
    pub fn search_items(&self, list_id: Option<i64>, query: &str) -> Result<Vec<ListItem>> {
        self.exec.get_all(
            &format!(
                "SELECT {} FROM list_entries
                 WHERE (?1 IS NULL OR list_id = ?1) AND title LIKE ?2 ESCAPE '\\'
                 ORDER BY list_id, position, id",
                ENTRY_COLUMNS
            ),
            params![list_id, like_pattern(query)],
        )
    }

    /// Entries of a list grouped by kind, in `ItemKind::LABELS` order
    pub fn group_by_kind(&self, list_id: i64) -> Result<Vec<(&'static str, Vec<ListItem>)>> {
        let items = self.get_items_by_list_id(list_id)?;
        Ok(ItemKind::LABELS
            .iter()
            .filter_map(|label| {
                let members: Vec<ListItem> = items
                    .iter()
                    .filter(|item| item.kind.label() == *label)
                    .cloned()
                    .collect();
                (!members.is_empty()).then_some((*label, members))
            })
            .collect())
    }

    fn next_position(&self, list_id: i64) -> Result<i64> {
        let max: Option<Option<i64>> = self.exec.get_first(
            "SELECT MAX(position) FROM list_entries WHERE list_id = ?1",
            params![list_id],
        )?;
        Ok(max.flatten().unwrap_or(0) + 1)
    }

    /// Overwrite title, payload and position
    pub fn update_item(&self, item: &ListItem) -> Result<ListItem> {
        validate_name(&item.title)?;
        let id = item.id.require("entry")?;
        let changed = self.exec.run(
            "UPDATE list_entries SET title = ?1, kind = ?2, payload = ?3, position = ?4,
                 updated_at = ?5
             WHERE id = ?6",
            params![
                item.title.trim(),
                item.kind.label(),
                serde_json::to_string(&item.kind)?,
                item.position,
                Utc::now(),
                id
            ],
        )?;
        if changed == 0 {
            return Err(Error::not_found("entry", id));
        }
        self.require_item(id)
    }

    pub fn delete_item(&self, id: i64) -> Result<()> {
        let changed = self
            .exec
            .run("DELETE FROM list_entries WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(Error::not_found("entry", id));
        }
        Ok(())
    }

    pub fn reorder_items(&self, ids: &[i64]) -> Result<()> {
        self.exec.transaction(|tx| {
            let now = Utc::now();
            for (i, id) in ids.iter().enumerate() {
                let changed = tx.run(
                    "UPDATE list_entries SET position = ?1, updated_at = ?2 WHERE id = ?3",
                    params![i as i64 + 1, now, id],
                )?;
                if changed == 0 {
                    return Err(Error::not_found("entry", id));
                }
            }
            Ok(())
        })
    }
}

fn duplicate(name: &str) -> Error {
    ValidationError::InvalidName(name.trim().to_string(), "a list with this name already exists")
        .into()
}

// =============================================================================
// Row mapping
// =============================================================================

impl FromRow for UserList {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Identity::Persisted(row.get(0)?),
            name: row.get(1)?,
            created_at: row.get(2)?,
            updated_at: row.get(3)?,
        })
    }
}

impl FromRow for ListItem {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let payload: String = row.get(3)?;
        let kind: ItemKind = serde_json::from_str(&payload)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;
        Ok(Self {
            id: Identity::Persisted(row.get(0)?),
            list_id: row.get(1)?,
            title: row.get(2)?,
            kind,
            position: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }
}
