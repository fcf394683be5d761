//! Shopping list, categories and items

use chrono::Utc;
use rusqlite::types::Type;
use rusqlite::{params, Row};

use crate::db::executor::invalid_text;
use crate::db::{Executor, FromRow};
use crate::error::{Error, Result};
use crate::model::{
    Category, CategoryRef, CreatedItem, Identity, ItemStatus, ListSettings, NewShoppingItem,
    PriceSource, Quantity, ShoppingItem, ShoppingList,
};
use crate::validation::{validate_currency, validate_name, ValidationError};

use super::{check_full_order, like_pattern};

/// Category used when an item names none
pub const DEFAULT_CATEGORY: &str = "Outros";

/// Categories seeded with the first list, in display order
pub const PREDEFINED_CATEGORIES: &[&str] = &[
    "Hortifruti",
    "Padaria",
    "Açougue",
    "Laticínios",
    "Mercearia",
    "Bebidas",
    "Congelados",
    "Limpeza",
    "Higiene",
    DEFAULT_CATEGORY,
];

const LIST_COLUMNS: &str = "id, currency_code, is_completed, completed_at, \
    hide_purchased_by_default, ask_price_on_purchase, created_at, updated_at";

const CATEGORY_COLUMNS: &str = "id, name, is_predefined, sort_order";

const ITEM_COLUMNS: &str = "id, list_id, category_id, name, quantity_num, unit, status, position, \
    unit_price_minor, total_price_minor, price_source, purchased_at, created_at, updated_at";

pub struct ShoppingRepository<'e, E> {
    exec: &'e E,
}

impl<'e, E: Executor> ShoppingRepository<'e, E> {
    pub fn new(exec: &'e E) -> Self {
        Self { exec }
    }

    // =========================================================================
    // List
    // =========================================================================

    /// The shopping list, creating it and the predefined categories on first read
    pub fn get_or_seed_list(&self, currency_code: &str) -> Result<ShoppingList> {
        validate_currency(currency_code)?;
        self.exec.transaction(|tx| {
            let repo = ShoppingRepository::new(tx);
            if let Some(list) = repo.first_list()? {
                return Ok(list);
            }

            let now = Utc::now();
            tx.run(
                "INSERT INTO lists (created_at, updated_at, currency_code) VALUES (?1, ?1, ?2)",
                params![now, currency_code],
            )?;
            let id = tx.last_insert_id();

            for (i, name) in PREDEFINED_CATEGORIES.iter().enumerate() {
                tx.run(
                    "INSERT OR IGNORE INTO categories (name, is_predefined, sort_order)
                     VALUES (?1, 1, ?2)",
                    params![name, i as i64 + 1],
                )?;
            }
            tracing::debug!(
                "Seeded list {} with {} categories",
                id,
                PREDEFINED_CATEGORIES.len()
            );

            repo.get_list(id)?.ok_or_else(|| Error::not_found("list", id))
        })
    }

    fn first_list(&self) -> Result<Option<ShoppingList>> {
        self.exec.get_first(
            &format!("SELECT {} FROM lists ORDER BY id LIMIT 1", LIST_COLUMNS),
            [],
        )
    }

    pub fn get_list(&self, id: i64) -> Result<Option<ShoppingList>> {
        self.exec.get_first(
            &format!("SELECT {} FROM lists WHERE id = ?1", LIST_COLUMNS),
            params![id],
        )
    }

    fn require_list(&self, id: i64) -> Result<ShoppingList> {
        self.get_list(id)?.ok_or_else(|| Error::not_found("list", id))
    }

    pub fn update_list_settings(&self, id: i64, settings: &ListSettings) -> Result<ShoppingList> {
        if let Some(code) = &settings.currency_code {
            validate_currency(code)?;
        }
        self.exec.transaction(|tx| {
            let repo = ShoppingRepository::new(tx);
            let mut list = repo.require_list(id)?;
            if let Some(code) = &settings.currency_code {
                list.currency_code = code.clone();
            }
            if let Some(hide) = settings.hide_purchased_by_default {
                list.hide_purchased_by_default = hide;
            }
            if let Some(ask) = settings.ask_price_on_purchase {
                list.ask_price_on_purchase = ask;
            }
            tx.run(
                "UPDATE lists SET currency_code = ?1, hide_purchased_by_default = ?2,
                     ask_price_on_purchase = ?3, updated_at = ?4
                 WHERE id = ?5",
                params![
                    list.currency_code,
                    list.hide_purchased_by_default,
                    list.ask_price_on_purchase,
                    Utc::now(),
                    id
                ],
            )?;
            repo.require_list(id)
        })
    }

    /// Mark the whole list done, or reopen it
    pub fn set_list_completed(&self, id: i64, completed: bool) -> Result<ShoppingList> {
        let now = Utc::now();
        let changed = self.exec.run(
            "UPDATE lists SET is_completed = ?1, completed_at = ?2, updated_at = ?3 WHERE id = ?4",
            params![completed, completed.then_some(now), now, id],
        )?;
        if changed == 0 {
            return Err(Error::not_found("list", id));
        }
        self.require_list(id)
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// All categories in display order
    pub fn get_categories(&self) -> Result<Vec<Category>> {
        self.exec.get_all(
            &format!(
                "SELECT {} FROM categories ORDER BY sort_order, name",
                CATEGORY_COLUMNS
            ),
            [],
        )
    }

    pub fn get_category(&self, id: i64) -> Result<Option<Category>> {
        self.exec.get_first(
            &format!("SELECT {} FROM categories WHERE id = ?1", CATEGORY_COLUMNS),
            params![id],
        )
    }

    /// Case-insensitive lookup
    pub fn find_category_by_name(&self, name: &str) -> Result<Option<Category>> {
        self.exec.get_first(
            &format!("SELECT {} FROM categories WHERE name = ?1", CATEGORY_COLUMNS),
            params![name.trim()],
        )
    }

    /// Existing category with this name, or a new one appended at the end.
    /// The flag is true when the category was created.
    pub fn find_or_create_category(&self, name: &str) -> Result<(Category, bool)> {
        validate_name(name)?;
        self.exec.transaction(|tx| {
            let repo = ShoppingRepository::new(tx);
            if let Some(category) = repo.find_category_by_name(name)? {
                return Ok((category, false));
            }

            tx.run(
                "INSERT INTO categories (name, is_predefined, sort_order)
                 VALUES (?1, 0, (SELECT COALESCE(MAX(sort_order), 0) + 1 FROM categories))",
                params![name.trim()],
            )?;
            let id = tx.last_insert_id();
            let category = repo
                .get_category(id)?
                .ok_or_else(|| Error::not_found("category", id))?;
            Ok((category, true))
        })
    }

    // =========================================================================
    // Items
    // =========================================================================

    /// Insert an item at the end of its pending bucket, resolving its category
    /// in the same transaction
    pub fn create_item(&self, new: &NewShoppingItem) -> Result<CreatedItem> {
        validate_name(&new.name)?;
        self.exec.transaction(|tx| {
            let repo = ShoppingRepository::new(tx);
            let (category, category_created) = match &new.category {
                CategoryRef::Existing(id) => (
                    repo.get_category(*id)?
                        .ok_or_else(|| Error::not_found("category", id))?,
                    false,
                ),
                CategoryRef::Named(name) => repo.find_or_create_category(name)?,
            };
            let category_id = category.id.require("category")?;
            let position = repo.next_position(category_id, ItemStatus::Pending)?;
            let now = Utc::now();

            tx.run(
                "INSERT INTO items (list_id, category_id, name, quantity_num, unit, status,
                     position, unit_price_minor, total_price_minor, price_source,
                     created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, 'pending', ?6, ?7, ?8, ?9, ?10, ?10)",
                params![
                    new.list_id,
                    category_id,
                    new.name.trim(),
                    new.quantity.value(),
                    new.unit,
                    position,
                    new.unit_price_minor,
                    new.total_price_minor,
                    new.price_source.map(|s| s.as_str()),
                    now
                ],
            )?;
            let id = tx.last_insert_id();
            let item = repo.require_item(id)?;

            Ok(CreatedItem {
                item,
                category,
                category_created,
            })
        })
    }

    /// Re-insert a deleted item under its original id. If another item took
    /// its position meanwhile it goes to the end of its bucket instead.
    pub fn restore_item(&self, item: &ShoppingItem) -> Result<ShoppingItem> {
        let id = item.id.require("item")?;
        let category_id = item.category_id.require("category")?;
        self.exec.transaction(|tx| {
            let repo = ShoppingRepository::new(tx);
            let position = if repo.position_taken(category_id, item.status, item.position)? {
                repo.next_position(category_id, item.status)?
            } else {
                item.position
            };
            tx.run(
                "INSERT INTO items (id, list_id, category_id, name, quantity_num, unit, status,
                     position, unit_price_minor, total_price_minor, price_source, purchased_at,
                     created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
                params![
                    id,
                    item.list_id,
                    category_id,
                    item.name,
                    item.quantity.value(),
                    item.unit,
                    item.status.as_str(),
                    position,
                    item.unit_price_minor,
                    item.total_price_minor,
                    item.price_source.map(|s| s.as_str()),
                    item.purchased_at,
                    item.created_at,
                    item.updated_at
                ],
            )?;
            repo.require_item(id)
        })
    }

    pub fn get_item_by_id(&self, id: i64) -> Result<Option<ShoppingItem>> {
        self.exec.get_first(
            &format!("SELECT {} FROM items WHERE id = ?1", ITEM_COLUMNS),
            params![id],
        )
    }

    fn require_item(&self, id: i64) -> Result<ShoppingItem> {
        self.get_item_by_id(id)?
            .ok_or_else(|| Error::not_found("item", id))
    }

    pub fn get_items_by_list_id(&self, list_id: i64) -> Result<Vec<ShoppingItem>> {
        self.exec.get_all(
            &format!(
                "SELECT {} FROM items WHERE list_id = ?1 ORDER BY category_id, status, position, id",
                ITEM_COLUMNS
            ),
            params![list_id],
        )
    }

    /// Items of a list whose name contains `query`
    pub fn search_items(&self, list_id: i64, query: &str) -> Result<Vec<ShoppingItem>> {
        self.exec.get_all(
            &format!(
                "SELECT {} FROM items WHERE list_id = ?1 AND name LIKE ?2 ESCAPE '\\'
                 ORDER BY status, position, id",
                ITEM_COLUMNS
            ),
            params![list_id, like_pattern(query)],
        )
    }

    /// Items grouped under their categories, in category order; empty
    /// categories are left out
    pub fn group_by_category(&self, list_id: i64) -> Result<Vec<(Category, Vec<ShoppingItem>)>> {
        let items = self.get_items_by_list_id(list_id)?;
        let groups = self
            .get_categories()?
            .into_iter()
            .filter_map(|category| {
                let members: Vec<ShoppingItem> = items
                    .iter()
                    .filter(|item| item.category_id == category.id)
                    .cloned()
                    .collect();
                (!members.is_empty()).then_some((category, members))
            })
            .collect();
        Ok(groups)
    }

    fn position_taken(&self, category_id: i64, status: ItemStatus, position: i64) -> Result<bool> {
        let count: Option<i64> = self.exec.get_first(
            "SELECT COUNT(*) FROM items WHERE category_id = ?1 AND status = ?2 AND position = ?3",
            params![category_id, status.as_str(), position],
        )?;
        Ok(count.unwrap_or(0) > 0)
    }

    /// Position after the last item in the `(category, status)` bucket
    pub fn next_position(&self, category_id: i64, status: ItemStatus) -> Result<i64> {
        let max: Option<Option<i64>> = self.exec.get_first(
            "SELECT MAX(position) FROM items WHERE category_id = ?1 AND status = ?2",
            params![category_id, status.as_str()],
        )?;
        Ok(max.flatten().unwrap_or(0) + 1)
    }

    /// Overwrite the editable fields of an item with `item`
    pub fn update_item(&self, item: &ShoppingItem) -> Result<ShoppingItem> {
        validate_name(&item.name)?;
        let id = item.id.require("item")?;
        let category_id = item.category_id.require("category")?;
        let changed = self.exec.run(
            "UPDATE items SET category_id = ?1, name = ?2, quantity_num = ?3, unit = ?4,
                 status = ?5, position = ?6, unit_price_minor = ?7, total_price_minor = ?8,
                 price_source = ?9, purchased_at = ?10, updated_at = ?11
             WHERE id = ?12",
            params![
                category_id,
                item.name.trim(),
                item.quantity.value(),
                item.unit,
                item.status.as_str(),
                item.position,
                item.unit_price_minor,
                item.total_price_minor,
                item.price_source.map(|s| s.as_str()),
                item.purchased_at,
                Utc::now(),
                id
            ],
        )?;
        if changed == 0 {
            return Err(Error::not_found("item", id));
        }
        self.require_item(id)
    }

    /// Move an item to `status`, appending it to the target bucket
    pub fn set_item_status(&self, id: i64, status: ItemStatus) -> Result<ShoppingItem> {
        self.exec.transaction(|tx| {
            let repo = ShoppingRepository::new(tx);
            let item = repo.require_item(id)?;
            if item.status == status {
                return Ok(item);
            }

            let category_id = item.category_id.require("category")?;
            let position = repo.next_position(category_id, status)?;
            let now = Utc::now();
            let purchased_at = (status == ItemStatus::Purchased).then_some(now);
            tx.run(
                "UPDATE items SET status = ?1, position = ?2, purchased_at = ?3, updated_at = ?4
                 WHERE id = ?5",
                params![status.as_str(), position, purchased_at, now, id],
            )?;
            repo.require_item(id)
        })
    }

    pub fn delete_item(&self, id: i64) -> Result<()> {
        let changed = self
            .exec
            .run("DELETE FROM items WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(Error::not_found("item", id));
        }
        Ok(())
    }

    /// Number the given items 1..n in the order given. `ids` must be every
    /// item of one `(category, status)` bucket, each exactly once.
    pub fn reorder_items(&self, ids: &[i64]) -> Result<()> {
        self.exec.transaction(|tx| {
            let repo = ShoppingRepository::new(tx);
            let mut bucket = None;
            for id in ids {
                let item = repo.require_item(*id)?;
                let key = (item.category_id.require("category")?, item.status);
                if bucket.is_some_and(|b| b != key) {
                    let reason = "items span more than one bucket";
                    return Err(ValidationError::InvalidOrder(reason).into());
                }
                bucket = Some(key);
            }
            if let Some((category_id, status)) = bucket {
                let size: Option<i64> = tx.get_first(
                    "SELECT COUNT(*) FROM items WHERE category_id = ?1 AND status = ?2",
                    params![category_id, status.as_str()],
                )?;
                check_full_order(ids, size.unwrap_or(0) as usize)?;
            }

            let now = Utc::now();
            for (i, id) in ids.iter().enumerate() {
                let changed = tx.run(
                    "UPDATE items SET position = ?1, updated_at = ?2 WHERE id = ?3",
                    params![i as i64 + 1, now, id],
                )?;
                if changed == 0 {
                    return Err(Error::not_found("item", id));
                }
            }
            Ok(())
        })
    }
}

// =============================================================================
// Row mapping
// =============================================================================

impl FromRow for ShoppingList {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            currency_code: row.get(1)?,
            is_completed: row.get(2)?,
            completed_at: row.get(3)?,
            hide_purchased_by_default: row.get(4)?,
            ask_price_on_purchase: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }
}

impl FromRow for Category {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Identity::Persisted(row.get(0)?),
            name: row.get(1)?,
            is_predefined: row.get(2)?,
            sort_order: row.get(3)?,
        })
    }
}

impl FromRow for ShoppingItem {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let quantity: f64 = row.get(4)?;
        let quantity = Quantity::new(quantity).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                4,
                Type::Real,
                format!("quantity must be positive, got {}", quantity).into(),
            )
        })?;

        let status: String = row.get(6)?;
        let status = ItemStatus::parse(&status).ok_or_else(|| invalid_text(6, &status))?;

        let price_source: Option<String> = row.get(10)?;
        let price_source = match price_source {
            Some(s) => Some(PriceSource::parse(&s).ok_or_else(|| invalid_text(10, &s))?),
            None => None,
        };

        Ok(Self {
            id: Identity::Persisted(row.get(0)?),
            list_id: row.get(1)?,
            category_id: Identity::Persisted(row.get(2)?),
            name: row.get(3)?,
            quantity,
            unit: row.get(5)?,
            status,
            position: row.get(7)?,
            unit_price_minor: row.get(8)?,
            total_price_minor: row.get(9)?,
            price_source,
            purchased_at: row.get(11)?,
            created_at: row.get(12)?,
            updated_at: row.get(13)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::validation::ValidationError;

    fn seeded(db: &Database) -> ShoppingList {
        db.with_conn(|conn| ShoppingRepository::new(conn).get_or_seed_list("BRL"))
            .unwrap()
    }

    fn add(db: &Database, list_id: i64, name: &str, category: &str) -> ShoppingItem {
        db.with_conn(|conn| {
            let new = NewShoppingItem::named(list_id, name, CategoryRef::Named(category.into()));
            ShoppingRepository::new(conn).create_item(&new)
        })
        .unwrap()
        .item
    }

    #[test]
    fn test_seed_on_first_read_only() {
        let db = Database::open_in_memory().unwrap();
        let first = seeded(&db);
        let again = seeded(&db);
        assert_eq!(first, again);
        assert_eq!(first.currency_code, "BRL");

        let categories = db
            .with_conn(|conn| ShoppingRepository::new(conn).get_categories())
            .unwrap();
        assert_eq!(categories.len(), PREDEFINED_CATEGORIES.len());
        assert_eq!(categories[0].name, "Hortifruti");
        assert!(categories.iter().all(|c| c.is_predefined));
    }

    #[test]
    fn test_create_item_finds_category_case_insensitively() {
        let db = Database::open_in_memory().unwrap();
        let list = seeded(&db);

        let created = db
            .with_conn(|conn| {
                let new =
                    NewShoppingItem::named(list.id, "Bananas", CategoryRef::Named("hortifruti".into()));
                ShoppingRepository::new(conn).create_item(&new)
            })
            .unwrap();
        assert!(!created.category_created);
        assert_eq!(created.category.name, "Hortifruti");
        assert_eq!(created.item.position, 1);
        assert_eq!(created.item.status, ItemStatus::Pending);
        assert!(created.item.purchased_at.is_none());
    }

    #[test]
    fn test_create_item_with_new_category() {
        let db = Database::open_in_memory().unwrap();
        let list = seeded(&db);

        let created = db
            .with_conn(|conn| {
                let new = NewShoppingItem::named(list.id, "Ração", CategoryRef::Named("Pet".into()));
                ShoppingRepository::new(conn).create_item(&new)
            })
            .unwrap();
        assert!(created.category_created);
        assert_eq!(created.category.sort_order, PREDEFINED_CATEGORIES.len() as i64 + 1);
        assert_eq!(created.item.category_id, created.category.id);
    }

    #[test]
    fn test_failed_create_leaves_no_category_behind() {
        let db = Database::open_in_memory().unwrap();
        seeded(&db);

        // Unknown list id trips the foreign key after the category insert
        let result = db.with_conn(|conn| {
            let new = NewShoppingItem::named(999, "Ghost", CategoryRef::Named("Phantom".into()));
            ShoppingRepository::new(conn).create_item(&new)
        });
        assert!(result.is_err());

        let found = db
            .with_conn(|conn| ShoppingRepository::new(conn).find_category_by_name("Phantom"))
            .unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn test_toggle_appends_to_target_bucket() {
        let db = Database::open_in_memory().unwrap();
        let list = seeded(&db);
        let a = add(&db, list.id, "Leite", "Laticínios");
        let b = add(&db, list.id, "Queijo", "Laticínios");
        let c = add(&db, list.id, "Iogurte", "Laticínios");

        let toggled = db
            .with_conn(|conn| {
                let repo = ShoppingRepository::new(conn);
                for item in [&a, &b] {
                    repo.set_item_status(item.id.require("item")?, ItemStatus::Purchased)?;
                }
                repo.set_item_status(c.id.require("item")?, ItemStatus::Purchased)
            })
            .unwrap();
        assert_eq!(toggled.position, 3);
        assert!(toggled.purchased_at.is_some());

        let back = db
            .with_conn(|conn| {
                ShoppingRepository::new(conn)
                    .set_item_status(c.id.require("item")?, ItemStatus::Pending)
            })
            .unwrap();
        assert_eq!(back.position, 1);
        assert!(back.purchased_at.is_none());
    }

    #[test]
    fn test_delete_then_restore_keeps_id() {
        let db = Database::open_in_memory().unwrap();
        let list = seeded(&db);
        let item = add(&db, list.id, "Café", "Mercearia");
        let id = item.id.require("item").unwrap();

        db.with_conn(|conn| ShoppingRepository::new(conn).delete_item(id))
            .unwrap();
        let missing = db.with_conn(|conn| ShoppingRepository::new(conn).delete_item(id));
        assert!(matches!(missing, Err(Error::NotFound { .. })));

        let restored = db
            .with_conn(|conn| ShoppingRepository::new(conn).restore_item(&item))
            .unwrap();
        assert_eq!(restored, item);
    }

    #[test]
    fn test_restore_into_taken_position_appends() {
        let db = Database::open_in_memory().unwrap();
        let list = seeded(&db);
        add(&db, list.id, "Arroz", "Mercearia");
        let beans = add(&db, list.id, "Feijão", "Mercearia");
        db.with_conn(|conn| ShoppingRepository::new(conn).delete_item(beans.id.require("item")?))
            .unwrap();
        let oil = add(&db, list.id, "Óleo", "Mercearia");
        assert_eq!(oil.position, beans.position);

        let restored = db
            .with_conn(|conn| ShoppingRepository::new(conn).restore_item(&beans))
            .unwrap();
        assert_eq!(restored.id, beans.id);
        assert_eq!(restored.position, 3);
    }

    #[test]
    fn test_reorder_needs_one_full_bucket() {
        let db = Database::open_in_memory().unwrap();
        let list = seeded(&db);
        let a = add(&db, list.id, "Pão", "Padaria");
        let b = add(&db, list.id, "Bolo", "Padaria");
        let c = add(&db, list.id, "Sabão", "Limpeza");
        let ids = |items: &[&ShoppingItem]| -> Vec<i64> {
            items.iter().map(|i| i.id.require("item").unwrap()).collect()
        };

        for bad in [ids(&[&b]), ids(&[&a, &c]), ids(&[&a, &a])] {
            let result = db.with_conn(|conn| ShoppingRepository::new(conn).reorder_items(&bad));
            assert!(matches!(
                result,
                Err(Error::Validation(ValidationError::InvalidOrder(_)))
            ));
        }

        let untouched = db
            .with_conn(|conn| ShoppingRepository::new(conn).get_item_by_id(b.id.require("item")?))
            .unwrap()
            .unwrap();
        assert_eq!(untouched.position, 2);
    }

    #[test]
    fn test_reorder_and_group() {
        let db = Database::open_in_memory().unwrap();
        let list = seeded(&db);
        let a = add(&db, list.id, "Pão", "Padaria");
        let b = add(&db, list.id, "Bolo", "Padaria");
        add(&db, list.id, "Sabão", "Limpeza");

        let groups = db
            .with_conn(|conn| {
                let repo = ShoppingRepository::new(conn);
                repo.reorder_items(&[b.id.require("item")?, a.id.require("item")?])?;
                repo.group_by_category(list.id)
            })
            .unwrap();

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0.name, "Padaria");
        let names: Vec<&str> = groups[0].1.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Bolo", "Pão"]);
        assert_eq!(groups[1].0.name, "Limpeza");
    }

    #[test]
    fn test_search_items() {
        let db = Database::open_in_memory().unwrap();
        let list = seeded(&db);
        add(&db, list.id, "Leite integral", "Laticínios");
        add(&db, list.id, "Leite de coco", "Mercearia");
        add(&db, list.id, "Arroz", "Mercearia");

        let found = db
            .with_conn(|conn| ShoppingRepository::new(conn).search_items(list.id, "leite"))
            .unwrap();
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_list_settings_and_completion() {
        let db = Database::open_in_memory().unwrap();
        let list = seeded(&db);

        let updated = db
            .with_conn(|conn| {
                ShoppingRepository::new(conn).update_list_settings(
                    list.id,
                    &ListSettings {
                        currency_code: Some("EUR".into()),
                        hide_purchased_by_default: Some(true),
                        ask_price_on_purchase: None,
                    },
                )
            })
            .unwrap();
        assert_eq!(updated.currency_code, "EUR");
        assert!(updated.hide_purchased_by_default);
        assert!(!updated.ask_price_on_purchase);

        let bad = db.with_conn(|conn| {
            ShoppingRepository::new(conn).update_list_settings(
                list.id,
                &ListSettings {
                    currency_code: Some("euro".into()),
                    ..Default::default()
                },
            )
        });
        assert!(matches!(
            bad,
            Err(Error::Validation(ValidationError::InvalidCurrency(_)))
        ));

        let done = db
            .with_conn(|conn| ShoppingRepository::new(conn).set_list_completed(list.id, true))
            .unwrap();
        assert!(done.is_completed);
        assert!(done.completed_at.is_some());
    }
}
