//! Shopping list store

use std::sync::Arc;

use capture::ParsedInput;
use chrono::Utc;
use tokio::sync::watch;

use crate::error::{Error, Result};
use crate::model::{
    Category, CategoryRef, CreatedItem, Identity, ItemStatus, ListSettings, NewShoppingItem,
    Quantity, ShoppingItem, ShoppingList,
};
use crate::ports::ShoppingPort;
use crate::repo::{check_full_order, DEFAULT_CATEGORY};
use crate::validation::{validate_currency, validate_name, validate_price, ValidationError};

use super::filter::{same_name, Query};
use super::optimistic::{Base, OptimisticStore, Projection, Record, StoreState};
use super::pricing::{self, PriceEdit};

impl Record for ShoppingItem {
    fn identity(&self) -> Identity {
        self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShoppingContext {
    pub list: Option<ShoppingList>,
    pub categories: Vec<Category>,
    /// Text in the capture box; a create clears it and its rollback restores it
    pub draft: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShoppingFilter {
    pub query: Query,
    pub hide_purchased: bool,
}

/// Visible items of one category, split by status and sorted by position
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryGroup {
    pub category: Category,
    pub pending: Vec<ShoppingItem>,
    pub purchased: Vec<ShoppingItem>,
}

impl CategoryGroup {
    fn new<'a>(category: Category, items: impl Iterator<Item = &'a ShoppingItem>) -> Self {
        let (mut purchased, mut pending): (Vec<ShoppingItem>, Vec<ShoppingItem>) =
            items.cloned().partition(ShoppingItem::is_purchased);
        for bucket in [&mut pending, &mut purchased] {
            bucket.sort_by(|a, b| {
                a.position
                    .cmp(&b.position)
                    .then_with(|| a.created_at.cmp(&b.created_at))
            });
        }
        Self {
            category,
            pending,
            purchased,
        }
    }

    pub fn len(&self) -> usize {
        self.pending.len() + self.purchased.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Counts and money over every item, regardless of the filter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShoppingSummary {
    pub item_count: usize,
    pub pending_count: usize,
    pub purchased_count: usize,
    pub pending_total_minor: i64,
    pub purchased_total_minor: i64,
    pub total_minor: i64,
}

impl ShoppingSummary {
    fn of(items: &[ShoppingItem]) -> Self {
        let mut summary = Self {
            item_count: items.len(),
            ..Self::default()
        };
        for item in items {
            let amount = item.line_total_minor().unwrap_or(0);
            if item.is_purchased() {
                summary.purchased_count += 1;
                summary.purchased_total_minor =
                    summary.purchased_total_minor.saturating_add(amount);
            } else {
                summary.pending_count += 1;
                summary.pending_total_minor = summary.pending_total_minor.saturating_add(amount);
            }
        }
        summary.total_minor = summary
            .pending_total_minor
            .saturating_add(summary.purchased_total_minor);
        summary
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShoppingView {
    /// Non-empty groups in category order
    pub groups: Vec<CategoryGroup>,
    pub visible_count: usize,
    pub summary: ShoppingSummary,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShoppingProjection;

impl Projection for ShoppingProjection {
    const ENTITY: &'static str = "item";

    type Record = ShoppingItem;
    type Context = ShoppingContext;
    type Filter = ShoppingFilter;
    type View = ShoppingView;

    fn project(base: &Base<Self>, filter: &ShoppingFilter) -> ShoppingView {
        let visible: Vec<&ShoppingItem> = base
            .records
            .iter()
            .filter(|item| filter.query.matches(&item.name))
            .filter(|item| !(filter.hide_purchased && item.is_purchased()))
            .collect();

        let mut categories: Vec<&Category> = base.context.categories.iter().collect();
        categories.sort_by(|a, b| {
            a.sort_order
                .cmp(&b.sort_order)
                .then_with(|| a.name.cmp(&b.name))
        });

        let mut groups: Vec<CategoryGroup> = categories
            .into_iter()
            .map(|category| {
                let members = visible
                    .iter()
                    .copied()
                    .filter(|item| item.category_id == category.id);
                CategoryGroup::new(category.clone(), members)
            })
            .filter(|group| !group.is_empty())
            .collect();

        // Items whose category is not in context still show up, last
        let mut orphan_ids: Vec<Identity> = Vec::new();
        for item in &visible {
            let known = base
                .context
                .categories
                .iter()
                .any(|c| c.id == item.category_id);
            if !known && !orphan_ids.contains(&item.category_id) {
                orphan_ids.push(item.category_id);
            }
        }
        for id in orphan_ids {
            let placeholder = Category {
                id,
                name: String::new(),
                is_predefined: false,
                sort_order: i64::MAX,
            };
            let members = visible.iter().copied().filter(|item| item.category_id == id);
            groups.push(CategoryGroup::new(placeholder, members));
        }

        ShoppingView {
            visible_count: visible.len(),
            groups,
            summary: ShoppingSummary::of(&base.records),
        }
    }
}

/// A shopping item as typed, before it has a place in the list
#[derive(Debug, Clone, PartialEq)]
pub struct ItemDraft {
    pub name: String,
    pub quantity: Quantity,
    pub unit: Option<String>,
    /// Category name; the default category when absent
    pub category: Option<String>,
    pub price: Option<PriceEdit>,
}

impl ItemDraft {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quantity: Quantity::ONE,
            unit: None,
            category: None,
            price: None,
        }
    }

    /// Draft from a parsed line; a captured price is taken as the unit price
    pub fn from_parsed(parsed: &ParsedInput) -> Result<Self> {
        let captured = match parsed.quantity.as_deref() {
            Some(text) => Quantity::split_capture(text)?,
            None => None,
        };
        let (quantity, unit) = match captured {
            Some((quantity, unit)) => (quantity, Some(unit)),
            None => (Quantity::ONE, None),
        };
        let price = match parsed.price {
            Some(amount) => Some(PriceEdit::unit(validate_price(amount)?)),
            None => None,
        };
        Ok(Self {
            name: parsed.title.clone(),
            quantity,
            unit,
            category: parsed.section_name.clone(),
            price,
        })
    }
}

/// Fields to change on an item; `None` leaves a field alone
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub quantity: Option<Quantity>,
    pub unit: Option<Option<String>>,
    pub category_id: Option<Identity>,
    /// `Some(None)` clears both prices
    pub price: Option<Option<PriceEdit>>,
}

/// Append position for the `(category, status)` bucket, ignoring `except`
fn next_position(
    records: &[ShoppingItem],
    category_id: Identity,
    status: ItemStatus,
    except: Identity,
) -> i64 {
    records
        .iter()
        .filter(|r| r.id != except && r.category_id == category_id && r.status == status)
        .map(|r| r.position)
        .max()
        .unwrap_or(0)
        + 1
}

/// Category for a new item, adding a pending one when the name is new
fn resolve_category(context: &mut ShoppingContext, name: Option<&str>) -> (Identity, CategoryRef) {
    let name = name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(DEFAULT_CATEGORY);

    if let Some(category) = context.categories.iter().find(|c| same_name(&c.name, name)) {
        let reference = match category.id {
            Identity::Persisted(id) => CategoryRef::Existing(id),
            Identity::Pending(_) => CategoryRef::Named(category.name.clone()),
        };
        return (category.id, reference);
    }

    let category = Category {
        id: Identity::pending(),
        name: name.to_string(),
        is_predefined: false,
        sort_order: context
            .categories
            .iter()
            .map(|c| c.sort_order)
            .max()
            .unwrap_or(0)
            + 1,
    };
    let id = category.id;
    context.categories.push(category);
    (id, CategoryRef::Named(name.to_string()))
}

/// Swap a pending category for its saved row and repoint items at it
fn adopt_category(base: &mut Base<ShoppingProjection>, saved: &Category) {
    let previous = base
        .context
        .categories
        .iter()
        .position(|c| c.id == saved.id || same_name(&c.name, &saved.name));
    match previous {
        Some(index) => {
            let old_id = base.context.categories[index].id;
            base.context.categories[index] = saved.clone();
            if old_id != saved.id {
                for item in base.records.iter_mut().filter(|i| i.category_id == old_id) {
                    item.category_id = saved.id;
                }
            }
        }
        None => base.context.categories.push(saved.clone()),
    }
}

fn not_loaded() -> Error {
    Error::Other("shopping list is not loaded".into())
}

pub struct ShoppingStore<S> {
    store: OptimisticStore<ShoppingProjection>,
    port: Arc<S>,
    currency_code: String,
}

impl<S: ShoppingPort> ShoppingStore<S> {
    /// `currency_code` is used if the list has to be seeded
    pub fn new(port: Arc<S>, currency_code: impl Into<String>) -> Self {
        Self {
            store: OptimisticStore::default(),
            port,
            currency_code: currency_code.into(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<StoreState<ShoppingProjection>> {
        self.store.subscribe()
    }

    pub fn snapshot(&self) -> StoreState<ShoppingProjection> {
        self.store.snapshot()
    }

    pub fn list(&self) -> Option<ShoppingList> {
        self.store.read(|s| s.context().list.clone())
    }

    fn list_id(&self) -> Result<i64> {
        self.store
            .read(|s| s.context().list.as_ref().map(|l| l.id))
            .ok_or_else(not_loaded)
    }

    pub async fn load(&self) -> Result<()> {
        let port = Arc::clone(&self.port);
        let currency = self.currency_code.clone();
        let draft = self.store.read(|s| s.context().draft.clone());
        self.store
            .load(async move {
                let snapshot = port.load(currency).await?;
                let context = ShoppingContext {
                    list: Some(snapshot.list),
                    categories: snapshot.categories,
                    draft,
                };
                Ok((snapshot.items, context))
            })
            .await?;

        let hide = self.store.read(|s| {
            s.context()
                .list
                .as_ref()
                .is_some_and(|l| l.hide_purchased_by_default)
        });
        self.store.update_filter(|f| f.hide_purchased = hide);
        Ok(())
    }

    // =========================================================================
    // View state
    // =========================================================================

    pub fn set_query(&self, query: &str) {
        let query = Query::new(query);
        self.store.update_filter(|f| f.query = query);
    }

    pub fn set_hide_purchased(&self, hide: bool) {
        self.store.update_filter(|f| f.hide_purchased = hide);
    }

    pub fn set_draft(&self, text: &str) {
        let text = text.to_string();
        self.store.update_context(|c| c.draft = text);
    }

    // =========================================================================
    // Writes
    // =========================================================================

    pub async fn add_item(&self, draft: ItemDraft) -> Result<ShoppingItem> {
        validate_name(&draft.name)?;
        if let Some(category) = &draft.category {
            if !category.trim().is_empty() {
                validate_name(category)?;
            }
        }
        let list_id = self.list_id()?;
        let placeholder = Identity::pending();
        let now = Utc::now();
        let port = Arc::clone(&self.port);

        let created = self
            .store
            .mutate(
                |base| {
                    let (category_id, category) =
                        resolve_category(&mut base.context, draft.category.as_deref());
                    let position =
                        next_position(&base.records, category_id, ItemStatus::Pending, placeholder);
                    let mut item = ShoppingItem {
                        id: placeholder,
                        list_id,
                        category_id,
                        name: draft.name.trim().to_string(),
                        quantity: draft.quantity,
                        unit: draft.unit.clone(),
                        status: ItemStatus::Pending,
                        position,
                        unit_price_minor: None,
                        total_price_minor: None,
                        price_source: None,
                        purchased_at: None,
                        created_at: now,
                        updated_at: now,
                    };
                    if let Some(edit) = draft.price {
                        pricing::apply_price(&mut item, edit);
                    }

                    let new = NewShoppingItem {
                        list_id,
                        name: item.name.clone(),
                        quantity: item.quantity,
                        unit: item.unit.clone(),
                        category,
                        unit_price_minor: item.unit_price_minor,
                        total_price_minor: item.total_price_minor,
                        price_source: item.price_source,
                    };
                    base.records.push(item);
                    base.context.draft.clear();
                    Ok(new)
                },
                move |new| async move { port.create_item(new).await },
                |base, created: &CreatedItem| {
                    adopt_category(base, &created.category);
                    base.upsert(placeholder, created.item.clone());
                },
            )
            .await?;
        Ok(created.item)
    }

    pub async fn update_item(&self, id: Identity, patch: ItemPatch) -> Result<ShoppingItem> {
        if let Some(name) = &patch.name {
            validate_name(name)?;
        }
        let port = Arc::clone(&self.port);
        let now = Utc::now();

        self.store
            .mutate(
                |base| {
                    let current = base.get(id)?.clone();
                    let mut item = current.clone();
                    if let Some(name) = &patch.name {
                        item.name = name.trim().to_string();
                    }
                    if let Some(unit) = &patch.unit {
                        item.unit = unit.clone();
                    }
                    if let Some(category_id) = patch.category_id {
                        if category_id != current.category_id {
                            if !base.context.categories.iter().any(|c| c.id == category_id) {
                                return Err(Error::not_found("category", category_id));
                            }
                            item.category_id = category_id;
                            item.position =
                                next_position(&base.records, category_id, item.status, id);
                        }
                    }
                    if let Some(quantity) = patch.quantity {
                        item.quantity = quantity;
                        pricing::recompute(&mut item);
                    }
                    match patch.price {
                        Some(Some(edit)) => pricing::apply_price(&mut item, edit),
                        Some(None) => pricing::clear_price(&mut item),
                        None => {}
                    }
                    item.updated_at = now;
                    base.upsert(id, item.clone());
                    Ok(item)
                },
                move |item| async move { port.update_item(item).await },
                |base, saved: &ShoppingItem| base.upsert(id, saved.clone()),
            )
            .await
    }

    /// Flip pending/purchased, moving the item to the end of its new bucket
    pub async fn toggle_item(&self, id: Identity) -> Result<ShoppingItem> {
        let port = Arc::clone(&self.port);
        let now = Utc::now();

        self.store
            .mutate(
                |base| {
                    let row_id = id.require("item")?;
                    let mut item = base.get(id)?.clone();
                    item.status = item.status.toggled();
                    item.position = next_position(&base.records, item.category_id, item.status, id);
                    item.purchased_at = item.is_purchased().then_some(now);
                    item.updated_at = now;
                    let status = item.status;
                    base.upsert(id, item);
                    Ok((row_id, status))
                },
                move |(row_id, status)| async move { port.set_item_status(row_id, status).await },
                |base, saved: &ShoppingItem| base.upsert(id, saved.clone()),
            )
            .await
    }

    pub async fn delete_item(&self, id: Identity) -> Result<()> {
        let port = Arc::clone(&self.port);
        self.store
            .delete(
                id,
                move |item| async move { port.delete_item(item.id.require("item")?).await },
                |_, _| {},
            )
            .await
    }

    /// Re-insert the item removed by the last delete. It keeps its old
    /// position unless another item of its bucket holds it by now.
    pub async fn undo_delete(&self) -> Result<ShoppingItem> {
        let port = Arc::clone(&self.port);
        self.store
            .undo_delete_with(
                |base, item| {
                    let taken = base.records.iter().any(|r| {
                        r.category_id == item.category_id
                            && r.status == item.status
                            && r.position == item.position
                    });
                    if taken {
                        item.position =
                            next_position(&base.records, item.category_id, item.status, item.id);
                    }
                },
                move |item| async move { port.restore_item(item).await },
            )
            .await
    }

    /// Number `ordered` 1..n. `ordered` must list every item of one
    /// `(category, status)` bucket exactly once.
    pub async fn reorder(&self, ordered: Vec<Identity>) -> Result<()> {
        let port = Arc::clone(&self.port);
        let now = Utc::now();

        self.store
            .mutate(
                |base| {
                    if let Some(first) = ordered.first() {
                        let first = base.get(*first)?;
                        let bucket = (first.category_id, first.status);
                        for id in &ordered {
                            let item = base.get(*id)?;
                            if (item.category_id, item.status) != bucket {
                                let reason = "items span more than one bucket";
                                return Err(ValidationError::InvalidOrder(reason).into());
                            }
                        }
                        let size = base
                            .records
                            .iter()
                            .filter(|r| (r.category_id, r.status) == bucket)
                            .count();
                        check_full_order(&ordered, size)?;
                    }

                    let mut ids = Vec::with_capacity(ordered.len());
                    for (i, id) in ordered.iter().enumerate() {
                        ids.push(id.require("item")?);
                        let item = base.get_mut(*id)?;
                        item.position = i as i64 + 1;
                        item.updated_at = now;
                    }
                    Ok(ids)
                },
                move |ids| async move { port.reorder_items(ids).await },
                |_, _| {},
            )
            .await
    }

    pub async fn update_settings(&self, settings: ListSettings) -> Result<ShoppingList> {
        if let Some(code) = &settings.currency_code {
            validate_currency(code)?;
        }
        let port = Arc::clone(&self.port);

        self.store
            .mutate(
                |base| {
                    let list = base.context.list.as_mut().ok_or_else(not_loaded)?;
                    if let Some(code) = &settings.currency_code {
                        list.currency_code = code.clone();
                    }
                    if let Some(hide) = settings.hide_purchased_by_default {
                        list.hide_purchased_by_default = hide;
                    }
                    if let Some(ask) = settings.ask_price_on_purchase {
                        list.ask_price_on_purchase = ask;
                    }
                    Ok((list.id, settings))
                },
                move |(list_id, settings)| async move {
                    port.update_list_settings(list_id, settings).await
                },
                |base, saved: &ShoppingList| base.context.list = Some(saved.clone()),
            )
            .await
    }

    /// Mark the list done, or reopen it
    pub async fn set_completed(&self, completed: bool) -> Result<ShoppingList> {
        let port = Arc::clone(&self.port);
        let now = Utc::now();

        self.store
            .mutate(
                |base| {
                    let list = base.context.list.as_mut().ok_or_else(not_loaded)?;
                    list.is_completed = completed;
                    list.completed_at = completed.then_some(now);
                    Ok(list.id)
                },
                move |list_id| async move { port.set_list_completed(list_id, completed).await },
                |base, saved: &ShoppingList| base.context.list = Some(saved.clone()),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    async fn store() -> ShoppingStore<Database> {
        let db = Database::open_in_memory().unwrap();
        let store = ShoppingStore::new(Arc::new(db), "BRL");
        store.load().await.unwrap();
        store
    }

    fn names(group: &[ShoppingItem]) -> Vec<&str> {
        group.iter().map(|i| i.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_load_seeds_list() {
        let store = store().await;
        let state = store.snapshot();
        assert!(state.context().list.is_some());
        assert!(!state.context().categories.is_empty());
        assert!(state.view.groups.is_empty());
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn test_add_item_into_new_category() {
        let store = store().await;
        let mut draft = ItemDraft::named("Ração");
        draft.category = Some("Pet".into());

        let item = store.add_item(draft).await.unwrap();
        assert!(!item.id.is_pending());

        let state = store.snapshot();
        let pet = state
            .context()
            .categories
            .iter()
            .find(|c| c.name == "Pet")
            .unwrap();
        assert!(!pet.id.is_pending());
        assert_eq!(item.category_id, pet.id);
        assert_eq!(state.view.groups.len(), 1);
        assert_eq!(state.view.groups[0].category.name, "Pet");
    }

    #[tokio::test]
    async fn test_add_item_from_parsed_line() {
        let store = store().await;
        let parsed = capture::parse(
            "Leite Integral 2L R$8,50 @Mercado:Laticínios",
            &capture::ParseContext::shopping(),
        );

        let draft = ItemDraft::from_parsed(&parsed).unwrap();
        let item = store.add_item(draft).await.unwrap();
        assert_eq!(item.name, "Leite Integral");
        assert_eq!(item.quantity.value(), 2.0);
        assert_eq!(item.unit.as_deref(), Some("L"));
        assert_eq!(item.unit_price_minor, Some(850));
        assert_eq!(item.total_price_minor, Some(1700));

        let state = store.snapshot();
        assert_eq!(state.view.groups[0].category.name, "Laticínios");
        assert_eq!(state.view.summary.pending_total_minor, 1700);
    }

    #[tokio::test]
    async fn test_toggle_back_appends_to_pending() {
        let store = store().await;
        let milk = store.add_item(ItemDraft::named("Leite")).await.unwrap();
        store.toggle_item(milk.id).await.unwrap();
        store.add_item(ItemDraft::named("Pão")).await.unwrap();
        store.add_item(ItemDraft::named("Café")).await.unwrap();

        let back = store.toggle_item(milk.id).await.unwrap();
        assert_eq!(back.status, ItemStatus::Pending);
        assert_eq!(back.position, 3);
        assert!(back.purchased_at.is_none());

        let state = store.snapshot();
        assert_eq!(names(&state.view.groups[0].pending), vec!["Pão", "Café", "Leite"]);
    }

    #[tokio::test]
    async fn test_hide_purchased_drops_empty_groups() {
        let store = store().await;
        let mut soap = ItemDraft::named("Sabão");
        soap.category = Some("Limpeza".into());
        let soap = store.add_item(soap).await.unwrap();
        store.add_item(ItemDraft::named("Pilhas")).await.unwrap();
        store.toggle_item(soap.id).await.unwrap();

        store.set_hide_purchased(true);
        let state = store.snapshot();
        assert_eq!(state.view.groups.len(), 1);
        assert_eq!(state.view.visible_count, 1);
        assert_eq!(state.view.summary.item_count, 2);

        store.set_hide_purchased(false);
        store.set_query("SAB");
        let state = store.snapshot();
        assert_eq!(state.view.groups.len(), 1);
        assert_eq!(names(&state.view.groups[0].purchased), vec!["Sabão"]);
    }

    #[tokio::test]
    async fn test_quantity_change_rederives_price() {
        let store = store().await;
        let mut draft = ItemDraft::named("Cerveja");
        draft.price = Some(PriceEdit::total(3000));
        let beer = store.add_item(draft).await.unwrap();
        assert_eq!(beer.unit_price_minor, Some(3000));

        let patched = store
            .update_item(
                beer.id,
                ItemPatch {
                    quantity: Quantity::new(6.0),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(patched.unit_price_minor, Some(500));
        assert_eq!(patched.total_price_minor, Some(3000));
    }

    #[tokio::test]
    async fn test_delete_and_undo() {
        let store = store().await;
        let a = store.add_item(ItemDraft::named("Arroz")).await.unwrap();
        store.add_item(ItemDraft::named("Feijão")).await.unwrap();

        store.delete_item(a.id).await.unwrap();
        assert_eq!(store.snapshot().records().len(), 1);

        let restored = store.undo_delete().await.unwrap();
        assert_eq!(restored, a);
        assert_eq!(store.snapshot().records().len(), 2);
    }

    #[tokio::test]
    async fn test_undo_into_taken_position_appends() {
        let store = store().await;
        let a = store.add_item(ItemDraft::named("Arroz")).await.unwrap();
        let b = store.add_item(ItemDraft::named("Feijão")).await.unwrap();
        store.delete_item(b.id).await.unwrap();
        let c = store.add_item(ItemDraft::named("Óleo")).await.unwrap();
        assert_eq!(c.position, b.position);

        let restored = store.undo_delete().await.unwrap();
        assert_eq!(restored.id, b.id);
        assert_eq!(restored.position, 3);

        let state = store.snapshot();
        let mut positions: Vec<i64> = state.records().iter().map(|i| i.position).collect();
        positions.sort();
        assert_eq!(positions, vec![1, 2, 3]);
        assert_eq!(state.find(restored.id), Some(&restored));
        assert_eq!(names(&state.view.groups[0].pending), vec!["Arroz", "Óleo", "Feijão"]);
        assert_eq!(state.find(a.id).unwrap().position, 1);
    }

    #[tokio::test]
    async fn test_reorder_needs_one_full_bucket() {
        let store = store().await;
        let a = store.add_item(ItemDraft::named("Pão")).await.unwrap();
        let b = store.add_item(ItemDraft::named("Bolo")).await.unwrap();
        let mut soap = ItemDraft::named("Sabão");
        soap.category = Some("Limpeza".into());
        let c = store.add_item(soap).await.unwrap();
        let before = store.snapshot();

        for bad in [vec![b.id], vec![a.id, c.id], vec![a.id, a.id]] {
            let result = store.reorder(bad).await;
            assert!(matches!(
                result,
                Err(Error::Validation(ValidationError::InvalidOrder(_)))
            ));
            assert_eq!(store.snapshot().base, before.base);
        }

        store.reorder(vec![b.id, a.id]).await.unwrap();
        let state = store.snapshot();
        let group = state
            .view
            .groups
            .iter()
            .find(|g| g.category.name == DEFAULT_CATEGORY)
            .unwrap();
        assert_eq!(names(&group.pending), vec!["Bolo", "Pão"]);
    }

    #[tokio::test]
    async fn test_huge_prices_do_not_overflow_totals() {
        let store = store().await;
        let parsed = capture::parse(
            "arroz 2kg R$99999999999999999",
            &capture::ParseContext::shopping(),
        );
        assert!(matches!(
            ItemDraft::from_parsed(&parsed),
            Err(Error::Validation(ValidationError::PriceOutOfRange(_)))
        ));

        for name in ["Arroz", "Feijão"] {
            let mut draft = ItemDraft::named(name);
            draft.price = Some(PriceEdit::total(i64::MAX - 1));
            store.add_item(draft).await.unwrap();
        }
        let summary = store.snapshot().view.summary;
        assert_eq!(summary.pending_total_minor, i64::MAX);
        assert_eq!(summary.total_minor, i64::MAX);
    }

    #[test]
    fn test_zero_quantity_is_a_validation_error() {
        let parsed = capture::parse("arroz 0kg", &capture::ParseContext::shopping());
        assert!(matches!(
            ItemDraft::from_parsed(&parsed),
            Err(Error::Validation(ValidationError::InvalidQuantity(_)))
        ));
    }

    #[tokio::test]
    async fn test_invalid_name_touches_nothing() {
        let store = store().await;
        let before = store.snapshot();
        assert!(store.add_item(ItemDraft::named("   ")).await.is_err());
        assert_eq!(store.snapshot(), before);
    }

    #[tokio::test]
    async fn test_settings_and_completion() {
        let store = store().await;
        let list = store
            .update_settings(ListSettings {
                ask_price_on_purchase: Some(true),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(list.ask_price_on_purchase);

        let done = store.set_completed(true).await.unwrap();
        assert!(done.is_completed);
        assert_eq!(store.list().unwrap(), done);
    }
}
