//! Integration tests for listkeep
//!
//! Full flows from typed text through the stores down to SQLite, including
//! rollback when a write fails.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use listkeep::model::{
    Category, CreatedItem, InputWrite, ItemKind, ItemStatus, ListItem, ListSettings, NewListItem,
    NewShoppingItem, NewUserInput, Quantity, ShoppingItem, ShoppingList, Tag, UserInput, UserList,
};
use listkeep::ports::{InboxPort, InboxSnapshot, ListsPort, ShoppingPort, ShoppingSnapshot};
use listkeep::store::{
    InboxStore, ItemDraft, ItemPatch, ItemsStore, ListsStore, PriceEdit, Projection,
    ShoppingStore, StoreState,
};
use listkeep::{ActionKind, App, Captured, Config, Database, Error, ParseContext, Result};
use tempfile::TempDir;

/// Helper to create a file-backed test database
fn setup_test_db() -> (TempDir, Database) {
    let tmp = TempDir::new().expect("Failed to create temp dir");
    let db = Database::open(tmp.path().join("lists.sqlite3")).expect("Failed to open database");
    (tmp, db)
}

/// Database wrapper whose writes fail while the switch is on
struct Flaky {
    db: Database,
    failing: AtomicBool,
}

impl Flaky {
    fn new(db: Database) -> Arc<Self> {
        Arc::new(Self {
            db,
            failing: AtomicBool::new(false),
        })
    }

    fn set_failing(&self, on: bool) {
        self.failing.store(on, Ordering::SeqCst);
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::Other("disk unavailable".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ShoppingPort for Flaky {
    async fn load(&self, currency_code: String) -> Result<ShoppingSnapshot> {
        ShoppingPort::load(&self.db, currency_code).await
    }

    async fn create_item(&self, new: NewShoppingItem) -> Result<CreatedItem> {
        self.check()?;
        ShoppingPort::create_item(&self.db, new).await
    }

    async fn restore_item(&self, item: ShoppingItem) -> Result<ShoppingItem> {
        self.check()?;
        ShoppingPort::restore_item(&self.db, item).await
    }

    async fn get_item_by_id(&self, id: i64) -> Result<Option<ShoppingItem>> {
        ShoppingPort::get_item_by_id(&self.db, id).await
    }

    async fn update_item(&self, item: ShoppingItem) -> Result<ShoppingItem> {
        self.check()?;
        ShoppingPort::update_item(&self.db, item).await
    }

    async fn set_item_status(&self, id: i64, status: ItemStatus) -> Result<ShoppingItem> {
        self.check()?;
        self.db.set_item_status(id, status).await
    }

    async fn delete_item(&self, id: i64) -> Result<()> {
        self.check()?;
        ShoppingPort::delete_item(&self.db, id).await
    }

    async fn reorder_items(&self, ids: Vec<i64>) -> Result<()> {
        self.check()?;
        ShoppingPort::reorder_items(&self.db, ids).await
    }

    async fn search_items(&self, list_id: i64, query: String) -> Result<Vec<ShoppingItem>> {
        ShoppingPort::search_items(&self.db, list_id, query).await
    }

    async fn group_by_category(&self, list_id: i64) -> Result<Vec<(Category, Vec<ShoppingItem>)>> {
        self.db.group_by_category(list_id).await
    }

    async fn update_list_settings(
        &self,
        list_id: i64,
        settings: ListSettings,
    ) -> Result<ShoppingList> {
        self.check()?;
        self.db.update_list_settings(list_id, settings).await
    }

    async fn set_list_completed(&self, list_id: i64, completed: bool) -> Result<ShoppingList> {
        self.check()?;
        self.db.set_list_completed(list_id, completed).await
    }
}

#[async_trait]
impl InboxPort for Flaky {
    async fn load(&self) -> Result<InboxSnapshot> {
        InboxPort::load(&self.db).await
    }

    async fn create_input(&self, new: NewUserInput) -> Result<InputWrite> {
        self.check()?;
        self.db.create_input(new).await
    }

    async fn restore_input(&self, input: UserInput) -> Result<InputWrite> {
        self.check()?;
        self.db.restore_input(input).await
    }

    async fn get_input_by_id(&self, id: i64) -> Result<Option<UserInput>> {
        self.db.get_input_by_id(id).await
    }

    async fn update_input(&self, id: i64, new: NewUserInput) -> Result<InputWrite> {
        self.check()?;
        self.db.update_input(id, new).await
    }

    async fn delete_input(&self, id: i64) -> Result<Vec<Tag>> {
        self.check()?;
        self.db.delete_input(id).await
    }

    async fn search_inputs(&self, query: String) -> Result<Vec<UserInput>> {
        self.db.search_inputs(query).await
    }

    async fn get_inputs_by_tag_id(&self, tag_id: i64) -> Result<Vec<UserInput>> {
        self.db.get_inputs_by_tag_id(tag_id).await
    }

    async fn group_by_tag(&self) -> Result<Vec<(Tag, Vec<UserInput>)>> {
        self.db.group_by_tag().await
    }
}

#[async_trait]
impl ListsPort for Flaky {
    async fn load_lists(&self) -> Result<Vec<UserList>> {
        self.db.load_lists().await
    }

    async fn create_list(&self, name: String) -> Result<UserList> {
        self.check()?;
        self.db.create_list(name).await
    }

    async fn restore_list(&self, list: UserList, entries: Vec<ListItem>) -> Result<UserList> {
        self.check()?;
        self.db.restore_list(list, entries).await
    }

    async fn rename_list(&self, id: i64, name: String) -> Result<UserList> {
        self.check()?;
        self.db.rename_list(id, name).await
    }

    async fn delete_list(&self, id: i64) -> Result<Vec<ListItem>> {
        self.check()?;
        self.db.delete_list(id).await
    }

    async fn search_lists(&self, query: String) -> Result<Vec<UserList>> {
        self.db.search_lists(query).await
    }

    async fn load_items(&self, list_id: i64) -> Result<Vec<ListItem>> {
        self.db.load_items(list_id).await
    }

    async fn create_item(&self, new: NewListItem) -> Result<ListItem> {
        self.check()?;
        ListsPort::create_item(&self.db, new).await
    }

    async fn restore_item(&self, item: ListItem) -> Result<ListItem> {
        self.check()?;
        ListsPort::restore_item(&self.db, item).await
    }

    async fn get_item_by_id(&self, id: i64) -> Result<Option<ListItem>> {
        ListsPort::get_item_by_id(&self.db, id).await
    }

    async fn update_item(&self, item: ListItem) -> Result<ListItem> {
        self.check()?;
        ListsPort::update_item(&self.db, item).await
    }

    async fn delete_item(&self, id: i64) -> Result<()> {
        self.check()?;
        ListsPort::delete_item(&self.db, id).await
    }

    async fn reorder_items(&self, ids: Vec<i64>) -> Result<()> {
        self.check()?;
        ListsPort::reorder_items(&self.db, ids).await
    }

    async fn search_items(&self, list_id: Option<i64>, query: String) -> Result<Vec<ListItem>> {
        ListsPort::search_items(&self.db, list_id, query).await
    }

    async fn group_by_kind(&self, list_id: i64) -> Result<Vec<(&'static str, Vec<ListItem>)>> {
        self.db.group_by_kind(list_id).await
    }
}

async fn flaky_shopping() -> (Arc<Flaky>, ShoppingStore<Flaky>) {
    let port = Flaky::new(Database::open_in_memory().unwrap());
    let store = ShoppingStore::new(Arc::clone(&port), "BRL");
    store.load().await.unwrap();
    (port, store)
}

async fn flaky_inbox() -> (Arc<Flaky>, InboxStore<Flaky>) {
    let port = Flaky::new(Database::open_in_memory().unwrap());
    let store = InboxStore::new(Arc::clone(&port));
    store.load().await.unwrap();
    (port, store)
}

/// A list store and an entries store on one port, with "Filmes" open
async fn flaky_lists() -> (Arc<Flaky>, ListsStore<Flaky>, ItemsStore<Flaky>) {
    let port = Flaky::new(Database::open_in_memory().unwrap());
    let lists = ListsStore::new(Arc::clone(&port));
    lists.load().await.unwrap();
    let movies = lists.create("Filmes").await.unwrap();
    let items = ItemsStore::new(Arc::clone(&port));
    items.load(movies.id.require("list").unwrap()).await.unwrap();
    (port, lists, items)
}

/// The failed write left records, context and view as they were
fn assert_rolled_back<P: Projection>(before: &StoreState<P>, after: &StoreState<P>) {
    assert_eq!(after.base, before.base);
    assert_eq!(after.view, before.view);
    assert_eq!(
        after.last_error.as_ref().map(|e| e.kind),
        Some(ActionKind::Write)
    );
}

/// Usage counts must equal the number of inputs carrying each tag
fn assert_counts_match(inputs: &[UserInput], tags: &[Tag]) {
    let mut expected: HashMap<&str, i64> = HashMap::new();
    for input in inputs {
        for tag in &input.tags {
            *expected.entry(tag.name.as_str()).or_default() += 1;
        }
    }
    for tag in tags {
        assert_eq!(
            tag.usage_count,
            expected.get(tag.name.as_str()).copied().unwrap_or(0),
            "usage count of #{}",
            tag.name
        );
    }
}

// =============================================================================
// Rollback Tests
// =============================================================================

#[tokio::test]
async fn test_failed_delete_restores_exact_state() {
    let (port, store) = flaky_shopping().await;
    let milk = store.add_item(ItemDraft::named("Leite")).await.unwrap();
    store.add_item(ItemDraft::named("Pão")).await.unwrap();
    let before = store.snapshot();

    port.set_failing(true);
    let result = store.delete_item(milk.id).await;
    assert!(result.is_err());

    let after = store.snapshot();
    assert_eq!(after.base, before.base);
    assert_eq!(after.view, before.view);
    assert_eq!(after.records().len(), 2);
    let error = after.last_error.expect("error is recorded");
    assert_eq!(error.kind, ActionKind::Write);
    assert!(error.message.contains("disk unavailable"));

    // Nothing reached the database either
    port.set_failing(false);
    assert!(ShoppingPort::get_item_by_id(&port.db, milk.id.require("item").unwrap())
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_failed_create_restores_draft() {
    let (port, store) = flaky_shopping().await;
    store.set_draft("Leite 2L");
    let categories = store.snapshot().context().categories.clone();

    port.set_failing(true);
    let mut draft = ItemDraft::named("Leite");
    draft.category = Some("Bebês".into());
    assert!(store.add_item(draft).await.is_err());

    let state = store.snapshot();
    assert_eq!(state.context().draft, "Leite 2L");
    assert!(state.records().is_empty());
    assert_eq!(state.context().categories, categories);
    assert!(state.view.groups.is_empty());
}

#[tokio::test]
async fn test_failed_update_leaves_inbox_untouched() {
    let (port, store) = flaky_inbox().await;
    let input = store.create("buy milk #groceries").await.unwrap();
    let before = store.snapshot();
    let mut rx = store.subscribe();

    port.set_failing(true);
    assert!(store.update(input.id, "buy bread #bakery").await.is_err());

    let after = rx.borrow_and_update().clone();
    assert_eq!(after.base, before.base);
    assert_eq!(after.view, before.view);
    assert_eq!(after.last_error.map(|e| e.kind), Some(ActionKind::Write));

    port.set_failing(false);
    let saved = InboxPort::load(&port.db).await.unwrap();
    assert_eq!(saved.inputs.len(), 1);
    assert_eq!(saved.inputs[0].text, "buy milk #groceries");
    assert!(saved.tags.iter().all(|t| t.name != "bakery"));
}

#[tokio::test]
async fn test_failed_toggle_restores_position_and_timestamp() {
    let (port, store) = flaky_shopping().await;
    let rice = store.add_item(ItemDraft::named("Arroz")).await.unwrap();
    let beans = store.add_item(ItemDraft::named("Feijão")).await.unwrap();
    store.toggle_item(rice.id).await.unwrap();
    let before = store.snapshot();

    port.set_failing(true);
    assert!(store.toggle_item(beans.id).await.is_err());
    assert!(store.toggle_item(rice.id).await.is_err());

    let after = store.snapshot();
    assert_rolled_back(&before, &after);
    let rice = after.find(rice.id).unwrap();
    assert_eq!(rice.status, ItemStatus::Purchased);
    assert!(rice.purchased_at.is_some());
    assert_eq!(after.find(beans.id).unwrap().position, 2);
}

#[tokio::test]
async fn test_failed_reorder_restores_positions() {
    let (port, store) = flaky_shopping().await;
    let bread = store.add_item(ItemDraft::named("Pão")).await.unwrap();
    let cake = store.add_item(ItemDraft::named("Bolo")).await.unwrap();
    let before = store.snapshot();

    port.set_failing(true);
    assert!(store.reorder(vec![cake.id, bread.id]).await.is_err());

    let after = store.snapshot();
    assert_rolled_back(&before, &after);
    assert_eq!(after.find(bread.id).unwrap().position, 1);
    assert_eq!(after.find(cake.id).unwrap().position, 2);
}

#[tokio::test]
async fn test_failed_update_restores_prices() {
    let (port, store) = flaky_shopping().await;
    let mut draft = ItemDraft::named("Cerveja");
    draft.price = Some(PriceEdit::unit(500));
    let beer = store.add_item(draft).await.unwrap();
    let before = store.snapshot();

    port.set_failing(true);
    let patch = ItemPatch {
        quantity: Quantity::new(6.0),
        price: Some(Some(PriceEdit::total(2400))),
        ..Default::default()
    };
    assert!(store.update_item(beer.id, patch).await.is_err());

    let after = store.snapshot();
    assert_rolled_back(&before, &after);
    let beer = after.find(beer.id).unwrap();
    assert_eq!(beer.unit_price_minor, Some(500));
    assert_eq!(beer.total_price_minor, Some(500));
    assert_eq!(after.view.summary.pending_total_minor, 500);
}

#[tokio::test]
async fn test_failed_completion_restores_list() {
    let (port, store) = flaky_shopping().await;
    let before = store.snapshot();

    port.set_failing(true);
    assert!(store.set_completed(true).await.is_err());

    let after = store.snapshot();
    assert_rolled_back(&before, &after);
    let list = store.list().unwrap();
    assert!(!list.is_completed);
    assert!(list.completed_at.is_none());
}

#[tokio::test]
async fn test_failed_inbox_delete_and_undo_roll_back() {
    let (port, store) = flaky_inbox().await;
    let milk = store.create("buy milk #groceries").await.unwrap();
    store.create("pay rent #finance").await.unwrap();

    let before = store.snapshot();
    port.set_failing(true);
    assert!(store.delete(milk.id).await.is_err());
    assert_rolled_back(&before, &store.snapshot());

    port.set_failing(false);
    store.delete(milk.id).await.unwrap();
    let before = store.snapshot();
    assert!(before.base.last_deleted.is_some());

    port.set_failing(true);
    assert!(store.undo_delete().await.is_err());
    let after = store.snapshot();
    assert_rolled_back(&before, &after);
    assert_counts_match(after.records(), &after.context().tags);

    // The remembered input survives, so a later undo still works
    port.set_failing(false);
    let restored = store.undo_delete().await.unwrap();
    assert_eq!(restored.text, "buy milk #groceries");
}

#[tokio::test]
async fn test_failed_list_writes_roll_back() {
    let (port, lists, _items) = flaky_lists().await;
    let movies = lists.find_by_name("Filmes").unwrap();
    let before = lists.snapshot();

    port.set_failing(true);
    assert!(lists.create("Livros").await.is_err());
    assert_rolled_back(&before, &lists.snapshot());

    assert!(lists.rename(movies.id, "Séries").await.is_err());
    assert_rolled_back(&before, &lists.snapshot());

    assert!(lists.delete(movies.id).await.is_err());
    let after = lists.snapshot();
    assert_rolled_back(&before, &after);
    assert_eq!(after.view.visible, vec![movies]);

    port.set_failing(false);
    assert_eq!(ListsPort::load_lists(&port.db).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_failed_entry_writes_roll_back() {
    let (port, _lists, items) = flaky_lists().await;
    let kind = ItemKind::Shopping {
        quantity: None,
        price_minor: None,
        purchased: false,
    };
    let popcorn = items.add("Pipoca", kind.clone()).await.unwrap();
    let before = items.snapshot();

    port.set_failing(true);
    assert!(items.add("Refrigerante", kind).await.is_err());
    assert_rolled_back(&before, &items.snapshot());

    assert!(items.toggle(popcorn.id).await.is_err());
    let after = items.snapshot();
    assert_rolled_back(&before, &after);
    assert!(!after.find(popcorn.id).unwrap().kind.is_complete());
    assert_eq!(after.view.completed_count, 0);
}

// =============================================================================
// Shopping Tests
// =============================================================================

#[tokio::test]
async fn test_toggle_appends_to_purchased_bucket() {
    let (_tmp, db) = setup_test_db();
    let store = ShoppingStore::new(Arc::new(db.clone()), "BRL");
    store.load().await.unwrap();

    let mut ids = Vec::new();
    for name in ["Arroz", "Feijão", "Café"] {
        ids.push(store.add_item(ItemDraft::named(name)).await.unwrap().id);
    }
    store.toggle_item(ids[0]).await.unwrap();
    store.toggle_item(ids[1]).await.unwrap();
    let coffee = store.toggle_item(ids[2]).await.unwrap();

    assert_eq!(coffee.status, ItemStatus::Purchased);
    assert_eq!(coffee.position, 3);
    assert!(coffee.purchased_at.is_some());

    let saved = ShoppingPort::get_item_by_id(&db, ids[2].require("item").unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(saved, coffee);

    let view = store.snapshot().view;
    assert_eq!(view.summary.purchased_count, 3);
    assert_eq!(view.groups[0].purchased.len(), 3);
}

#[tokio::test]
async fn test_list_is_seeded_once() {
    let (tmp, db) = setup_test_db();
    let first = ShoppingPort::load(&db, "BRL".into()).await.unwrap();
    assert_eq!(first.categories.len(), listkeep::repo::PREDEFINED_CATEGORIES.len());
    assert!(first.items.is_empty());
    drop(db);

    let db = Database::open(tmp.path().join("lists.sqlite3")).unwrap();
    let second = ShoppingPort::load(&db, "USD".into()).await.unwrap();
    assert_eq!(second.list.id, first.list.id);
    assert_eq!(second.list.currency_code, "BRL");
    assert_eq!(second.categories, first.categories);
}

// =============================================================================
// Inbox Tests
// =============================================================================

#[tokio::test]
async fn test_tag_counts_follow_every_write() {
    let (_tmp, db) = setup_test_db();
    let store = InboxStore::new(Arc::new(db.clone()));
    store.load().await.unwrap();

    let milk = store.create("buy milk #groceries #Groceries").await.unwrap();
    let call = store.create("call bank #finance #urgent").await.unwrap();
    store.create("rent #finance").await.unwrap();
    store.update(milk.id, "buy milk and eggs #groceries #urgent").await.unwrap();
    store.retag(call.id, &["finance".to_string()]).await.unwrap();
    store.delete(milk.id).await.unwrap();
    store.undo_delete().await.unwrap();

    let state = store.snapshot();
    assert_counts_match(state.records(), &state.context().tags);
    let groceries = state
        .context()
        .tags
        .iter()
        .find(|t| t.name == "groceries")
        .unwrap();
    assert_eq!(groceries.usage_count, 1);

    let saved = InboxPort::load(&db).await.unwrap();
    assert_counts_match(&saved.inputs, &saved.tags);
    assert_eq!(saved.tags, state.context().tags);
}

// =============================================================================
// App Tests
// =============================================================================

#[tokio::test]
async fn test_capture_routes_each_line() {
    let app = App::open(Config::in_memory()).await.unwrap();
    app.lists.create("Mercado").await.unwrap();

    let captured = app
        .capture("Leite 2L R$ 8,50", &ParseContext::shopping())
        .await
        .unwrap();
    match captured {
        Captured::ShoppingItem(item) => {
            assert_eq!(item.name, "Leite");
            assert_eq!(item.unit_price_minor, Some(850));
            assert_eq!(item.total_price_minor, Some(1700));
        }
        other => panic!("expected shopping item, got {:?}", other),
    }

    let captured = app
        .capture("Arroz 5kg @mercado", &ParseContext::default())
        .await
        .unwrap();
    match captured {
        Captured::Entry { list, item } => {
            assert_eq!(list.name, "Mercado");
            assert_eq!(item.title, "Arroz");
            assert_eq!(item.kind.label(), "shopping");
        }
        other => panic!("expected list entry, got {:?}", other),
    }
    assert_eq!(app.items.snapshot().view.total, 1);

    let captured = app
        .capture("ligar pro banco #financas", &ParseContext::default())
        .await
        .unwrap();
    assert!(matches!(captured, Captured::Inbox(ref input) if input.has_tag("financas")));
}

#[tokio::test]
async fn test_app_reopens_with_data() {
    let tmp = TempDir::new().unwrap();
    let config = Config {
        database: tmp.path().join("lists.sqlite3"),
        hide_purchased: true,
        ..Config::default()
    };

    let app = App::open(config.clone()).await.unwrap();
    let item = app.shopping.add_item(ItemDraft::named("Café")).await.unwrap();
    app.shopping.toggle_item(item.id).await.unwrap();
    app.inbox.create("lembrar #casa").await.unwrap();
    drop(app);

    let app = App::open(config).await.unwrap();
    assert_eq!(
        app.db.schema_version().unwrap(),
        listkeep::db::migrations::latest_version()
    );
    let state = app.shopping.snapshot();
    assert_eq!(state.records().len(), 1);
    assert!(state.filter.hide_purchased);
    assert_eq!(state.view.visible_count, 0);
    assert_eq!(app.inbox.snapshot().view.total, 1);
}

#[tokio::test]
async fn test_open_rejects_bad_currency() {
    let config = Config {
        currency_code: "reais".into(),
        ..Config::in_memory()
    };
    let result = App::open(config).await;
    assert!(matches!(result, Err(Error::Validation(_))));
}
