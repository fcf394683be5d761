//! Stores for named user lists and the entries of one list

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;

use crate::error::{Error, Result};
use crate::model::{Identity, ItemKind, ListItem, NewListItem, UserList};
use crate::ports::ListsPort;
use crate::validation::{validate_name, ValidationError};

use super::filter::{same_name, Query};
use super::optimistic::{Base, OptimisticStore, Projection, Record, StoreState};

impl Record for UserList {
    fn identity(&self) -> Identity {
        self.id
    }
}

impl Record for ListItem {
    fn identity(&self) -> Identity {
        self.id
    }
}

// =============================================================================
// Lists
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListsContext {
    /// Entries removed together with the last deleted list
    pub trash: Vec<ListItem>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListsFilter {
    pub query: Query,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListsView {
    /// Matching lists ordered by name
    pub visible: Vec<UserList>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListsProjection;

impl Projection for ListsProjection {
    const ENTITY: &'static str = "list";

    type Record = UserList;
    type Context = ListsContext;
    type Filter = ListsFilter;
    type View = ListsView;

    fn project(base: &Base<Self>, filter: &ListsFilter) -> ListsView {
        let mut visible: Vec<UserList> = base
            .records
            .iter()
            .filter(|list| filter.query.matches(&list.name))
            .cloned()
            .collect();
        visible.sort_by_key(|list| list.name.to_lowercase());
        ListsView { visible }
    }
}

fn duplicate(name: &str) -> Error {
    ValidationError::InvalidName(name.trim().to_string(), "a list with this name already exists")
        .into()
}

pub struct ListsStore<S> {
    store: OptimisticStore<ListsProjection>,
    port: Arc<S>,
}

impl<S: ListsPort> ListsStore<S> {
    pub fn new(port: Arc<S>) -> Self {
        Self {
            store: OptimisticStore::default(),
            port,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<StoreState<ListsProjection>> {
        self.store.subscribe()
    }

    pub fn snapshot(&self) -> StoreState<ListsProjection> {
        self.store.snapshot()
    }

    /// All known lists, in no particular order
    pub fn lists(&self) -> Vec<UserList> {
        self.store.read(|s| s.records().to_vec())
    }

    pub fn find_by_name(&self, name: &str) -> Option<UserList> {
        self.store.read(|s| {
            s.records()
                .iter()
                .find(|list| same_name(&list.name, name))
                .cloned()
        })
    }

    pub async fn load(&self) -> Result<()> {
        let port = Arc::clone(&self.port);
        self.store
            .load(async move {
                let lists = port.load_lists().await?;
                Ok((lists, ListsContext::default()))
            })
            .await
    }

    pub fn set_query(&self, query: &str) {
        let query = Query::new(query);
        self.store.update_filter(|f| f.query = query);
    }

    pub async fn create(&self, name: &str) -> Result<UserList> {
        validate_name(name)?;
        if self.find_by_name(name).is_some() {
            return Err(duplicate(name));
        }
        let name = name.trim().to_string();
        let placeholder = Identity::pending();
        let now = Utc::now();
        let port = Arc::clone(&self.port);

        self.store
            .mutate(
                |base| {
                    base.records.push(UserList {
                        id: placeholder,
                        name: name.clone(),
                        created_at: now,
                        updated_at: now,
                    });
                    Ok(name)
                },
                move |name| async move { port.create_list(name).await },
                |base, saved: &UserList| base.upsert(placeholder, saved.clone()),
            )
            .await
    }

    pub async fn rename(&self, id: Identity, name: &str) -> Result<UserList> {
        validate_name(name)?;
        if let Some(other) = self.find_by_name(name) {
            if other.id != id {
                return Err(duplicate(name));
            }
        }
        let name = name.trim().to_string();
        let now = Utc::now();
        let port = Arc::clone(&self.port);

        self.store
            .mutate(
                |base| {
                    let row_id = id.require("list")?;
                    let list = base.get_mut(id)?;
                    list.name = name.clone();
                    list.updated_at = now;
                    Ok((row_id, name))
                },
                move |(row_id, name)| async move { port.rename_list(row_id, name).await },
                |base, saved: &UserList| base.upsert(id, saved.clone()),
            )
            .await
    }

    /// Delete a list and its entries; both come back with `undo_delete`
    pub async fn delete(&self, id: Identity) -> Result<()> {
        let port = Arc::clone(&self.port);
        self.store
            .delete(
                id,
                move |list| async move { port.delete_list(list.id.require("list")?).await },
                |base, entries: &Vec<ListItem>| base.context.trash = entries.clone(),
            )
            .await
            .map(|_| ())
    }

    pub async fn undo_delete(&self) -> Result<UserList> {
        let entries = self.store.read(|s| s.context().trash.clone());
        let port = Arc::clone(&self.port);
        let restored = self
            .store
            .undo_delete(move |list| async move { port.restore_list(list, entries).await })
            .await?;
        self.store.update_context(|c| c.trash.clear());
        Ok(restored)
    }
}

// =============================================================================
// Entries of one list
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemsContext {
    pub list_id: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemsFilter {
    pub query: Query,
    /// Only entries of this kind label
    pub kind: Option<&'static str>,
    pub hide_completed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KindGroup {
    pub kind: &'static str,
    pub items: Vec<ListItem>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemsView {
    /// Matching entries by position
    pub visible: Vec<ListItem>,
    /// Matching entries per kind, in `ItemKind::LABELS` order, empty kinds left out
    pub groups: Vec<KindGroup>,
    pub completed_count: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemsProjection;

impl Projection for ItemsProjection {
    const ENTITY: &'static str = "entry";

    type Record = ListItem;
    type Context = ItemsContext;
    type Filter = ItemsFilter;
    type View = ItemsView;

    fn project(base: &Base<Self>, filter: &ItemsFilter) -> ItemsView {
        let mut visible: Vec<ListItem> = base
            .records
            .iter()
            .filter(|item| {
                filter.query.matches(&item.title) || item.kind.mentions(filter.query.as_str())
            })
            .filter(|item| filter.kind.map_or(true, |k| item.kind.label() == k))
            .filter(|item| !(filter.hide_completed && item.kind.is_complete()))
            .cloned()
            .collect();
        visible.sort_by(|a, b| {
            a.position
                .cmp(&b.position)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });

        let groups = ItemKind::LABELS
            .iter()
            .filter_map(|kind| {
                let items: Vec<ListItem> = visible
                    .iter()
                    .filter(|item| item.kind.label() == *kind)
                    .cloned()
                    .collect();
                (!items.is_empty()).then_some(KindGroup { kind: *kind, items })
            })
            .collect();

        ItemsView {
            visible,
            groups,
            completed_count: base
                .records
                .iter()
                .filter(|item| item.kind.is_complete())
                .count(),
            total: base.records.len(),
        }
    }
}

pub struct ItemsStore<S> {
    store: OptimisticStore<ItemsProjection>,
    port: Arc<S>,
}

impl<S: ListsPort> ItemsStore<S> {
    pub fn new(port: Arc<S>) -> Self {
        Self {
            store: OptimisticStore::default(),
            port,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<StoreState<ItemsProjection>> {
        self.store.subscribe()
    }

    pub fn snapshot(&self) -> StoreState<ItemsProjection> {
        self.store.snapshot()
    }

    pub fn list_id(&self) -> Option<i64> {
        self.store.read(|s| s.context().list_id)
    }

    /// Load the entries of `list_id`, replacing whatever list was loaded
    pub async fn load(&self, list_id: i64) -> Result<()> {
        let port = Arc::clone(&self.port);
        self.store
            .load(async move {
                let items = port.load_items(list_id).await?;
                Ok((
                    items,
                    ItemsContext {
                        list_id: Some(list_id),
                    },
                ))
            })
            .await
    }

    pub fn set_query(&self, query: &str) {
        let query = Query::new(query);
        self.store.update_filter(|f| f.query = query);
    }

    pub fn set_kind_filter(&self, kind: Option<&'static str>) {
        self.store.update_filter(|f| f.kind = kind);
    }

    pub fn set_hide_completed(&self, hide: bool) {
        self.store.update_filter(|f| f.hide_completed = hide);
    }

    pub async fn add(&self, title: &str, kind: ItemKind) -> Result<ListItem> {
        validate_name(title)?;
        let list_id = self
            .list_id()
            .ok_or_else(|| Error::Other("no list is loaded".into()))?;
        let title = title.trim().to_string();
        let placeholder = Identity::pending();
        let now = Utc::now();
        let port = Arc::clone(&self.port);

        self.store
            .mutate(
                |base| {
                    let position = base.records.iter().map(|i| i.position).max().unwrap_or(0) + 1;
                    base.records.push(ListItem {
                        id: placeholder,
                        list_id,
                        title: title.clone(),
                        kind: kind.clone(),
                        position,
                        created_at: now,
                        updated_at: now,
                    });
                    Ok(NewListItem {
                        list_id,
                        title,
                        kind,
                    })
                },
                move |new| async move { port.create_item(new).await },
                |base, saved: &ListItem| base.upsert(placeholder, saved.clone()),
            )
            .await
    }

    /// Change the title and/or the kind payload
    pub async fn update(
        &self,
        id: Identity,
        title: Option<&str>,
        kind: Option<ItemKind>,
    ) -> Result<ListItem> {
        if let Some(title) = title {
            validate_name(title)?;
        }
        let title = title.map(|t| t.trim().to_string());
        self.edit(id, move |item| {
            if let Some(title) = title {
                item.title = title;
            }
            if let Some(kind) = kind {
                item.kind = kind;
            }
        })
        .await
    }

    /// Flip the kind's completion flag (watched, read, purchased...)
    pub async fn toggle(&self, id: Identity) -> Result<ListItem> {
        self.edit(id, |item| {
            let done = item.kind.is_complete();
            item.kind.set_complete(!done);
        })
        .await
    }

    async fn edit(&self, id: Identity, change: impl FnOnce(&mut ListItem)) -> Result<ListItem> {
        let now = Utc::now();
        let port = Arc::clone(&self.port);

        self.store
            .mutate(
                |base| {
                    id.require("entry")?;
                    let item = base.get_mut(id)?;
                    change(item);
                    item.updated_at = now;
                    Ok(item.clone())
                },
                move |item| async move { port.update_item(item).await },
                |base, saved: &ListItem| base.upsert(id, saved.clone()),
            )
            .await
    }

    pub async fn delete(&self, id: Identity) -> Result<()> {
        let port = Arc::clone(&self.port);
        self.store
            .delete(
                id,
                move |item| async move { port.delete_item(item.id.require("entry")?).await },
                |_, _| {},
            )
            .await
    }

    pub async fn undo_delete(&self) -> Result<ListItem> {
        let port = Arc::clone(&self.port);
        self.store
            .undo_delete(move |item| async move { port.restore_item(item).await })
            .await
    }

    /// Number `ordered` 1..n
    pub async fn reorder(&self, ordered: Vec<Identity>) -> Result<()> {
        let now = Utc::now();
        let port = Arc::clone(&self.port);

        self.store
            .mutate(
                |base| {
                    let mut ids = Vec::with_capacity(ordered.len());
                    for (i, id) in ordered.iter().enumerate() {
                        ids.push(id.require("entry")?);
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    fn db() -> Arc<Database> {
        Arc::new(Database::open_in_memory().unwrap())
    }

    #[tokio::test]
    async fn test_create_rename_and_duplicates() {
        let lists = ListsStore::new(db());
        lists.load().await.unwrap();

        let movies = lists.create("Filmes").await.unwrap();
        assert!(!movies.id.is_pending());
        assert!(lists.create("filmes").await.is_err());

        lists.create("Books").await.unwrap();
        let names: Vec<String> = lists
            .snapshot()
            .view
            .visible
            .iter()
            .map(|l| l.name.clone())
            .collect();
        assert_eq!(names, vec!["Books", "Filmes"]);

        let renamed = lists.rename(movies.id, "Séries").await.unwrap();
        assert_eq!(lists.find_by_name("SÉRIES").unwrap(), renamed);
    }

    #[tokio::test]
    async fn test_list_undo_brings_entries_back() {
        let port = db();
        let lists = ListsStore::new(Arc::clone(&port));
        lists.load().await.unwrap();
        let games = lists.create("Jogos").await.unwrap();

        let items = ItemsStore::new(Arc::clone(&port));
        items.load(games.id.require("list").unwrap()).await.unwrap();
        items.add("Hades", ItemKind::blank("game").unwrap()).await.unwrap();

        lists.delete(games.id).await.unwrap();
        assert!(lists.snapshot().records().is_empty());
        assert_eq!(lists.snapshot().context().trash.len(), 1);

        lists.undo_delete().await.unwrap();
        assert!(lists.snapshot().context().trash.is_empty());
        items.load(games.id.require("list").unwrap()).await.unwrap();
        assert_eq!(items.snapshot().records().len(), 1);
    }

    #[tokio::test]
    async fn test_items_toggle_group_and_filter() {
        let port = db();
        let lists = ListsStore::new(Arc::clone(&port));
        let misc = lists.create("Misc").await.unwrap();

        let items = ItemsStore::new(Arc::clone(&port));
        items.load(misc.id.require("list").unwrap()).await.unwrap();
        let book = items
            .add(
                "Grande Sertão",
                ItemKind::Book {
                    author: Some("Guimarães Rosa".into()),
                    read: false,
                },
            )
            .await
            .unwrap();
        items.add("Ligar pro banco", ItemKind::note()).await.unwrap();

        let read = items.toggle(book.id).await.unwrap();
        assert!(read.kind.is_complete());

        let view = items.snapshot().view;
        assert_eq!(view.completed_count, 1);
        let kinds: Vec<&str> = view.groups.iter().map(|g| g.kind).collect();
        assert_eq!(kinds, vec!["note", "book"]);

        items.set_query("rosa");
        assert_eq!(items.snapshot().view.visible.len(), 1);

        items.set_query("");
        items.set_hide_completed(true);
        assert_eq!(items.snapshot().view.visible.len(), 1);
    }

    #[tokio::test]
    async fn test_reorder_entries() {
        let port = db();
        let lists = ListsStore::new(Arc::clone(&port));
        let list = lists.create("Ordem").await.unwrap();

        let items = ItemsStore::new(Arc::clone(&port));
        let list_id = list.id.require("list").unwrap();
        items.load(list_id).await.unwrap();
        let a = items.add("a", ItemKind::note()).await.unwrap();
        let b = items.add("b", ItemKind::note()).await.unwrap();

        items.reorder(vec![b.id, a.id]).await.unwrap();
        let titles: Vec<String> = items
            .snapshot()
            .view
            .visible
            .iter()
            .map(|i| i.title.clone())
            .collect();
        assert_eq!(titles, vec!["b", "a"]);

        items.load(list_id).await.unwrap();
        assert_eq!(items.snapshot().view.visible[0].title, "b");
    }
}
