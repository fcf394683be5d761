//! Persistence ports used by the stores
//!
//! Each store talks to one port trait. [`Database`] implements all three by
//! running the matching repository on the blocking pool; tests swap in
//! wrappers that fail on demand.

use async_trait::async_trait;

use crate::db::Database;
use crate::error::Result;
use crate::model::{
    Category, CreatedItem, InputWrite, ItemStatus, ListItem, ListSettings, NewListItem,
    NewShoppingItem, NewUserInput, ShoppingItem, ShoppingList, Tag, UserInput, UserList,
};
use crate::repo::{InboxRepository, ListsRepository, ShoppingRepository};

/// Everything the shopping screen needs, read in one transaction
#[derive(Debug, Clone, PartialEq)]
pub struct ShoppingSnapshot {
    pub list: ShoppingList,
    pub categories: Vec<Category>,
    pub items: Vec<ShoppingItem>,
}

/// Inputs plus the tag table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboxSnapshot {
    pub inputs: Vec<UserInput>,
    pub tags: Vec<Tag>,
}

#[async_trait]
pub trait ShoppingPort: Send + Sync + 'static {
    /// Read the list, seeding it on first use
    async fn load(&self, currency_code: String) -> Result<ShoppingSnapshot>;

    async fn create_item(&self, new: NewShoppingItem) -> Result<CreatedItem>;

    async fn restore_item(&self, item: ShoppingItem) -> Result<ShoppingItem>;

    async fn get_item_by_id(&self, id: i64) -> Result<Option<ShoppingItem>>;

    async fn update_item(&self, item: ShoppingItem) -> Result<ShoppingItem>;

    async fn set_item_status(&self, id: i64, status: ItemStatus) -> Result<ShoppingItem>;

    async fn delete_item(&self, id: i64) -> Result<()>;

    async fn reorder_items(&self, ids: Vec<i64>) -> Result<()>;

    async fn search_items(&self, list_id: i64, query: String) -> Result<Vec<ShoppingItem>>;

    async fn group_by_category(&self, list_id: i64) -> Result<Vec<(Category, Vec<ShoppingItem>)>>;

    async fn update_list_settings(&self, list_id: i64, settings: ListSettings)
        -> Result<ShoppingList>;

    async fn set_list_completed(&self, list_id: i64, completed: bool) -> Result<ShoppingList>;
}

#[async_trait]
pub trait InboxPort: Send + Sync + 'static {
    async fn load(&self) -> Result<InboxSnapshot>;

    async fn create_input(&self, new: NewUserInput) -> Result<InputWrite>;

    async fn restore_input(&self, input: UserInput) -> Result<InputWrite>;

    async fn get_input_by_id(&self, id: i64) -> Result<Option<UserInput>>;

    async fn update_input(&self, id: i64, new: NewUserInput) -> Result<InputWrite>;

    /// Returns the tag table after the delete
    async fn delete_input(&self, id: i64) -> Result<Vec<Tag>>;

    async fn search_inputs(&self, query: String) -> Result<Vec<UserInput>>;

    async fn get_inputs_by_tag_id(&self, tag_id: i64) -> Result<Vec<UserInput>>;

    async fn group_by_tag(&self) -> Result<Vec<(Tag, Vec<UserInput>)>>;
}

#[async_trait]
pub trait ListsPort: Send + Sync + 'static {
    async fn load_lists(&self) -> Result<Vec<UserList>>;

    async fn create_list(&self, name: String) -> Result<UserList>;

    async fn restore_list(&self, list: UserList, entries: Vec<ListItem>) -> Result<UserList>;

    async fn rename_list(&self, id: i64, name: String) -> Result<UserList>;

    /// Returns the entries removed with the list
    async fn delete_list(&self, id: i64) -> Result<Vec<ListItem>>;

    async fn search_lists(&self, query: String) -> Result<Vec<UserList>>;

    async fn load_items(&self, list_id: i64) -> Result<Vec<ListItem>>;

    async fn create_item(&self, new: NewListItem) -> Result<ListItem>;

    async fn restore_item(&self, item: ListItem) -> Result<ListItem>;

    async fn get_item_by_id(&self, id: i64) -> Result<Option<ListItem>>;

    async fn update_item(&self, item: ListItem) -> Result<ListItem>;

    async fn delete_item(&self, id: i64) -> Result<()>;

    async fn reorder_items(&self, ids: Vec<i64>) -> Result<()>;

    async fn search_items(&self, list_id: Option<i64>, query: String) -> Result<Vec<ListItem>>;

    async fn group_by_kind(&self, list_id: i64) -> Result<Vec<(&'static str, Vec<ListItem>)>>;
}

// =============================================================================
// SQLite implementations
// =============================================================================

#[async_trait]
impl ShoppingPort for Database {
    async fn load(&self, currency_code: String) -> Result<ShoppingSnapshot> {
        self.transaction(move |tx| {
            let repo = ShoppingRepository::new(tx);
            let list = repo.get_or_seed_list(&currency_code)?;
            Ok(ShoppingSnapshot {
                categories: repo.get_categories()?,
                items: repo.get_items_by_list_id(list.id)?,
                list,
            })
        })
        .await
    }

    async fn create_item(&self, new: NewShoppingItem) -> Result<CreatedItem> {
        self.call(move |conn| ShoppingRepository::new(conn).create_item(&new))
            .await
    }

    async fn restore_item(&self, item: ShoppingItem) -> Result<ShoppingItem> {
        self.call(move |conn| ShoppingRepository::new(conn).restore_item(&item))
            .await
    }

    async fn get_item_by_id(&self, id: i64) -> Result<Option<ShoppingItem>> {
        self.call(move |conn| ShoppingRepository::new(conn).get_item_by_id(id))
            .await
    }

    async fn update_item(&self, item: ShoppingItem) -> Result<ShoppingItem> {
        self.call(move |conn| ShoppingRepository::new(conn).update_item(&item))
            .await
    }

    async fn set_item_status(&self, id: i64, status: ItemStatus) -> Result<ShoppingItem> {
        self.call(move |conn| ShoppingRepository::new(conn).set_item_status(id, status))
            .await
    }

    async fn delete_item(&self, id: i64) -> Result<()> {
        self.call(move |conn| ShoppingRepository::new(conn).delete_item(id))
            .await
    }

    async fn reorder_items(&self, ids: Vec<i64>) -> Result<()> {
        self.call(move |conn| ShoppingRepository::new(conn).reorder_items(&ids))
            .await
    }

    async fn search_items(&self, list_id: i64, query: String) -> Result<Vec<ShoppingItem>> {
        self.call(move |conn| ShoppingRepository::new(conn).search_items(list_id, &query))
            .await
    }

    async fn group_by_category(&self, list_id: i64) -> Result<Vec<(Category, Vec<ShoppingItem>)>> {
        self.call(move |conn| ShoppingRepository::new(conn).group_by_category(list_id))
            .await
    }

    async fn update_list_settings(
        &self,
        list_id: i64,
        settings: ListSettings,
    ) -> Result<ShoppingList> {
        self.call(move |conn| {
            ShoppingRepository::new(conn).update_list_settings(list_id, &settings)
        })
        .await
    }

    async fn set_list_completed(&self, list_id: i64, completed: bool) -> Result<ShoppingList> {
        self.call(move |conn| ShoppingRepository::new(conn).set_list_completed(list_id, completed))
            .await
    }
}

#[async_trait]
impl InboxPort for Database {
    async fn load(&self) -> Result<InboxSnapshot> {
        self.transaction(|tx| {
            let repo = InboxRepository::new(tx);
            Ok(InboxSnapshot {
                inputs: repo.get_all_inputs()?,
                tags: repo.get_all_tags()?,
            })
        })
        .await
    }

    async fn create_input(&self, new: NewUserInput) -> Result<InputWrite> {
        self.call(move |conn| InboxRepository::new(conn).create_input(&new))
            .await
    }

    async fn restore_input(&self, input: UserInput) -> Result<InputWrite> {
        self.call(move |conn| InboxRepository::new(conn).restore_input(&input))
            .await
    }

    async fn get_input_by_id(&self, id: i64) -> Result<Option<UserInput>> {
        self.call(move |conn| InboxRepository::new(conn).get_input_by_id(id))
            .await
    }

    async fn update_input(&self, id: i64, new: NewUserInput) -> Result<InputWrite> {
        self.call(move |conn| InboxRepository::new(conn).update_input(id, &new))
            .await
    }

    async fn delete_input(&self, id: i64) -> Result<Vec<Tag>> {
        self.call(move |conn| InboxRepository::new(conn).delete_input(id))
            .await
    }

    async fn search_inputs(&self, query: String) -> Result<Vec<UserInput>> {
        self.call(move |conn| InboxRepository::new(conn).search_inputs(&query))
            .await
    }

    async fn get_inputs_by_tag_id(&self, tag_id: i64) -> Result<Vec<UserInput>> {
        self.call(move |conn| InboxRepository::new(conn).get_inputs_by_tag_id(tag_id))
            .await
    }

    async fn group_by_tag(&self) -> Result<Vec<(Tag, Vec<UserInput>)>> {
        self.call(|conn| InboxRepository::new(conn).group_by_tag())
            .await
    }
}

#[async_trait]
impl ListsPort for Database {
    async fn load_lists(&self) -> Result<Vec<UserList>> {
        self.call(|conn| ListsRepository::new(conn).get_all_lists())
            .await
    }

    async fn create_list(&self, name: String) -> Result<UserList> {
        self.call(move |conn| ListsRepository::new(conn).create_list(&name))
            .await
    }

    async fn restore_list(&self, list: UserList, entries: Vec<ListItem>) -> Result<UserList> {
        self.call(move |conn| ListsRepository::new(conn).restore_list(&list, &entries))
            .await
    }

    async fn rename_list(&self, id: i64, name: String) -> Result<UserList> {
        self.call(move |conn| ListsRepository::new(conn).rename_list(id, &name))
            .await
    }

    async fn delete_list(&self, id: i64) -> Result<Vec<ListItem>> {
        self.call(move |conn| ListsRepository::new(conn).delete_list(id))
            .await
    }

    async fn search_lists(&self, query: String) -> Result<Vec<UserList>> {
        self.call(move |conn| ListsRepository::new(conn).search_lists(&query))
            .await
    }

    async fn load_items(&self, list_id: i64) -> Result<Vec<ListItem>> {
        self.call(move |conn| ListsRepository::new(conn).get_items_by_list_id(list_id))
            .await
    }

    async fn create_item(&self, new: NewListItem) -> Result<ListItem> {
        self.call(move |conn| ListsRepository::new(conn).create_item(&new))
            .await
    }

    async fn restore_item(&self, item: ListItem) -> Result<ListItem> {
        self.call(move |conn| ListsRepository::new(conn).restore_item(&item))
            .await
    }

    async fn get_item_by_id(&self, id: i64) -> Result<Option<ListItem>> {
        self.call(move |conn| ListsRepository::new(conn).get_item_by_id(id))
            .await
    }

    async fn update_item(&self, item: ListItem) -> Result<ListItem> {
        self.call(move |conn| ListsRepository::new(conn).update_item(&item))
            .await
    }

    async fn delete_item(&self, id: i64) -> Result<()> {
        self.call(move |conn| ListsRepository::new(conn).delete_item(id))
            .await
    }

    async fn reorder_items(&self, ids: Vec<i64>) -> Result<()> {
        self.call(move |conn| ListsRepository::new(conn).reorder_items(&ids))
            .await
    }

    async fn search_items(&self, list_id: Option<i64>, query: String) -> Result<Vec<ListItem>> {
        self.call(move |conn| ListsRepository::new(conn).search_items(list_id, &query))
            .await
    }

    async fn group_by_kind(&self, list_id: i64) -> Result<Vec<(&'static str, Vec<ListItem>)>> {
        self.call(move |conn| ListsRepository::new(conn).group_by_kind(list_id))
            .await
    }
}
