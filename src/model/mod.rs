//! Domain records shared by repositories and stores

pub mod identity;
pub mod inbox;
pub mod list;
pub mod shopping;

pub use identity::{Identity, LocalToken};
pub use inbox::{extract_tags, InputWrite, NewUserInput, Tag, UserInput};
pub use list::{format_minor, ItemKind, ListItem, NewListItem, UserList};
pub use shopping::{
    Category, CategoryRef, CreatedItem, ItemStatus, ListSettings, NewShoppingItem, PriceSource,
    Quantity, ShoppingItem, ShoppingList,
};
