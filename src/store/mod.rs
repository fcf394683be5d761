//! In-memory stores with optimistic writes
//!
//! One [`OptimisticStore`] per aggregate; the aggregate modules only supply
//! the projection and the apply/persist/reconcile steps of each action.

pub mod filter;
pub mod inbox;
pub mod lists;
pub mod optimistic;
pub mod pricing;
pub mod shopping;

pub use filter::Query;
pub use inbox::{InboxContext, InboxFilter, InboxProjection, InboxStore, InboxView};
pub use lists::{
    ItemsContext, ItemsFilter, ItemsProjection, ItemsStore, ItemsView, KindGroup, ListsContext,
    ListsFilter, ListsProjection, ListsStore, ListsView,
};
pub use optimistic::{Base, OptimisticStore, Projection, Record, StoreState};
pub use pricing::PriceEdit;
pub use shopping::{
    CategoryGroup, ItemDraft, ItemPatch, ShoppingContext, ShoppingFilter, ShoppingProjection,
    ShoppingStore, ShoppingSummary, ShoppingView,
};
