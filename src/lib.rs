//! listkeep - offline-first lists, shopping and inbox capture
//!
//! One line of free text is parsed, routed to the right aggregate and applied
//! optimistically; SQLite catches up behind it.
//!
//! # Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          listkeep App                           │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐  ┌─────────────┐                               │
//! │  │  capture    │  │   intake    │   "Leite 2L R$8,50 @Mercado"  │
//! │  │  (parser)   ├─▶│  (routing)  │                               │
//! │  └─────────────┘  └──────┬──────┘                               │
//! │                          ▼                                      │
//! │  ┌─────────────────────────────────────────────────────────────┐│
//! │  │                 Optimistic Stores                           ││
//! │  │  ┌──────────┐  ┌──────────┐  ┌──────────┐  ┌──────────┐     ││
//! │  │  │ Shopping │  │  Inbox   │  │  Lists   │  │  Items   │     ││
//! │  │  └────┬─────┘  └────┬─────┘  └────┬─────┘  └────┬─────┘     ││
//! │  │       └─────────────┴──── ports ──┴─────────────┘           ││
//! │  └──────────────────────────┬──────────────────────────────────┘│
//! │                             ▼                                   │
//! │  ┌─────────────────────────────────────────────────────────────┐│
//! │  │        Repositories (generic over Executor)                 ││
//! │  └──────────────────────────┬──────────────────────────────────┘│
//! │                             ▼                                   │
//! │  ┌─────────────────────────────────────────────────────────────┐│
//! │  │   Database: SQLite connection, migrations, blocking pool    ││
//! │  └─────────────────────────────────────────────────────────────┘│
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod db;
pub mod error;
pub mod intake;
pub mod model;
pub mod ports;
pub mod repo;
pub mod store;
pub mod validation;

pub use capture::{parse, Highlight, HighlightKind, ParseContext, ParsedInput};
pub use config::Config;
pub use db::Database;
pub use error::{ActionKind, Error, Result, StoreError};
pub use intake::Intake;

use std::sync::Arc;

use model::{ListItem, ShoppingItem, UserInput, UserList};
use store::{InboxStore, ItemsStore, ListsStore, ShoppingStore};

/// The application handle: one database and a store per aggregate
pub struct App {
    pub config: Config,
    pub db: Database,
    pub shopping: ShoppingStore<Database>,
    pub inbox: InboxStore<Database>,
    pub lists: ListsStore<Database>,
    /// Entries of whichever list was opened last
    pub items: ItemsStore<Database>,
}

impl App {
    /// Open the configured database and load every store
    pub async fn open(config: Config) -> Result<Self> {
        config.validate()?;
        let db = if config.is_in_memory() {
            Database::open_in_memory()?
        } else {
            Database::open(&config.database)?
        };
        Self::with_database(db, config).await
    }

    pub async fn with_database(db: Database, config: Config) -> Result<Self> {
        let port = Arc::new(db.clone());
        let app = Self {
            shopping: ShoppingStore::new(Arc::clone(&port), config.currency_code.clone()),
            inbox: InboxStore::new(Arc::clone(&port)),
            lists: ListsStore::new(Arc::clone(&port)),
            items: ItemsStore::new(port),
            db,
            config,
        };

        app.shopping.load().await?;
        if app.config.hide_purchased {
            app.shopping.set_hide_purchased(true);
        }
        app.inbox.load().await?;
        app.lists.load().await?;
        Ok(app)
    }

    /// Parse a line and apply it wherever it belongs
    pub async fn capture(&self, text: &str, context: &ParseContext) -> Result<Captured> {
        let parsed = capture::parse(text, context);
        match intake::route(&parsed, context, &self.lists.lists())? {
            Intake::Shopping(draft) => {
                let item = self.shopping.add_item(draft).await?;
                Ok(Captured::ShoppingItem(item))
            }
            Intake::Entry { list, title, kind } => {
                self.open_list(&list).await?;
                let item = self.items.add(&title, kind).await?;
                Ok(Captured::Entry { list, item })
            }
            Intake::Inbox(text) => {
                let input = self.inbox.create(&text).await?;
                Ok(Captured::Inbox(input))
            }
        }
    }

    /// Point the items store at `list`, loading it unless it is already open
    pub async fn open_list(&self, list: &UserList) -> Result<()> {
        let id = list.id.require("list")?;
        if self.items.list_id() != Some(id) {
            self.items.load(id).await?;
        }
        Ok(())
    }
}

/// What a captured line turned into
#[derive(Debug, Clone, PartialEq)]
pub enum Captured {
    ShoppingItem(ShoppingItem),
    Entry { list: UserList, item: ListItem },
    Inbox(UserInput),
}
