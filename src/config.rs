//! Runtime configuration

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::validation::validate_currency;

pub const DEFAULT_DATABASE: &str = "listkeep.sqlite3";

pub const DEFAULT_CURRENCY: &str = "BRL";

/// Database path understood as "no file"
pub const IN_MEMORY: &str = ":memory:";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// SQLite file, or `:memory:`
    pub database: PathBuf,
    /// Currency for a newly seeded shopping list
    pub currency_code: String,
    /// Hide purchased items regardless of the list's own default
    pub hide_purchased: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: PathBuf::from(DEFAULT_DATABASE),
            currency_code: DEFAULT_CURRENCY.to_string(),
            hide_purchased: false,
        }
    }
}

impl Config {
    pub fn in_memory() -> Self {
        Self {
            database: PathBuf::from(IN_MEMORY),
            ..Self::default()
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.database.as_os_str() == IN_MEMORY
    }

    pub fn validate(&self) -> Result<()> {
        validate_currency(&self.currency_code)?;
        Ok(())
    }
}
