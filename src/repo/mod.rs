//! Repositories, one per aggregate
//!
//! Every repository borrows an [`Executor`](crate::db::Executor). Built on a
//! connection, multi-table writes open their own transaction; built on a
//! transaction, they join it. Nested repositories are created from inside a
//! `transaction` callback so the whole write is one atomic unit.

pub mod inbox;
pub mod lists;
pub mod shopping;

pub use inbox::InboxRepository;
pub use lists::ListsRepository;
pub use shopping::{ShoppingRepository, DEFAULT_CATEGORY, PREDEFINED_CATEGORIES};

use std::collections::HashSet;

use crate::error::Result;
use crate::validation::ValidationError;

/// `%query%` for `LIKE ... ESCAPE '\'`, with wildcards in the query escaped
pub(crate) fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.trim().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// `ids` has no repeats and covers a bucket of `size` items
pub(crate) fn check_full_order<T: Eq + std::hash::Hash>(ids: &[T], size: usize) -> Result<()> {
    let distinct: HashSet<&T> = ids.iter().collect();
    if distinct.len() != ids.len() {
        return Err(ValidationError::InvalidOrder("an item is listed twice").into());
    }
    if ids.len() != size {
        let reason = "every item of the bucket must be listed";
        return Err(ValidationError::InvalidOrder(reason).into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("milk"), "%milk%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }
}
