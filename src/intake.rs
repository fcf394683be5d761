//! Where a captured line goes
//!
//! On the shopping screen every line becomes a shopping item. Elsewhere a
//! line lands in the list it names (explicitly with `@list`, or the list on
//! screen) when such a list exists, and in the inbox otherwise.

use capture::{ParseContext, ParsedInput};

use crate::error::Result;
use crate::model::{ItemKind, UserList};
use crate::store::filter::same_name;
use crate::store::ItemDraft;
use crate::validation::validate_price;

#[derive(Debug, Clone, PartialEq)]
pub enum Intake {
    Shopping(ItemDraft),
    Entry {
        list: UserList,
        title: String,
        kind: ItemKind,
    },
    /// The raw text, hashtags included
    Inbox(String),
}

/// Fails only when a captured quantity or price is out of range
pub fn route(parsed: &ParsedInput, context: &ParseContext, lists: &[UserList]) -> Result<Intake> {
    if context.is_shopping_list {
        return Ok(Intake::Shopping(ItemDraft::from_parsed(parsed)?));
    }

    let target = parsed
        .target_list(context)
        .and_then(|name| lists.iter().find(|list| same_name(&list.name, name)));

    let intake = match target {
        Some(list) => Intake::Entry {
            list: list.clone(),
            title: parsed.title.clone(),
            kind: entry_kind(parsed)?,
        },
        None => Intake::Inbox(parsed.raw_text.trim().to_string()),
    };
    Ok(intake)
}

/// A quantity or price makes the entry a shopping entry; anything else is a note
fn entry_kind(parsed: &ParsedInput) -> Result<ItemKind> {
    if parsed.quantity.is_none() && parsed.price.is_none() {
        return Ok(ItemKind::note());
    }
    let price_minor = match parsed.price {
        Some(amount) => Some(validate_price(amount)?),
        None => None,
    };
    Ok(ItemKind::Shopping {
        quantity: parsed.quantity.clone(),
        price_minor,
        purchased: false,
    })
}
