//! Capture - free-text command parser
//!
//! Turns one line of typed text into a structured intent, with byte offsets
//! for highlighting the recognized tokens while the user types.
//!
//! # Syntax Overview
//!
//! ```text
//! Leite Integral 2L R$8,50 @Mercado:Laticínios
//! ^^^^^^^^^^^^^^ ^^ ^^^^^^ ^^^^^^^^^^^^^^^^^^^^
//! title          |  price  list + section
//!                quantity
//! ```
//!
//! - `@list` - target list; only the first one counts
//! - `@list:section` or ` :section` - target section
//! - `R$ 12,90` - price, only when parsing for a shopping list
//! - `2L`, `1,5 kg`, `3un` - quantity; the unit is mandatory
//!
//! Parsing is total: anything that is not a token stays in the title.

mod input;
mod parser;

pub use input::*;

/// Parse a line of captured text
pub fn parse(text: &str, context: &ParseContext) -> ParsedInput {
    parser::parse_input(text, context)
}
