//! Token recognizers using nom
//!
//! Each recognizer matches one token at the start of its input. The scanner
//! walks the raw text left to right and claims the first match of each token
//! kind that does not overlap an already claimed span.

use nom::{
    IResult,
    branch::alt,
    bytes::complete::{tag, take_while1, take_while_m_n},
    character::complete::{char, digit1, one_of},
    combinator::{opt, recognize},
    error::{Error, ErrorKind},
    sequence::{pair, preceded, tuple},
};

use crate::input::{Highlight, HighlightKind, ParseContext, ParsedInput};

/// Parse one line of captured text. Never fails.
pub fn parse_input(text: &str, context: &ParseContext) -> ParsedInput {
    if text.trim().is_empty() {
        return ParsedInput::empty(text);
    }

    let mut scanner = Scanner::new(text);
    let mut list_name = None;
    let mut section_name = None;
    let mut price = None;
    let mut quantity = None;

    // Only the first `@list` is honored
    if let Some((start, end, (list, section))) = scanner.first_match(|_| true, list_ref) {
        list_name = Some(list.to_string());
        section_name = section.map(str::to_string);
        scanner.claim(HighlightKind::List, start, end);
    }

    if section_name.is_none() {
        let at_word_start = |at: usize| char_before(text, at).map_or(true, char::is_whitespace);
        if let Some((start, end, section)) = scanner.first_match(at_word_start, section_ref) {
            section_name = Some(section.to_string());
            scanner.claim(HighlightKind::Section, start, end);
        }
    }

    if context.is_shopping_list {
        if let Some((start, end, value)) = scanner.first_match(|_| true, price_tag) {
            price = Some(value);
            scanner.claim(HighlightKind::Price, start, end);
        }
    }

    let detached = |at: usize| !char_before(text, at).map_or(false, char::is_alphanumeric);
    if let Some((start, end, value)) = scanner.first_match(detached, quantity_with_unit) {
        quantity = Some(value.trim().to_string());
        scanner.claim(HighlightKind::Quantity, start, end);
    }

    let highlights = scanner.finish();
    let title = remaining_title(text, &highlights);

    ParsedInput {
        title,
        list_name,
        section_name,
        quantity,
        price,
        raw_text: text.to_string(),
        highlights,
    }
}

// ============================================================================
// Scanner
// ============================================================================

struct Scanner<'a> {
    raw: &'a str,
    highlights: Vec<Highlight>,
}

impl<'a> Scanner<'a> {
    fn new(raw: &'a str) -> Self {
        Self {
            raw,
            highlights: Vec::new(),
        }
    }

    fn is_free(&self, start: usize, end: usize) -> bool {
        self.highlights
            .iter()
            .all(|h| end <= h.start || start >= h.end)
    }

    /// First position accepted by `accept` where `recognizer` matches a free span
    fn first_match<T>(
        &self,
        mut accept: impl FnMut(usize) -> bool,
        mut recognizer: impl FnMut(&'a str) -> IResult<&'a str, T>,
    ) -> Option<(usize, usize, T)> {
        let raw = self.raw;
        for (start, _) in raw.char_indices() {
            if !self.is_free(start, start + 1) || !accept(start) {
                continue;
            }
            if let Ok((rest, value)) = recognizer(&raw[start..]) {
                let end = raw.len() - rest.len();
                if end > start && self.is_free(start, end) {
                    return Some((start, end, value));
                }
            }
        }
        None
    }

    fn claim(&mut self, kind: HighlightKind, start: usize, end: usize) {
        self.highlights.push(Highlight {
            kind,
            start,
            end,
            value: self.raw[start..end].to_string(),
        });
    }

    fn finish(mut self) -> Vec<Highlight> {
        self.highlights.sort_by_key(|h| h.start);
        self.highlights
    }
}

fn char_before(text: &str, at: usize) -> Option<char> {
    text[..at].chars().next_back()
}

/// Text left once every highlight is cut out, whitespace collapsed
fn remaining_title(raw: &str, highlights: &[Highlight]) -> String {
    let mut kept = String::with_capacity(raw.len());
    let mut cursor = 0;
    for h in highlights {
        kept.push_str(&raw[cursor..h.start]);
        kept.push(' ');
        cursor = h.end;
    }
    kept.push_str(&raw[cursor..]);

    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ============================================================================
// Recognizers
// ============================================================================

fn is_list_char(c: char) -> bool {
    !c.is_whitespace() && c != ':'
}

fn is_section_char(c: char) -> bool {
    !c.is_whitespace()
}

/// `@list` or `@list:section`
fn list_ref(input: &str) -> IResult<&str, (&str, Option<&str>)> {
    preceded(
        char('@'),
        pair(
            take_while1(is_list_char),
            opt(preceded(char(':'), take_while1(is_section_char))),
        ),
    )(input)
}

/// `:section`
fn section_ref(input: &str) -> IResult<&str, &str> {
    preceded(char(':'), take_while1(is_section_char))(input)
}

/// `R$8,50`, `R$ 12`, `R$3.5`
fn price_tag(input: &str) -> IResult<&str, f64> {
    let (input, _) = tag("R$")(input)?;
    let (input, _) = opt(char(' '))(input)?;
    let (input, whole) = digit1(input)?;
    let (input, fraction) = opt(preceded(
        one_of(".,"),
        take_while_m_n(1, 2, |c: char| c.is_ascii_digit()),
    ))(input)?;

    let text = match fraction {
        Some(fraction) => format!("{}.{}", whole, fraction),
        None => whole.to_string(),
    };
    Ok((input, text.parse::<f64>().unwrap_or(0.0)))
}

fn decimal(input: &str) -> IResult<&str, &str> {
    recognize(pair(digit1, opt(pair(one_of(".,"), digit1))))(input)
}

fn unit(input: &str) -> IResult<&str, &str> {
    // Longer units first so `kg` is not read as `k` + junk
    alt((
        tag("peça"),
        tag("pç"),
        tag("kg"),
        tag("ml"),
        tag("un"),
        tag("pc"),
        tag("dz"),
        tag("cx"),
        tag("g"),
        tag("l"),
        tag("L"),
    ))(input)
}

/// `2L`, `1,5 kg`, `12un`; a bare number is not a quantity
fn quantity_with_unit(input: &str) -> IResult<&str, &str> {
    let (rest, matched) = recognize(tuple((decimal, opt(char(' ')), unit)))(input)?;
    if rest.chars().next().map_or(false, char::is_alphanumeric) {
        return Err(nom::Err::Error(Error::new(input, ErrorKind::Verify)));
    }
    Ok((rest, matched))
}
