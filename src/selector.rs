//! Page, sheet and slide selectors.
//!
//! A selector is the text a user types to restrict which parts of a document
//! get converted:
//! - `""` - everything
//! - `"3"` - a single page
//! - `"2-4"` - an inclusive range
//! - `"1,3,5-7"` - any combination
//!
//! Zero and negative indices are dropped rather than rejected, so `"0,-1,2"`
//! selects only page 2, however far below zero they go. Tokens that are not
//! numbers at all, or that name an index above [`MAX_INDEX`], fail the whole
//! parse.

use std::collections::BTreeSet;
use std::fmt;
use std::num::IntErrorKind;

use crate::error::{PipelineError, Result};

/// Highest index a selector may name.
///
/// This is a hard limit, not a document size: a typo such as `1-99999999`
/// is rejected instead of expanding into a huge set.
pub const MAX_INDEX: u32 = 65_535;

/// A parsed selector: a sorted, deduplicated set of 1-based indices.
///
/// An empty selection means "all pages/sheets/slides"; interpreting that is
/// up to the renderer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageSelection {
    pages: BTreeSet<u32>,
}

impl PageSelection {
    /// A selection of every page.
    pub fn all() -> Self {
        Self::default()
    }

    /// Parse a selector string.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidPageRange`] if any token is neither an
    /// integer nor a two-sided `start-end` range, or if it names an index
    /// above [`MAX_INDEX`].
    ///
    /// # Examples
    ///
    /// ```
    /// use pdfbinder::selector::PageSelection;
    ///
    /// let selection = PageSelection::parse("3,1-2,2").unwrap();
    /// assert_eq!(selection.pages(), vec![1, 2, 3]);
    /// assert!(PageSelection::parse("").unwrap().is_all());
    /// ```
    pub fn parse(selector: &str) -> Result<Self> {
        let mut pages = BTreeSet::new();

        for token in selector.split(',') {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }

            let (start, end) = parse_token(token)
                .ok_or_else(|| PipelineError::invalid_page_range(selector, token))?;

            if start.max(end) > i64::from(MAX_INDEX) {
                return Err(PipelineError::invalid_page_range(selector, token));
            }

            // Zero and negatives fall out of this clamp.
            for page in start.max(1)..=end {
                pages.insert(page as u32);
            }
        }

        Ok(Self { pages })
    }

    /// True when no explicit index was selected.
    pub fn is_all(&self) -> bool {
        self.pages.is_empty()
    }

    /// Selected indices in ascending order.
    pub fn pages(&self) -> Vec<u32> {
        self.pages.iter().copied().collect()
    }

    /// Indices that exceed a document of `total` pages.
    pub fn out_of_range(&self, total: u32) -> Vec<u32> {
        self.pages.range(total.saturating_add(1)..).copied().collect()
    }

    /// Concrete page list for a document of `total` pages.
    ///
    /// An "all" selection expands to `1..=total`; explicit indices beyond
    /// `total` are skipped.
    pub fn resolve(&self, total: u32) -> Vec<u32> {
        if self.is_all() {
            (1..=total).collect()
        } else {
            self.pages.range(..=total).copied().collect()
        }
    }
}

impl fmt::Display for PageSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_all() {
            return write!(f, "all");
        }
        let parts: Vec<String> = self.pages.iter().map(u32::to_string).collect();
        write!(f, "{}", parts.join(","))
    }
}

/// Split one token into an inclusive `(start, end)` pair.
///
/// The range separator is the first `-` after the first character, so a
/// leading minus sign still reads as a (negative) number.
fn parse_token(token: &str) -> Option<(i64, i64)> {
    if let Some(single) = parse_index(token) {
        return Some((single, single));
    }

    let split_at = token
        .char_indices()
        .skip(1)
        .find(|(_, c)| *c == '-')
        .map(|(idx, _)| idx)?;

    let start = parse_index(&token[..split_at])?;
    let end = parse_index(&token[split_at + 1..])?;
    Some((start, end))
}

/// Parse one index, saturating at the bounds of `i64`.
///
/// A huge negative number still reads as negative and is dropped; a huge
/// positive one still trips [`MAX_INDEX`].
fn parse_index(text: &str) -> Option<i64> {
    let text = text.trim();
    match text.parse::<i64>() {
        Ok(value) => Some(value),
        // Overflow can be reported before a later stray character is seen.
        Err(_) if !is_integer(text) => None,
        Err(err) => match err.kind() {
            IntErrorKind::PosOverflow => Some(i64::MAX),
            IntErrorKind::NegOverflow => Some(i64::MIN),
            _ => None,
        },
    }
}

fn is_integer(text: &str) -> bool {
    let digits = text.strip_prefix(['-', '+']).unwrap_or(text);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}
