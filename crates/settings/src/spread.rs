//! Page spreads for double-page reading.

use crate::reader::ReadingDirection;
use serde::Serialize;

/// Pixel dimensions of one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSize {
    pub width: u32,
    pub height: u32,
}

impl PageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Wider than tall: already a two-page spread on its own.
    pub fn is_wide(&self) -> bool {
        self.width > self.height
    }
}

/// What is shown on screen at once, by page index. Pairs are in screen order
/// (left, right), so right-to-left reading puts the later page on the left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Spread {
    Single(usize),
    Double(usize, usize),
}

impl Spread {
    pub fn contains(&self, page: usize) -> bool {
        match *self {
            Self::Single(index) => index == page,
            Self::Double(left, right) => left == page || right == page,
        }
    }
}

/// Group pages into spreads, in reading order.
///
/// Consecutive portrait pages pair up; a wide page always stands alone and
/// breaks pairing. With `offset_first`, the first page is shown alone so that
/// books whose spreads start on an even page line up.
pub fn spreads(pages: &[PageSize], offset_first: bool, direction: ReadingDirection) -> Vec<Spread> {
    let pair = |first: usize, second: usize| match direction {
        ReadingDirection::Ltr => Spread::Double(first, second),
        ReadingDirection::Rtl => Spread::Double(second, first),
    };
    let mut spreads = Vec::with_capacity(pages.len().div_ceil(2));
    let mut pending: Option<usize> = None;
    for (index, page) in pages.iter().enumerate() {
        if page.is_wide() || (offset_first && index == 0) {
            spreads.extend(pending.take().map(Spread::Single));
            spreads.push(Spread::Single(index));
            continue;
        }
        match pending.take() {
            Some(first) => spreads.push(pair(first, index)),
            None => pending = Some(index),
        }
    }
    spreads.extend(pending.map(Spread::Single));
    spreads
}

/// Index of the spread showing `page`.
pub fn spread_of(spreads: &[Spread], page: usize) -> Option<usize> {
    spreads.iter().position(|spread| spread.contains(page))
}
