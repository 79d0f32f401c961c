use std::cmp::Ordering;
use std::fmt;

use text_size::TextRange;

use super::root::NodeLocation;

/// Inclusive range of locations: from the first leaf of `beg` to the last
/// leaf of `end`.
#[derive(Clone, PartialEq)]
pub struct LocationRange {
    pub beg: NodeLocation,
    pub end: NodeLocation,
}

impl LocationRange {
    pub fn new(beg: NodeLocation, end: NodeLocation) -> Self {
        Self { beg, end }
    }

    /// Range covering exactly one node.
    pub fn single(location: NodeLocation) -> Self {
        Self {
            beg: location.clone(),
            end: location,
        }
    }

    pub fn position(&self) -> usize {
        self.beg.position()
    }

    pub fn end_position(&self) -> usize {
        self.end.end_position()
    }

    /// Bytes from the first token text to the last token text.
    pub fn token_range(&self) -> TextRange {
        let start = self.beg.token_range().start();
        let end = self.end.token_range().end();
        TextRange::new(start, end.max(start))
    }

    /// Bytes including the outer trivia.
    pub fn full_range(&self) -> TextRange {
        let start = self.beg.full_range().start();
        let end = self.end.full_range().end();
        TextRange::new(start, end.max(start))
    }

    pub fn contains(&self, other: &LocationRange) -> bool {
        self.position() <= other.position() && other.end_position() <= self.end_position()
    }

    fn compare(&self, other: &LocationRange) -> Ordering {
        self.beg
            .compare_to(&other.beg, true)
            .then_with(|| self.end.compare_end(&other.end, false))
    }
}

impl fmt::Debug for LocationRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?} .. {:?}]", self.beg, self.end)
    }
}

/// Sort ranges and drop the coarser ones.
///
/// Starts are ordered with `parent_is_greater = true` (the deeper location
/// first), ends with `parent_is_greater = false`. Duplicates are removed, and
/// so is any range that contains another, more specific, range.
pub fn normalize(mut ranges: Vec<LocationRange>) -> Vec<LocationRange> {
    ranges.sort_by(LocationRange::compare);
    ranges.dedup();
    let specific: Vec<bool> = ranges
        .iter()
        .enumerate()
        .map(|(i, r)| {
            !ranges
                .iter()
                .enumerate()
                .any(|(j, o)| i != j && r.contains(o) && !o.contains(r))
        })
        .collect();
    ranges
        .into_iter()
        .zip(specific)
        .filter_map(|(r, keep)| keep.then_some(r))
        .collect()
}
