//! One side of the book as a price-ordered, price-unique level sequence.
//!
//! Levels live in a contiguous `Vec` sorted best-first. Updates locate their
//! slot with a binary search, so an upsert costs O(log n) to find plus the
//! shift of the tail on insert/remove. Depth books are shallow (tens of
//! levels), which keeps the shift cheap and copies for publishing compact.

use std::cmp::Ordering;

use crate::types::{Price, PriceLevel, Quantity};

/// Sort order of a book side, best level first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideOrder {
    /// Lowest price first (asks)
    Ascending,
    /// Highest price first (bids)
    Descending,
}

impl SideOrder {
    /// Compare two prices in this side's order
    #[must_use]
    pub fn compare(self, a: &Price, b: &Price) -> Ordering {
        match self {
            SideOrder::Ascending => a.cmp(b),
            SideOrder::Descending => b.cmp(a),
        }
    }
}

/// What an upsert did to the side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelChange {
    /// New price level added
    Inserted,
    /// Existing level's quantity replaced
    Updated,
    /// Existing level removed (zero quantity)
    Removed,
    /// Zero quantity for a price that was not present
    Ignored,
}

/// One side of an order book
///
/// Invariants: levels are strictly ordered by [`SideOrder`], no two levels
/// share a price, and no level has zero quantity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookSide {
    order: SideOrder,
    levels: Vec<PriceLevel>,
}

impl BookSide {
    /// Create an empty side with the given order
    #[must_use]
    pub fn new(order: SideOrder) -> Self {
        Self {
            order,
            levels: Vec::new(),
        }
    }

    /// Empty ask side (ascending)
    #[must_use]
    pub fn asks() -> Self {
        Self::new(SideOrder::Ascending)
    }

    /// Empty bid side (descending)
    #[must_use]
    pub fn bids() -> Self {
        Self::new(SideOrder::Descending)
    }

    /// Build a side from levels in any order
    ///
    /// Zero quantities are dropped and a repeated price keeps its last
    /// quantity.
    pub fn from_levels(order: SideOrder, levels: impl IntoIterator<Item = PriceLevel>) -> Self {
        let levels = levels.into_iter();
        let mut side = Self {
            order,
            levels: Vec::with_capacity(levels.size_hint().0),
        };
        for level in levels {
            side.upsert(level);
        }
        side
    }

    /// Apply one level update
    ///
    /// A zero quantity removes the price if present and is otherwise a no-op;
    /// any other quantity replaces the existing level or inserts a new one at
    /// its sorted position.
    pub fn upsert(&mut self, level: PriceLevel) -> LevelChange {
        let order = self.order;
        let slot = self
            .levels
            .binary_search_by(|entry| order.compare(&entry.price, &level.price));

        match slot {
            Ok(index) if level.is_removal() => {
                self.levels.remove(index);
                LevelChange::Removed
            }
            Ok(index) => {
                self.levels[index] = level;
                LevelChange::Updated
            }
            Err(_) if level.is_removal() => LevelChange::Ignored,
            Err(index) => {
                self.levels.insert(index, level);
                LevelChange::Inserted
            }
        }
    }

    /// Sort order of this side
    #[must_use]
    pub fn order(&self) -> SideOrder {
        self.order
    }

    /// Best level (first in order)
    #[must_use]
    pub fn best(&self) -> Option<PriceLevel> {
        self.levels.first().copied()
    }

    /// Quantity resting at a price
    #[must_use]
    pub fn quantity_at(&self, price: &Price) -> Option<Quantity> {
        let order = self.order;
        self.levels
            .binary_search_by(|entry| order.compare(&entry.price, price))
            .ok()
            .map(|index| self.levels[index].quantity)
    }

    /// All levels, best first
    #[must_use]
    pub fn levels(&self) -> &[PriceLevel] {
        &self.levels
    }

    /// Iterate over levels, best first
    pub fn iter(&self) -> impl Iterator<Item = &PriceLevel> + '_ {
        self.levels.iter()
    }

    /// The best `n` levels
    #[must_use]
    pub fn top(&self, n: usize) -> &[PriceLevel] {
        &self.levels[..n.min(self.levels.len())]
    }

    /// Sum of quantities over all levels
    #[must_use]
    pub fn total_quantity(&self) -> Quantity {
        self.levels.iter().map(|l| l.quantity).sum()
    }

    /// Number of levels
    #[must_use]
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Check if the side has no levels
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Remove all levels
    pub fn clear(&mut self) {
        self.levels.clear();
    }
}
