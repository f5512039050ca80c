//! Side Book - one side of the book with lazily cleaned price priority.
//!
//! A `BinaryHeap` of prices (best first for this side) sits beside a
//! `price -> PriceLevelQueue` map. Cancels and fills only touch the map and
//! the queues, so they never pay a heap operation. The heap may therefore
//! hold *stale* prices whose queue has drained; [`SideBook::get_best_order`]
//! pops them the next time someone asks for the best price.
//!
//! Map entries are dropped at the same point their heap entry is popped.
//! Every map key thus has exactly one heap entry, and refilling a drained
//! level before cleanup reaches it reuses both.

use std::cmp::Ordering;
use std::collections::hash_map::Entry;
use std::collections::BinaryHeap;

use rustc_hash::FxHashMap;
use tracing::trace;

use crate::arena::{Arena, ArenaIndex};
use crate::command::{Order, OrderId, Price, Quantity, Side};
use crate::error::BookError;
use crate::price_level::PriceLevelQueue;

/// Heap key: a price ranked by how aggressive it is on `side`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct LevelKey {
    side: Side,
    price: Price,
}

impl Ord for LevelKey {
    fn cmp(&self, other: &Self) -> Ordering {
        debug_assert_eq!(self.side, other.side);
        self.side.priority(self.price, other.price)
    }
}

impl PartialOrd for LevelKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Aggregate view of one live price level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DepthLevel {
    pub price: Price,
    pub total_qty: Quantity,
    pub order_count: usize,
}

/// All resting orders on one side of one instrument.
#[derive(Debug)]
pub struct SideBook {
    side: Side,
    arena: Arena,
    prices: BinaryHeap<LevelKey>,
    levels: FxHashMap<Price, PriceLevelQueue>,
    order_count: usize,
}

impl SideBook {
    pub fn new(side: Side) -> Self {
        Self::with_capacity(side, 0, 0)
    }

    /// Pre-allocate room for `orders` resting orders spread over `levels` prices.
    pub fn with_capacity(side: Side, orders: u32, levels: usize) -> Self {
        Self {
            side,
            arena: Arena::with_capacity(orders),
            prices: BinaryHeap::with_capacity(levels),
            levels: FxHashMap::with_capacity_and_hasher(levels, Default::default()),
            order_count: 0,
        }
    }

    #[inline]
    pub fn side(&self) -> Side {
        self.side
    }

    /// Rest an order at the tail of its price level.
    ///
    /// Creates the level and pushes its price onto the heap only if the price
    /// has no map entry. A drained level still awaiting cleanup is reused as
    /// is, so its single heap entry keeps covering it.
    ///
    /// # Errors
    /// `DuplicateId` if the id is already queued at that price.
    ///
    /// # Complexity
    /// O(1) for an existing level, O(log P) for a new one
    pub fn add_order(&mut self, order: Order) -> Result<ArenaIndex, BookError> {
        debug_assert_eq!(order.side, self.side);

        let level = match self.levels.entry(order.price) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                self.prices.push(LevelKey {
                    side: self.side,
                    price: order.price,
                });
                entry.insert(PriceLevelQueue::new())
            }
        };

        let index = level.append(&mut self.arena, order)?;
        self.order_count += 1;
        Ok(index)
    }

    /// Oldest order at the best live price, purging stale prices on the way.
    ///
    /// This is the only place the heap is popped.
    ///
    /// # Complexity
    /// O(1) amortized, O(k log P) when k stale prices sit on top
    pub fn get_best_order(&mut self) -> Option<Order> {
        loop {
            let price = self.prices.peek()?.price;

            match self.levels.get(&price) {
                Some(level) if !level.is_empty() => return level.peek_front(&self.arena),
                _ => {
                    self.prices.pop();
                    self.levels.remove(&price);
                    trace!(side = ?self.side, price, "purged stale price level");
                }
            }
        }
    }

    /// Best live price; same cleanup side effect as [`get_best_order`](Self::get_best_order).
    #[inline]
    pub fn get_best_price(&mut self) -> Option<Price> {
        self.get_best_order().map(|order| order.price)
    }

    /// Detach an order from its level. Never touches the heap, even when the
    /// level drains.
    ///
    /// # Errors
    /// `NotFound` if no order with that id rests at `price`.
    ///
    /// # Complexity
    /// O(1)
    pub fn remove_order(&mut self, order_id: OrderId, price: Price) -> Result<Order, BookError> {
        let level = self
            .levels
            .get_mut(&price)
            .ok_or(BookError::NotFound { order_id })?;

        let order = level.remove(&mut self.arena, order_id)?;
        self.order_count -= 1;
        Ok(order)
    }

    /// Reduce a resting order's quantity in place. Returns what is left.
    ///
    /// # Errors
    /// `NotFound` if no order with that id rests at `price`, `InvalidQuantity`
    /// if `qty` exceeds its remaining quantity.
    pub fn fill_order(
        &mut self,
        order_id: OrderId,
        price: Price,
        qty: Quantity,
    ) -> Result<Quantity, BookError> {
        self.levels
            .get_mut(&price)
            .ok_or(BookError::NotFound { order_id })?
            .fill(&mut self.arena, order_id, qty)
    }

    // ========================================================================
    // Read-only inspection (no cleanup)
    // ========================================================================

    /// Aggregate resting quantity at `price`; 0 if nothing rests there.
    pub fn quantity_at(&self, price: Price) -> Quantity {
        self.levels.get(&price).map_or(0, PriceLevelQueue::total_qty)
    }

    /// Number of orders resting at `price`.
    pub fn orders_at(&self, price: Price) -> usize {
        self.levels.get(&price).map_or(0, PriceLevelQueue::len)
    }

    /// Orders resting at `price` in FIFO order.
    pub fn level_orders(&self, price: Price) -> Vec<Order> {
        self.levels
            .get(&price)
            .map(|level| level.iter(&self.arena).copied().collect())
            .unwrap_or_default()
    }

    /// Up to `max_levels` live levels, best price first.
    ///
    /// Sorts the live levels instead of walking the heap, so stale entries
    /// are skipped without being purged.
    pub fn depth(&self, max_levels: usize) -> Vec<DepthLevel> {
        let mut live: Vec<DepthLevel> = self
            .levels
            .iter()
            .filter(|(_, level)| !level.is_empty())
            .map(|(&price, level)| DepthLevel {
                price,
                total_qty: level.total_qty(),
                order_count: level.len(),
            })
            .collect();

        live.sort_unstable_by(|a, b| self.side.priority(b.price, a.price));
        live.truncate(max_levels);
        live
    }

    pub fn get_order(&self, order_id: OrderId, price: Price) -> Option<&Order> {
        self.levels.get(&price)?.get(&self.arena, order_id)
    }

    #[inline]
    pub fn order_count(&self) -> usize {
        self.order_count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order_count == 0
    }

    /// Prices currently in the heap, live and stale.
    #[inline]
    pub fn tracked_prices(&self) -> usize {
        self.prices.len()
    }

    pub fn warm_up(&mut self) {
        self.arena.warm_up();
    }
}
