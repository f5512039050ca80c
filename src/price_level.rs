//! Price Level - A FIFO queue of orders at a single price point.
//!
//! Implements a doubly-linked list over arena indices plus an
//! `order_id -> index` map, giving O(1) append at the tail and O(1)
//! removal from any position (head, tail or interior).

use rustc_hash::FxHashMap;

use crate::arena::{Arena, ArenaIndex, NULL_INDEX};
use crate::command::{Order, OrderId, Quantity};
use crate::error::BookError;

/// Queue of resting orders at one price, oldest first.
///
/// The id map's keys are exactly the ids of the linked nodes. The queue knows
/// nothing about whether its price is still tracked by the owning side.
#[derive(Debug)]
pub struct PriceLevelQueue {
    /// Oldest order (first to match)
    head: ArenaIndex,
    /// Newest order (last to match)
    tail: ArenaIndex,
    /// Sum of remaining quantity across the level
    total_qty: Quantity,
    index: FxHashMap<OrderId, ArenaIndex>,
}

impl PriceLevelQueue {
    pub fn new() -> Self {
        Self {
            head: NULL_INDEX,
            tail: NULL_INDEX,
            total_qty: 0,
            index: FxHashMap::default(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.head == NULL_INDEX
    }

    /// Number of orders at this level
    #[inline]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Aggregate remaining quantity at this level
    #[inline]
    pub fn total_qty(&self) -> Quantity {
        self.total_qty
    }

    #[inline]
    pub fn contains(&self, order_id: OrderId) -> bool {
        self.index.contains_key(&order_id)
    }

    /// Append an order at the tail (newest position).
    ///
    /// # Errors
    /// `DuplicateId` if the order id is already queued here, `LevelOverflow`
    /// if the level total would pass `u64::MAX`.
    ///
    /// # Complexity
    /// O(1)
    pub fn append(&mut self, arena: &mut Arena, order: Order) -> Result<ArenaIndex, BookError> {
        if self.index.contains_key(&order.id) {
            return Err(BookError::DuplicateId { order_id: order.id });
        }
        let total_qty = self
            .total_qty
            .checked_add(order.remaining_qty)
            .ok_or(BookError::LevelOverflow {
                price: order.price,
                qty: order.remaining_qty,
            })?;

        let index = arena.alloc(order);

        if self.tail == NULL_INDEX {
            debug_assert!(self.head == NULL_INDEX);
            self.head = index;
        } else {
            arena.get_mut(self.tail).next = index;
            arena.get_mut(index).prev = self.tail;
        }
        self.tail = index;

        self.total_qty = total_qty;
        self.index.insert(order.id, index);
        Ok(index)
    }

    /// Detach an order from wherever it sits and free its node.
    ///
    /// Handles all positions:
    /// - Only node in level (head == tail)
    /// - Removing head
    /// - Removing tail
    /// - Removing from middle
    ///
    /// # Errors
    /// `NotFound` if the id is not queued here.
    ///
    /// # Complexity
    /// O(1)
    pub fn remove(&mut self, arena: &mut Arena, order_id: OrderId) -> Result<Order, BookError> {
        let index = self
            .index
            .remove(&order_id)
            .ok_or(BookError::NotFound { order_id })?;

        let node = arena.get(index);
        let prev_idx = node.prev;
        let next_idx = node.next;
        let order = node.order;

        if prev_idx == NULL_INDEX && next_idx == NULL_INDEX {
            debug_assert!(self.head == index && self.tail == index);
            self.head = NULL_INDEX;
            self.tail = NULL_INDEX;
        } else if prev_idx == NULL_INDEX {
            debug_assert!(self.head == index);
            self.head = next_idx;
            arena.get_mut(next_idx).prev = NULL_INDEX;
        } else if next_idx == NULL_INDEX {
            debug_assert!(self.tail == index);
            self.tail = prev_idx;
            arena.get_mut(prev_idx).next = NULL_INDEX;
        } else {
            arena.get_mut(prev_idx).next = next_idx;
            arena.get_mut(next_idx).prev = prev_idx;
        }

        debug_assert!(self.total_qty >= order.remaining_qty);
        self.total_qty -= order.remaining_qty;
        arena.free(index);

        Ok(order)
    }

    /// Reduce a queued order's remaining quantity in place, keeping its
    /// position. Returns the new remaining quantity, which may be zero; the
    /// caller must then [`remove`](Self::remove) the order.
    ///
    /// # Errors
    /// `NotFound` if the id is not queued here, `InvalidQuantity` if `qty`
    /// exceeds the order's remaining quantity.
    pub fn fill(
        &mut self,
        arena: &mut Arena,
        order_id: OrderId,
        qty: Quantity,
    ) -> Result<Quantity, BookError> {
        let &index = self
            .index
            .get(&order_id)
            .ok_or(BookError::NotFound { order_id })?;

        let order = &mut arena.get_mut(index).order;
        if qty > order.remaining_qty {
            return Err(BookError::InvalidQuantity(qty));
        }
        order.remaining_qty -= qty;
        self.total_qty -= qty;

        Ok(order.remaining_qty)
    }

    /// Oldest order at this level, without removing it.
    #[inline]
    pub fn peek_front(&self, arena: &Arena) -> Option<Order> {
        (self.head != NULL_INDEX).then(|| arena.get(self.head).order)
    }

    /// Look up a queued order by id.
    #[inline]
    pub fn get<'a>(&self, arena: &'a Arena, order_id: OrderId) -> Option<&'a Order> {
        self.index.get(&order_id).map(|&index| &arena.get(index).order)
    }

    /// Walk the queue in FIFO order.
    pub fn iter<'a>(&self, arena: &'a Arena) -> LevelIter<'a> {
        LevelIter {
            arena,
            cursor: self.head,
        }
    }
}

impl Default for PriceLevelQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// FIFO iterator over a [`PriceLevelQueue`].
pub struct LevelIter<'a> {
    arena: &'a Arena,
    cursor: ArenaIndex,
}

impl<'a> Iterator for LevelIter<'a> {
    type Item = &'a Order;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == NULL_INDEX {
            return None;
        }
        let node = self.arena.get(self.cursor);
        self.cursor = node.next;
        Some(&node.order)
    }
}
