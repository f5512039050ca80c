//! Order Book - both sides of one instrument plus the book-wide id index.
//!
//! Placement and matching live in [`crate::matching`]; this module owns the
//! state, cancellation, id/sequence allocation and read access.
//!
//! Only the best-price getters (`get_best_*`, `best_*`, `spread`) purge stale
//! levels, which is why they take `&mut self`. Everything else that reads is
//! `&self` and skips stale levels without removing them.

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::arena::NULL_INDEX;
use crate::command::{Order, OrderId, Price, Quantity, Sequence, Side};
use crate::config::BookConfig;
use crate::error::{BookError, ConfigError};
use crate::side_book::{DepthLevel, SideBook};

/// Where an active order rests. Enough to reach its level in O(1).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OrderInfo {
    pub side: Side,
    pub price: Price,
}

/// Outcome of a successful cancel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CancelResult {
    pub order_id: OrderId,
    pub side: Side,
    pub price: Price,
    /// Quantity that was still open when the order was pulled
    pub canceled_qty: Quantity,
}

/// Single-instrument limit order book.
pub struct OrderBook {
    pub(crate) config: BookConfig,
    pub(crate) bids: SideBook,
    pub(crate) asks: SideBook,
    /// Active order id -> location. An id is here iff it is queued on a side
    /// (or is the incoming order currently being matched).
    pub(crate) orders: FxHashMap<OrderId, OrderInfo>,
    /// Next auto-assigned id; `None` once `u64::MAX` has been taken.
    next_order_id: Option<OrderId>,
    next_sequence: Sequence,
}

impl OrderBook {
    /// Empty book with the default configuration.
    pub fn new() -> Self {
        Self::build(BookConfig::default())
    }

    /// Empty book with a validated configuration.
    pub fn with_config(config: BookConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: BookConfig) -> Self {
        let orders = u32::try_from(config.order_capacity).unwrap_or(NULL_INDEX - 1);
        let levels = config.level_capacity;

        Self {
            bids: SideBook::with_capacity(Side::Bid, orders, levels),
            asks: SideBook::with_capacity(Side::Ask, orders, levels),
            orders: FxHashMap::with_capacity_and_hasher(
                config.order_capacity.saturating_mul(2),
                Default::default(),
            ),
            next_order_id: Some(1),
            next_sequence: 1,
            config,
        }
    }

    #[inline]
    pub fn config(&self) -> &BookConfig {
        &self.config
    }

    #[inline]
    pub fn side_book(&self, side: Side) -> &SideBook {
        match side {
            Side::Bid => &self.bids,
            Side::Ask => &self.asks,
        }
    }

    #[inline]
    pub(crate) fn side_book_mut(&mut self, side: Side) -> &mut SideBook {
        match side {
            Side::Bid => &mut self.bids,
            Side::Ask => &mut self.asks,
        }
    }

    // ========================================================================
    // Id and sequence allocation
    // ========================================================================

    /// Pick the id for an incoming order. `0` requests a fresh one; an
    /// explicit id pushes the counter past itself so later fresh ids cannot
    /// collide with it.
    ///
    /// # Errors
    /// `DuplicateId` if the chosen id is active, `IdsExhausted` if a fresh id
    /// is requested after `u64::MAX` was handed out.
    pub(crate) fn claim_order_id(&mut self, requested: OrderId) -> Result<OrderId, BookError> {
        let order_id = if requested == 0 {
            let id = self.next_order_id.ok_or(BookError::IdsExhausted)?;
            if self.orders.contains_key(&id) {
                return Err(BookError::DuplicateId { order_id: id });
            }
            self.next_order_id = id.checked_add(1);
            id
        } else {
            if self.orders.contains_key(&requested) {
                return Err(BookError::DuplicateId {
                    order_id: requested,
                });
            }
            if matches!(self.next_order_id, Some(next) if requested >= next) {
                self.next_order_id = requested.checked_add(1);
            }
            requested
        };
        Ok(order_id)
    }

    #[inline]
    pub(crate) fn next_sequence(&mut self) -> Sequence {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        sequence
    }

    // ========================================================================
    // Cancellation
    // ========================================================================

    /// Pull an active order out of the book.
    ///
    /// Touches the id index and one level queue only; the price heap is left
    /// alone even when the level drains.
    ///
    /// # Errors
    /// `NotFound` if the id is not active (never placed, already filled, or
    /// already canceled).
    ///
    /// # Complexity
    /// O(1)
    pub fn cancel_order(&mut self, order_id: OrderId) -> Result<CancelResult, BookError> {
        let info = *self
            .orders
            .get(&order_id)
            .ok_or(BookError::NotFound { order_id })?;

        let order = self.side_book_mut(info.side).remove_order(order_id, info.price)?;
        self.orders.remove(&order_id);

        debug!(
            order_id,
            side = ?info.side,
            price = info.price,
            qty = order.remaining_qty,
            "order canceled"
        );

        Ok(CancelResult {
            order_id,
            side: info.side,
            price: info.price,
            canceled_qty: order.remaining_qty,
        })
    }

    // ========================================================================
    // Best Price Access (purges stale levels)
    // ========================================================================

    /// Oldest order at the best live price on `side`.
    #[inline]
    pub fn best_order(&mut self, side: Side) -> Option<Order> {
        self.side_book_mut(side).get_best_order()
    }

    #[inline]
    pub fn best_price(&mut self, side: Side) -> Option<Price> {
        self.side_book_mut(side).get_best_price()
    }

    /// Highest bid (oldest order at that price).
    #[inline]
    pub fn get_best_bid(&mut self) -> Option<Order> {
        self.best_order(Side::Bid)
    }

    /// Lowest ask (oldest order at that price).
    #[inline]
    pub fn get_best_ask(&mut self) -> Option<Order> {
        self.best_order(Side::Ask)
    }

    #[inline]
    pub fn get_best_bid_price(&mut self) -> Option<Price> {
        self.best_price(Side::Bid)
    }

    #[inline]
    pub fn get_best_ask_price(&mut self) -> Option<Price> {
        self.best_price(Side::Ask)
    }

    /// Best ask minus best bid, when both sides have liquidity.
    pub fn spread(&mut self) -> Option<Price> {
        let bid = self.get_best_bid_price()?;
        let ask = self.get_best_ask_price()?;
        ask.checked_sub(bid)
    }

    // ========================================================================
    // Inspection (no cleanup)
    // ========================================================================

    /// Aggregate resting quantity at `price` on `side`; 0 if none.
    #[inline]
    pub fn quantity_at(&self, side: Side, price: Price) -> Quantity {
        self.side_book(side).quantity_at(price)
    }

    /// Number of orders resting at `price` on `side`.
    #[inline]
    pub fn orders_at(&self, side: Side, price: Price) -> usize {
        self.side_book(side).orders_at(price)
    }

    /// Orders at `price` on `side`, oldest first.
    pub fn level_orders(&self, side: Side, price: Price) -> Vec<Order> {
        self.side_book(side).level_orders(price)
    }

    /// Up to `max_levels` live levels on `side`, best first.
    pub fn depth(&self, side: Side, max_levels: usize) -> Vec<DepthLevel> {
        self.side_book(side).depth(max_levels)
    }

    /// Look up an active order by id.
    pub fn get_order(&self, order_id: OrderId) -> Option<&Order> {
        let info = self.orders.get(&order_id)?;
        self.side_book(info.side).get_order(order_id, info.price)
    }

    #[inline]
    pub fn contains_order(&self, order_id: OrderId) -> bool {
        self.orders.contains_key(&order_id)
    }

    /// Number of active orders across both sides.
    #[inline]
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Heap entries on `side`, live and stale.
    #[inline]
    pub fn tracked_prices(&self, side: Side) -> usize {
        self.side_book(side).tracked_prices()
    }

    /// Pre-fault the order arenas of both sides.
    pub fn warm_up(&mut self) {
        self.bids.warm_up();
        self.asks.warm_up();
    }
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for OrderBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderBook")
            .field("symbol", &self.config.symbol)
            .field("bid_orders", &self.bids.order_count())
            .field("ask_orders", &self.asks.order_count())
            .field("bid_prices", &self.bids.tracked_prices())
            .field("ask_prices", &self.asks.tracked_prices())
            .field("next_order_id", &self.next_order_id)
            .finish()
    }
}
