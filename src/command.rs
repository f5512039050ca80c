//! Value types plus the Command and Event vocabulary of the order book.
//!
//! Commands are inputs from whoever owns the book (a gateway, a replay
//! harness, a test). Events are outputs for market data and journaling
//! consumers. Everything here is plain `Copy` data.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Exchange-wide order identifier. `0` is reserved for "assign one for me".
pub type OrderId = u64;

/// Fixed-point price in ticks (e.g., $100.50 -> 10050 with 2 decimals).
pub type Price = u64;

/// Quantity in base units.
pub type Quantity = u64;

/// Admission sequence number, strictly increasing per book.
pub type Sequence = u64;

/// Order side (bid = buy, ask = sell)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Side {
    /// Buy side (bids)
    Bid = 0,
    /// Sell side (asks)
    Ask = 1,
}

impl Side {
    /// Returns the opposite side
    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            Side::Bid => Side::Ask,
            Side::Ask => Side::Bid,
        }
    }

    /// Rank two prices resting on this side.
    ///
    /// `Greater` means `a` is the better (more aggressive) price: higher for
    /// bids, lower for asks.
    #[inline]
    pub fn priority(self, a: Price, b: Price) -> Ordering {
        match self {
            Side::Bid => a.cmp(&b),
            Side::Ask => b.cmp(&a),
        }
    }

    /// Whether an incoming order on this side with limit `limit` trades
    /// against a resting opposite-side order at `resting`.
    #[inline]
    pub const fn crosses(self, limit: Price, resting: Price) -> bool {
        match self {
            Side::Bid => limit >= resting,
            Side::Ask => limit <= resting,
        }
    }
}

/// An active order: resting in the book, or the incoming order being matched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Order {
    /// Unique order ID
    pub id: OrderId,
    /// Side of the book
    pub side: Side,
    /// Limit price in ticks
    pub price: Price,
    /// Quantity still open; always > 0 while the order is reachable
    pub remaining_qty: Quantity,
    /// Arrival sequence, breaks ties between orders at the same price
    pub sequence: Sequence,
}

impl Order {
    pub(crate) const EMPTY: Order = Order {
        id: 0,
        side: Side::Bid,
        price: 0,
        remaining_qty: 0,
        sequence: 0,
    };
}

/// Execution style of an incoming order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    /// Match up to the limit price, rest the remainder
    #[default]
    Limit,
    /// Match at any price, never rest
    Market,
}

// ============================================================================
// Input Commands
// ============================================================================

/// Place a new order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceOrder {
    /// Client-assigned order ID, or 0 to let the book assign one
    pub order_id: OrderId,
    /// Order side (bid/ask)
    pub side: Side,
    /// Fixed-point limit price; ignored for market orders
    pub price: Price,
    /// Order quantity
    pub qty: Quantity,
    /// Limit or market
    #[serde(default)]
    pub order_type: OrderType,
}

/// Cancel an existing order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelOrder {
    /// Order ID to cancel
    pub order_id: OrderId,
}

/// Input commands for the single writer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Place a new limit or market order
    Place(PlaceOrder),
    /// Cancel an existing order
    Cancel(CancelOrder),
}

// ============================================================================
// Output Events
// ============================================================================

/// A trade was executed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Trade {
    /// Execution price (always the maker's price)
    pub price: Price,
    /// Executed quantity
    pub qty: Quantity,
    /// Maker (passive) order ID
    pub maker_order_id: OrderId,
    /// Taker (aggressive) order ID
    pub taker_order_id: OrderId,
    /// Side of the taker order
    pub taker_side: Side,
}

/// Order book level update (Level 2 market data)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookUpdate {
    /// Which side changed
    pub side: Side,
    /// Price level that changed
    pub price: Price,
    /// New total quantity at this price (0 = level emptied)
    pub new_qty: Quantity,
    /// New order count at this price
    pub new_count: u32,
}

/// Order was accepted and is resting in the book
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAccepted {
    /// Id the order rests under (assigned if the command sent `0`)
    pub order_id: OrderId,
    /// Resting price
    pub price: Price,
    /// Quantity left to rest after any immediate fills
    pub qty: Quantity,
    /// Side the order rests on
    pub side: Side,
}

/// Market order ran out of liquidity; the remainder was dropped
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderUnfilled {
    /// Market order id (assigned if the command sent `0`)
    pub order_id: OrderId,
    /// Quantity that found no liquidity
    pub unfilled_qty: Quantity,
}

/// Order was canceled
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCanceled {
    /// Id of the pulled order
    pub order_id: OrderId,
    /// Remaining quantity that was canceled
    pub canceled_qty: Quantity,
}

/// Order was rejected
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRejected {
    /// Id as submitted (`0` for an auto-id request)
    pub order_id: OrderId,
    /// Why the command failed
    pub reason: RejectReason,
}

/// Reasons for order rejection
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum RejectReason {
    /// Order ID already active
    DuplicateOrderId = 0,
    /// Order not active (never existed, filled, or canceled)
    OrderNotFound = 1,
    /// Invalid price
    InvalidPrice = 2,
    /// Invalid quantity, or one the level total cannot absorb
    InvalidQuantity = 3,
    /// Auto-assigned id space used up
    IdsExhausted = 4,
}

/// Output events from the engine
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputEvent {
    /// Trade executed
    Trade(Trade),
    /// Book level changed
    BookDelta(BookUpdate),
    /// Order accepted and resting
    Accepted(OrderAccepted),
    /// Market order remainder dropped
    Unfilled(OrderUnfilled),
    /// Order canceled
    Canceled(OrderCanceled),
    /// Order rejected
    Rejected(OrderRejected),
}
