//! Error taxonomy for order book operations and configuration.

use thiserror::Error;

use crate::command::{OrderId, Price, Quantity, RejectReason};

/// Failure of a single book operation. Always returned synchronously to the
/// caller of the call that triggered it; nothing is retried internally.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookError {
    #[error("invalid quantity {0}: must be positive")]
    InvalidQuantity(Quantity),

    #[error("invalid price: {0}")]
    InvalidPrice(String),

    #[error("order {order_id} is already active")]
    DuplicateId { order_id: OrderId },

    /// Covers both "never existed" and "already filled or canceled".
    #[error("order {order_id} is not active")]
    NotFound { order_id: OrderId },

    /// Resting `qty` at `price` would push the level total past `u64::MAX`.
    #[error("quantity {qty} at price {price} overflows the level total")]
    LevelOverflow { price: Price, qty: Quantity },

    /// The auto-assign counter has handed out `u64::MAX`.
    #[error("no order ids left to assign")]
    IdsExhausted,
}

/// Rejected [`BookConfig`](crate::config::BookConfig).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("tick size must be positive")]
    ZeroTickSize,

    #[error("max price {max_price} must be a positive multiple of tick size {tick_size}")]
    MaxPrice { max_price: u64, tick_size: u64 },

    #[error("{0} price decimals exceeds the supported maximum of {}", crate::config::MAX_PRICE_DECIMALS)]
    TooManyDecimals(u32),
}

impl From<&BookError> for RejectReason {
    fn from(err: &BookError) -> Self {
        match err {
            BookError::InvalidQuantity(_) => RejectReason::InvalidQuantity,
            BookError::InvalidPrice(_) => RejectReason::InvalidPrice,
            BookError::DuplicateId { .. } => RejectReason::DuplicateOrderId,
            BookError::NotFound { .. } => RejectReason::OrderNotFound,
            BookError::LevelOverflow { .. } => RejectReason::InvalidQuantity,
            BookError::IdsExhausted => RejectReason::IdsExhausted,
        }
    }
}
