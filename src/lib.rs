//! # lazy-lob
//!
//! A single-instrument limit order book with strict price-time priority and
//! O(1) cancellation.
//!
//! ## Design Principles
//!
//! - **Single-Writer**: one owner mutates a book; no internal locking
//! - **Lazy Deletion**: cancels and fills never touch the price heap; best-price
//!   queries purge drained levels when they reach the top
//! - **Intrusive FIFO**: 64-byte arena nodes linked by `u32` indices, with a
//!   per-level id map for O(1) removal from any position
//! - **Integer Prices**: prices are ticks; decimals are converted at the edge
//!
//! ## Architecture
//!
//! ```text
//! [Command] --> Engine --> OrderBook --> SideBook (heap + level map) --> PriceLevelQueue
//!                 |
//!          [Output Events]
//! ```

pub mod arena;
pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod matching;
pub mod order_book;
pub mod price_level;
pub mod side_book;

// Re-exports for convenience
pub use command::{
    BookUpdate, CancelOrder, Command, Order, OrderId, OrderType, OutputEvent, PlaceOrder, Price,
    Quantity, RejectReason, Sequence, Side, Trade,
};
pub use config::BookConfig;
pub use engine::Engine;
pub use error::{BookError, ConfigError};
pub use matching::PlacementResult;
pub use order_book::{CancelResult, OrderBook};
pub use price_level::PriceLevelQueue;
pub use side_book::{DepthLevel, SideBook};
