//! Book configuration and price admission rules.
//!
//! Prices inside the book are integer ticks. `BookConfig` defines which tick
//! values are admissible and how human-readable decimal prices map onto them.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::command::Price;
use crate::error::{BookError, ConfigError};

/// Largest `price_decimals` for which `10^decimals` still fits in a `u64`.
pub const MAX_PRICE_DECIMALS: u32 = 18;

/// Tunables for one instrument's book.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookConfig {
    /// Instrument name, used only for log context
    pub symbol: String,
    /// Orders pre-allocated per side before the arena has to grow
    pub order_capacity: usize,
    /// Price levels pre-allocated per side
    pub level_capacity: usize,
    /// Limit prices must be a multiple of this many ticks
    pub tick_size: Price,
    /// Highest admissible limit price
    pub max_price: Price,
    /// Decimal places represented by one tick (2 => 100.50 is 10050)
    pub price_decimals: u32,
}

impl Default for BookConfig {
    fn default() -> Self {
        Self {
            symbol: String::from("UNNAMED"),
            order_capacity: 4096,
            level_capacity: 256,
            tick_size: 1,
            max_price: Price::MAX,
            price_decimals: 2,
        }
    }
}

impl BookConfig {
    /// Check internal consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_size == 0 {
            return Err(ConfigError::ZeroTickSize);
        }
        if self.max_price == 0 || self.max_price % self.tick_size != 0 {
            return Err(ConfigError::MaxPrice {
                max_price: self.max_price,
                tick_size: self.tick_size,
            });
        }
        if self.price_decimals > MAX_PRICE_DECIMALS {
            return Err(ConfigError::TooManyDecimals(self.price_decimals));
        }
        Ok(())
    }

    /// Check that `price` may be used as a limit price.
    pub fn validate_price(&self, price: Price) -> Result<(), BookError> {
        if price == 0 {
            return Err(BookError::InvalidPrice("price must be positive".into()));
        }
        if price > self.max_price {
            return Err(BookError::InvalidPrice(format!(
                "price {} exceeds maximum {}",
                price, self.max_price
            )));
        }
        if price % self.tick_size != 0 {
            return Err(BookError::InvalidPrice(format!(
                "price {} is not a multiple of tick size {}",
                price, self.tick_size
            )));
        }
        Ok(())
    }

    /// Convert a decimal price (e.g. `100.50`) into book ticks.
    ///
    /// Rejects negative values, values with more precision than
    /// `price_decimals`, values that overflow, and anything
    /// [`validate_price`](Self::validate_price) rejects.
    pub fn price_from_decimal(&self, value: Decimal) -> Result<Price, BookError> {
        if value < Decimal::ZERO {
            return Err(BookError::InvalidPrice(format!("{} is negative", value)));
        }

        let factor = Decimal::from(10u64.pow(self.price_decimals));
        let scaled = value
            .checked_mul(factor)
            .ok_or_else(|| BookError::InvalidPrice(format!("{} overflows", value)))?;

        if !scaled.fract().is_zero() {
            return Err(BookError::InvalidPrice(format!(
                "{} has more than {} decimal places",
                value, self.price_decimals
            )));
        }

        let price = scaled
            .to_u64()
            .ok_or_else(|| BookError::InvalidPrice(format!("{} overflows", value)))?;
        self.validate_price(price)?;
        Ok(price)
    }

    /// Convert book ticks back into a decimal price.
    pub fn price_to_decimal(&self, price: Price) -> Decimal {
        Decimal::from_i128_with_scale(price as i128, self.price_decimals)
    }
}
