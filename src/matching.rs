//! Matching - placement of limit and market orders.
//!
//! Implements the cross/rest algorithm once for both sides:
//! 1. CROSSING: take the opposite side's best order while it crosses
//! 2. RESTING: park what is left of a limit order on its own side
//!
//! Market orders skip the price check and never rest.

use tracing::{debug, trace};

use crate::command::{Order, OrderId, Price, Quantity, Side, Trade};
use crate::error::BookError;
use crate::order_book::{OrderBook, OrderInfo};

/// Result of placing one order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlacementResult {
    /// Id the order was admitted under
    pub order_id: OrderId,
    /// Executions in match order
    pub trades: Vec<Trade>,
    /// Set when a limit remainder is now resting
    pub resting_id: Option<OrderId>,
    /// Quantity resting (0 if nothing rested)
    pub resting_qty: Quantity,
    /// Market remainder dropped for lack of liquidity
    pub unfilled_qty: Quantity,
}

impl PlacementResult {
    /// Total executed quantity.
    pub fn filled_qty(&self) -> Quantity {
        self.trades.iter().map(|t| t.qty).sum()
    }
}

impl OrderBook {
    /// Place a limit order under a freshly assigned id.
    ///
    /// # Errors
    /// `InvalidQuantity` for `qty == 0`, `InvalidPrice` for a price the
    /// book's configuration does not admit, `LevelOverflow` if `qty` added to
    /// the same-side level at `price` exceeds `u64::MAX`, `IdsExhausted` once
    /// every auto id is spent.
    pub fn place_limit_order(
        &mut self,
        side: Side,
        price: Price,
        qty: Quantity,
    ) -> Result<PlacementResult, BookError> {
        self.place_limit_order_with_id(0, side, price, qty)
    }

    /// Place a limit order under a caller-chosen id (`0` assigns one).
    ///
    /// # Errors
    /// As [`place_limit_order`](Self::place_limit_order), plus `DuplicateId`
    /// if `order_id` is active.
    pub fn place_limit_order_with_id(
        &mut self,
        order_id: OrderId,
        side: Side,
        price: Price,
        qty: Quantity,
    ) -> Result<PlacementResult, BookError> {
        validate_qty(qty)?;
        self.config.validate_price(price)?;
        self.execute(order_id, side, Some(price), qty)
    }

    /// Place a market order under a freshly assigned id.
    ///
    /// # Errors
    /// `InvalidQuantity` for `qty == 0`, `IdsExhausted` once every auto id
    /// is spent.
    pub fn place_market_order(
        &mut self,
        side: Side,
        qty: Quantity,
    ) -> Result<PlacementResult, BookError> {
        self.place_market_order_with_id(0, side, qty)
    }

    /// Place a market order under a caller-chosen id (`0` assigns one).
    pub fn place_market_order_with_id(
        &mut self,
        order_id: OrderId,
        side: Side,
        qty: Quantity,
    ) -> Result<PlacementResult, BookError> {
        validate_qty(qty)?;
        self.execute(order_id, side, None, qty)
    }

    /// Admit, match and (for limits) rest one validated order.
    ///
    /// `limit == None` is a market order.
    fn execute(
        &mut self,
        requested_id: OrderId,
        side: Side,
        limit: Option<Price>,
        qty: Quantity,
    ) -> Result<PlacementResult, BookError> {
        // A remainder that cannot rest must not trade first
        if let Some(price) = limit {
            let level_qty = self.side_book(side).quantity_at(price);
            if level_qty.checked_add(qty).is_none() {
                return Err(BookError::LevelOverflow { price, qty });
            }
        }

        let order_id = self.claim_order_id(requested_id)?;
        let sequence = self.next_sequence();

        // Provisional entry: the id is taken while matching runs
        self.orders.insert(
            order_id,
            OrderInfo {
                side,
                price: limit.unwrap_or(0),
            },
        );

        let (trades, remaining) = match self.cross(order_id, side, limit, qty) {
            Ok(crossed) => crossed,
            Err(err) => {
                self.orders.remove(&order_id);
                return Err(err);
            }
        };

        let mut result = PlacementResult {
            order_id,
            trades,
            resting_id: None,
            resting_qty: 0,
            unfilled_qty: 0,
        };

        match limit {
            Some(price) if remaining > 0 => {
                let order = Order {
                    id: order_id,
                    side,
                    price,
                    remaining_qty: remaining,
                    sequence,
                };
                if let Err(err) = self.side_book_mut(side).add_order(order) {
                    self.orders.remove(&order_id);
                    return Err(err);
                }
                debug!(order_id, ?side, price, qty = remaining, "order resting");

                result.resting_id = Some(order_id);
                result.resting_qty = remaining;
            }
            _ => {
                self.orders.remove(&order_id);
                result.unfilled_qty = remaining;
                if remaining > 0 {
                    debug!(order_id, ?side, unfilled = remaining, "market order exhausted liquidity");
                }
            }
        }

        Ok(result)
    }

    /// Match `qty` against the opposite side. Returns the trades and the
    /// quantity left over.
    fn cross(
        &mut self,
        taker_id: OrderId,
        side: Side,
        limit: Option<Price>,
        mut qty: Quantity,
    ) -> Result<(Vec<Trade>, Quantity), BookError> {
        let mut trades = Vec::new();
        let (makers, orders) = match side {
            Side::Bid => (&mut self.asks, &mut self.orders),
            Side::Ask => (&mut self.bids, &mut self.orders),
        };

        while qty > 0 {
            // Also purges stale levels sitting on top
            let Some(maker) = makers.get_best_order() else {
                break;
            };

            if let Some(limit) = limit {
                if !side.crosses(limit, maker.price) {
                    break;
                }
            }

            let traded = qty.min(maker.remaining_qty);
            qty -= traded;

            if traded == maker.remaining_qty {
                makers.remove_order(maker.id, maker.price)?;
                orders.remove(&maker.id);
            } else {
                makers.fill_order(maker.id, maker.price, traded)?;
            }

            let trade = Trade {
                price: maker.price,
                qty: traded,
                maker_order_id: maker.id,
                taker_order_id: taker_id,
                taker_side: side,
            };
            trace!(?trade, "trade");
            trades.push(trade);
        }

        Ok((trades, qty))
    }
}

#[inline]
fn validate_qty(qty: Quantity) -> Result<(), BookError> {
    if qty == 0 {
        return Err(BookError::InvalidQuantity(qty));
    }
    Ok(())
}
