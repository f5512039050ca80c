//! Engine - single-writer command processor around one [`OrderBook`].
//!
//! Turns [`Command`]s into [`OutputEvent`]s. Errors from the book never escape
//! as `Err`; they become `Rejected` events so a feed consumer sees every
//! command answered. With the `runtime` feature the engine can drain an
//! rtrb ring buffer on a dedicated (optionally pinned) thread.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use tracing::{debug, info};

use crate::command::{
    BookUpdate, CancelOrder, Command, OrderAccepted, OrderCanceled, OrderRejected, OrderType,
    OrderUnfilled, OutputEvent, PlaceOrder, Price, Side,
};
use crate::config::BookConfig;
use crate::error::ConfigError;
use crate::matching::PlacementResult;
use crate::order_book::OrderBook;

/// Owns one book and answers commands one at a time.
pub struct Engine {
    book: OrderBook,
}

impl Engine {
    /// Engine over a book with the default configuration.
    pub fn new() -> Self {
        Self::from_book(OrderBook::new())
    }

    /// Engine over a book built from `config`.
    pub fn with_config(config: BookConfig) -> Result<Self, ConfigError> {
        OrderBook::with_config(config).map(Self::from_book)
    }

    /// Engine over an existing book, e.g. one restored by replaying a journal.
    pub fn from_book(book: OrderBook) -> Self {
        let config = book.config();
        info!(
            symbol = %config.symbol,
            tick_size = config.tick_size,
            order_capacity = config.order_capacity,
            "engine created"
        );
        Self { book }
    }

    /// Run the engine event loop until the command producer goes away.
    ///
    /// Events are never dropped: a full output buffer is spun on until the
    /// consumer catches up. The loop also ends if the event consumer is
    /// dropped.
    #[cfg(feature = "runtime")]
    pub fn run(
        &mut self,
        input: &mut rtrb::Consumer<Command>,
        output: &mut rtrb::Producer<OutputEvent>,
        pin_to_core: bool,
    ) {
        if pin_to_core {
            self.pin_to_core();
        }

        self.warm_up();
        info!(symbol = %self.book.config().symbol, "engine loop started");

        loop {
            match input.pop() {
                Ok(cmd) => {
                    for event in self.process_command(cmd) {
                        let mut pending = event;
                        loop {
                            match output.push(pending) {
                                Ok(()) => break,
                                Err(rtrb::PushError::Full(event)) => {
                                    if output.is_abandoned() {
                                        info!("event consumer gone, engine loop stopping");
                                        return;
                                    }
                                    pending = event;
                                    std::hint::spin_loop();
                                }
                            }
                        }
                    }
                }
                Err(rtrb::PopError::Empty) => {
                    if input.is_abandoned() {
                        break;
                    }
                    std::hint::spin_loop();
                }
            }
        }

        info!(symbol = %self.book.config().symbol, "engine loop stopped");
    }

    /// Pin the current thread to the last available CPU core.
    #[cfg(feature = "runtime")]
    pub fn pin_to_core(&self) {
        let pinned = core_affinity::get_core_ids()
            .and_then(|ids| ids.last().copied())
            .map(core_affinity::set_for_current)
            .unwrap_or(false);

        if pinned {
            info!("engine thread pinned to last core");
        } else {
            tracing::warn!("could not pin engine thread");
        }
    }

    /// Process one command and return its events.
    ///
    /// Synchronous entry point used by the runtime loop, tests and benches.
    pub fn process_command(&mut self, cmd: Command) -> Vec<OutputEvent> {
        match cmd {
            Command::Place(order) => self.process_place(order),
            Command::Cancel(cancel) => self.process_cancel(cancel),
        }
    }

    fn process_place(&mut self, cmd: PlaceOrder) -> Vec<OutputEvent> {
        let placed = match cmd.order_type {
            OrderType::Limit => {
                self.book
                    .place_limit_order_with_id(cmd.order_id, cmd.side, cmd.price, cmd.qty)
            }
            OrderType::Market => self
                .book
                .place_market_order_with_id(cmd.order_id, cmd.side, cmd.qty),
        };

        match placed {
            Ok(result) => self.placement_events(cmd.side, &result),
            Err(err) => {
                debug!(order_id = cmd.order_id, error = %err, "place rejected");
                vec![OutputEvent::Rejected(OrderRejected {
                    order_id: cmd.order_id,
                    reason: (&err).into(),
                })]
            }
        }
    }

    /// Trades, then one delta per maker level touched (after its last trade),
    /// then Accepted/Unfilled for the taker.
    fn placement_events(&self, side: Side, result: &PlacementResult) -> Vec<OutputEvent> {
        let mut events = Vec::with_capacity(result.trades.len() * 2 + 2);
        let maker_side = side.opposite();

        for (i, trade) in result.trades.iter().enumerate() {
            events.push(OutputEvent::Trade(*trade));

            let level_done = result
                .trades
                .get(i + 1)
                .map_or(true, |next| next.price != trade.price);
            if level_done {
                events.push(self.level_update(maker_side, trade.price));
            }
        }

        if let Some(order_id) = result.resting_id {
            if let Some(order) = self.book.get_order(order_id) {
                events.push(OutputEvent::Accepted(OrderAccepted {
                    order_id,
                    price: order.price,
                    qty: result.resting_qty,
                    side,
                }));
                events.push(self.level_update(side, order.price));
            }
        }

        if result.unfilled_qty > 0 {
            events.push(OutputEvent::Unfilled(OrderUnfilled {
                order_id: result.order_id,
                unfilled_qty: result.unfilled_qty,
            }));
        }

        events
    }

    fn process_cancel(&mut self, cmd: CancelOrder) -> Vec<OutputEvent> {
        match self.book.cancel_order(cmd.order_id) {
            Ok(canceled) => vec![
                OutputEvent::Canceled(OrderCanceled {
                    order_id: canceled.order_id,
                    canceled_qty: canceled.canceled_qty,
                }),
                self.level_update(canceled.side, canceled.price),
            ],
            Err(err) => {
                debug!(order_id = cmd.order_id, error = %err, "cancel rejected");
                vec![OutputEvent::Rejected(OrderRejected {
                    order_id: cmd.order_id,
                    reason: (&err).into(),
                })]
            }
        }
    }

    fn level_update(&self, side: Side, price: Price) -> OutputEvent {
        OutputEvent::BookDelta(BookUpdate {
            side,
            price,
            new_qty: self.book.quantity_at(side, price),
            new_count: u32::try_from(self.book.orders_at(side, price)).unwrap_or(u32::MAX),
        })
    }

    /// Pre-fault memory pages of the book.
    pub fn warm_up(&mut self) {
        self.book.warm_up();
    }

    #[inline]
    pub fn book(&self) -> &OrderBook {
        &self.book
    }

    #[inline]
    pub fn book_mut(&mut self) -> &mut OrderBook {
        &mut self.book
    }

    #[inline]
    pub fn best_bid(&mut self) -> Option<Price> {
        self.book.get_best_bid_price()
    }

    #[inline]
    pub fn best_ask(&mut self) -> Option<Price> {
        self.book.get_best_ask_price()
    }

    #[inline]
    pub fn spread(&mut self) -> Option<Price> {
        self.book.spread()
    }

    #[inline]
    pub fn order_count(&self) -> usize {
        self.book.order_count()
    }

    /// Hash of the observable book state (every live level and its FIFO),
    /// for determinism testing. Does not purge stale levels.
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        for side in [Side::Bid, Side::Ask] {
            side.hash(&mut hasher);
            for level in self.book.depth(side, usize::MAX) {
                level.price.hash(&mut hasher);
                level.total_qty.hash(&mut hasher);
                for order in self.book.level_orders(side, level.price) {
                    order.hash(&mut hasher);
                }
            }
        }
        self.book.order_count().hash(&mut hasher);

        hasher.finish()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
