//! Scenario Tests - hand-written book walkthroughs.
//!
//! Each test drives the public `OrderBook` API through a short, fully
//! specified sequence and checks best prices, level quantities and the
//! surviving orders afterwards.

use lazy_lob::{BookError, OrderBook, Side};
use tracing_subscriber::EnvFilter;

/// Route book logs to the test harness; `RUST_LOG=lazy_lob=trace` shows them.
fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn bid(book: &mut OrderBook, id: u64, price: u64, qty: u64) {
    book.place_limit_order_with_id(id, Side::Bid, price, qty).unwrap();
}

fn ask(book: &mut OrderBook, id: u64, price: u64, qty: u64) {
    book.place_limit_order_with_id(id, Side::Ask, price, qty).unwrap();
}

fn fifo(book: &OrderBook, side: Side, price: u64) -> Vec<(u64, u64)> {
    book.level_orders(side, price)
        .iter()
        .map(|o| (o.id, o.remaining_qty))
        .collect()
}

// ============================================================================
// Reference walkthrough
// ============================================================================

#[test]
fn test_reference_walkthrough() {
    init_logging();
    let mut book = OrderBook::new();

    bid(&mut book, 1, 100, 10);
    bid(&mut book, 2, 101, 5);
    ask(&mut book, 4, 103, 15);
    bid(&mut book, 3, 101, 5);

    assert_eq!(book.get_best_bid_price(), Some(101));
    assert_eq!(book.get_best_ask_price(), Some(103));
    assert_eq!(fifo(&book, Side::Bid, 101), vec![(2, 5), (3, 5)]);
    assert_eq!(book.quantity_at(Side::Bid, 101), 10);

    book.cancel_order(4).unwrap();
    assert_eq!(book.get_best_ask(), None);

    let result = book.place_limit_order_with_id(6, Side::Ask, 101, 3).unwrap();
    assert_eq!(result.trades.len(), 1);
    let trade = result.trades[0];
    assert_eq!(trade.price, 101);
    assert_eq!(trade.qty, 3);
    assert_eq!(trade.maker_order_id, 2);
    assert_eq!(trade.taker_order_id, 6);
    assert_eq!(result.resting_id, None);

    assert_eq!(fifo(&book, Side::Bid, 101), vec![(2, 2), (3, 5)]);
    assert_eq!(book.get_best_bid().map(|o| o.id), Some(2));
}

// ============================================================================
// Placement
// ============================================================================

#[test]
fn test_place_single_bid() {
    let mut book = OrderBook::new();
    bid(&mut book, 1, 99, 10);

    assert_eq!(book.get_best_bid_price(), Some(99));
    assert_eq!(book.get_best_ask_price(), None);
    assert_eq!(book.quantity_at(Side::Bid, 99), 10);
}

#[test]
fn test_place_single_ask() {
    let mut book = OrderBook::new();
    ask(&mut book, 2, 99, 10);

    assert_eq!(book.get_best_ask_price(), Some(99));
    assert_eq!(book.get_best_bid_price(), None);
    assert_eq!(book.quantity_at(Side::Ask, 99), 10);
}

#[test]
fn test_same_price_bids_keep_arrival_order() {
    let mut book = OrderBook::new();
    for (id, qty) in [(1, 10), (2, 30), (3, 20)] {
        bid(&mut book, id, 99, qty);
    }

    assert_eq!(book.get_best_bid().map(|o| o.remaining_qty), Some(10));
    assert_eq!(book.quantity_at(Side::Bid, 99), 60);
    assert_eq!(book.orders_at(Side::Bid, 99), 3);
}

#[test]
fn test_bids_at_different_prices_rank_highest_first() {
    let mut book = OrderBook::new();
    for (id, price) in [(1, 99), (2, 98), (3, 100)] {
        bid(&mut book, id, price, 10);
    }

    assert_eq!(book.get_best_bid().map(|o| o.id), Some(3));
    let prices: Vec<_> = book.depth(Side::Bid, 10).iter().map(|l| l.price).collect();
    assert_eq!(prices, vec![100, 99, 98]);
}

#[test]
fn test_asks_at_different_prices_rank_lowest_first() {
    let mut book = OrderBook::new();
    for (id, price) in [(1, 101), (2, 102), (3, 100)] {
        ask(&mut book, id, price, 10);
    }

    assert_eq!(book.get_best_ask().map(|o| o.id), Some(3));
    let prices: Vec<_> = book.depth(Side::Ask, 10).iter().map(|l| l.price).collect();
    assert_eq!(prices, vec![100, 101, 102]);
}

// ============================================================================
// Full and partial matches
// ============================================================================

#[test]
fn test_bid_clears_equal_ask() {
    let mut book = OrderBook::new();
    ask(&mut book, 1, 99, 10);
    bid(&mut book, 2, 99, 10);

    assert_eq!(book.get_best_bid(), None);
    assert_eq!(book.get_best_ask(), None);
    assert_eq!(book.quantity_at(Side::Bid, 99), 0);
    assert_eq!(book.quantity_at(Side::Ask, 99), 0);
}

#[test]
fn test_ask_clears_equal_bid() {
    let mut book = OrderBook::new();
    bid(&mut book, 1, 99, 10);
    ask(&mut book, 2, 99, 10);

    assert_eq!(book.get_best_bid(), None);
    assert_eq!(book.get_best_ask(), None);
    assert!(book.is_empty());
}

#[test]
fn test_larger_bid_rests_remainder() {
    let mut book = OrderBook::new();
    ask(&mut book, 1, 99, 10);
    bid(&mut book, 2, 99, 20);

    assert_eq!(book.get_best_bid().map(|o| (o.id, o.remaining_qty)), Some((2, 10)));
    assert_eq!(book.get_best_ask(), None);
    assert_eq!(book.quantity_at(Side::Bid, 99), 10);
    assert_eq!(book.quantity_at(Side::Ask, 99), 0);
}

#[test]
fn test_smaller_bid_leaves_ask_remainder() {
    let mut book = OrderBook::new();
    ask(&mut book, 1, 99, 35);
    bid(&mut book, 2, 99, 20);

    assert_eq!(book.get_best_bid(), None);
    assert_eq!(book.get_best_ask().map(|o| (o.id, o.remaining_qty)), Some((1, 15)));
    assert_eq!(book.quantity_at(Side::Ask, 99), 15);
}

#[test]
fn test_larger_ask_rests_remainder() {
    let mut book = OrderBook::new();
    bid(&mut book, 1, 99, 10);
    ask(&mut book, 2, 99, 30);

    assert_eq!(book.get_best_bid(), None);
    assert_eq!(book.get_best_ask().map(|o| (o.id, o.remaining_qty)), Some((2, 20)));
    assert_eq!(book.quantity_at(Side::Ask, 99), 20);
}

#[test]
fn test_smaller_ask_leaves_bid_remainder() {
    let mut book = OrderBook::new();
    bid(&mut book, 1, 99, 30);
    ask(&mut book, 2, 99, 10);

    assert_eq!(book.get_best_bid().map(|o| (o.id, o.remaining_qty)), Some((1, 20)));
    assert_eq!(book.get_best_ask(), None);
    assert_eq!(book.quantity_at(Side::Bid, 99), 20);
}

// ============================================================================
// Sweeps
// ============================================================================

#[test]
fn test_limit_bid_sweeps_two_ask_levels() {
    let mut book = OrderBook::new();
    ask(&mut book, 1, 102, 10);
    ask(&mut book, 2, 101, 20);

    let result = book.place_limit_order_with_id(3, Side::Bid, 102, 25).unwrap();
    let fills: Vec<_> = result.trades.iter().map(|t| (t.price, t.qty)).collect();
    assert_eq!(fills, vec![(101, 20), (102, 5)]);

    assert_eq!(book.get_best_ask_price(), Some(102));
    assert_eq!(book.get_best_ask().map(|o| o.remaining_qty), Some(5));
    assert_eq!(book.quantity_at(Side::Bid, 102), 0);
    assert_eq!(book.quantity_at(Side::Ask, 101), 0);
    assert_eq!(book.quantity_at(Side::Ask, 102), 5);
}

#[test]
fn test_limit_ask_sweeps_two_bid_levels() {
    let mut book = OrderBook::new();
    bid(&mut book, 1, 101, 20);
    bid(&mut book, 2, 102, 10);
    ask(&mut book, 3, 101, 25);

    assert_eq!(book.get_best_bid_price(), Some(101));
    assert_eq!(book.get_best_bid().map(|o| o.remaining_qty), Some(5));
    assert_eq!(book.quantity_at(Side::Bid, 102), 0);
    assert_eq!(book.quantity_at(Side::Bid, 101), 5);
    assert_eq!(book.quantity_at(Side::Ask, 101), 0);
}

#[test]
fn test_limit_bid_clears_level_then_partially_fills_next() {
    let mut book = OrderBook::new();
    ask(&mut book, 1, 101, 10);
    ask(&mut book, 2, 101, 15);
    ask(&mut book, 3, 102, 20);

    let result = book.place_limit_order_with_id(4, Side::Bid, 102, 40).unwrap();
    let makers: Vec<_> = result.trades.iter().map(|t| t.maker_order_id).collect();
    assert_eq!(makers, vec![1, 2, 3]);
    assert_eq!(result.resting_id, None);

    assert!(!book.contains_order(1));
    assert!(!book.contains_order(2));
    assert_eq!(book.get_best_bid(), None);
    assert_eq!(book.get_best_ask().map(|o| (o.id, o.remaining_qty)), Some((3, 5)));
    assert_eq!(book.quantity_at(Side::Ask, 101), 0);
    assert_eq!(book.quantity_at(Side::Ask, 102), 5);
}

#[test]
fn test_limit_ask_clears_level_then_partially_fills_next() {
    let mut book = OrderBook::new();
    bid(&mut book, 1, 102, 10);
    bid(&mut book, 2, 102, 15);
    bid(&mut book, 3, 101, 20);
    ask(&mut book, 4, 101, 40);

    assert_eq!(book.get_best_ask(), None);
    assert_eq!(book.get_best_bid().map(|o| (o.id, o.remaining_qty)), Some((3, 5)));
    assert_eq!(book.quantity_at(Side::Bid, 102), 0);
    assert_eq!(book.quantity_at(Side::Bid, 101), 5);
}

#[test]
fn test_large_bid_clears_all_asks_and_rests() {
    let mut book = OrderBook::new();
    ask(&mut book, 1, 101, 10);
    ask(&mut book, 2, 102, 20);
    ask(&mut book, 3, 103, 30);

    let result = book.place_limit_order_with_id(4, Side::Bid, 103, 100).unwrap();
    assert_eq!(result.filled_qty(), 60);
    assert_eq!(result.resting_qty, 40);

    assert_eq!(book.get_best_ask(), None);
    assert_eq!(book.get_best_bid().map(|o| (o.id, o.remaining_qty)), Some((4, 40)));
    assert_eq!(book.quantity_at(Side::Bid, 103), 40);
    for price in [101, 102, 103] {
        assert_eq!(book.quantity_at(Side::Ask, price), 0);
    }
}

#[test]
fn test_large_ask_clears_all_bids_and_rests() {
    let mut book = OrderBook::new();
    bid(&mut book, 1, 99, 10);
    bid(&mut book, 2, 98, 20);
    bid(&mut book, 3, 97, 30);
    ask(&mut book, 4, 97, 100);

    assert_eq!(book.get_best_bid(), None);
    assert_eq!(book.get_best_ask().map(|o| (o.id, o.remaining_qty)), Some((4, 40)));
    assert_eq!(book.quantity_at(Side::Ask, 97), 40);
    for price in [97, 98, 99] {
        assert_eq!(book.quantity_at(Side::Bid, price), 0);
    }
}

#[test]
fn test_market_bid_sweeps_two_ask_levels() {
    let mut book = OrderBook::new();
    ask(&mut book, 1, 102, 10);
    ask(&mut book, 2, 101, 20);

    let result = book.place_market_order_with_id(3, Side::Bid, 25).unwrap();
    assert_eq!(result.filled_qty(), 25);
    assert_eq!(result.unfilled_qty, 0);

    assert_eq!(book.get_best_ask_price(), Some(102));
    assert_eq!(book.quantity_at(Side::Ask, 101), 0);
    assert_eq!(book.quantity_at(Side::Ask, 102), 5);
    assert!(!book.contains_order(3));
}

#[test]
fn test_market_ask_sweeps_two_bid_levels() {
    let mut book = OrderBook::new();
    bid(&mut book, 1, 101, 20);
    bid(&mut book, 2, 102, 10);

    book.place_market_order_with_id(3, Side::Ask, 25).unwrap();

    assert_eq!(book.get_best_bid_price(), Some(101));
    assert_eq!(book.quantity_at(Side::Bid, 101), 5);
    assert_eq!(book.quantity_at(Side::Bid, 102), 0);
    assert_eq!(book.get_best_ask(), None);
}

#[test]
fn test_market_order_larger_than_book_never_rests() {
    let mut book = OrderBook::new();
    bid(&mut book, 1, 101, 10);
    bid(&mut book, 2, 100, 10);

    let result = book.place_market_order_with_id(3, Side::Ask, 50).unwrap();
    assert_eq!(result.filled_qty(), 20);
    assert_eq!(result.unfilled_qty, 30);
    assert_eq!(result.resting_id, None);

    assert!(book.is_empty());
    assert_eq!(book.get_best_ask(), None);
}

// ============================================================================
// Cancellation
// ============================================================================

#[test]
fn test_cancel_only_bid_leaves_asks_alone() {
    let mut book = OrderBook::new();
    bid(&mut book, 1, 100, 10);
    ask(&mut book, 2, 101, 15);

    book.cancel_order(1).unwrap();
    ask(&mut book, 3, 999, 5);

    assert_eq!(book.get_best_bid(), None);
    assert_eq!(book.get_best_ask_price(), Some(101));
    assert_eq!(book.quantity_at(Side::Bid, 100), 0);
    assert_eq!(book.quantity_at(Side::Ask, 101), 15);
}

#[test]
fn test_cancel_only_ask_leaves_bids_alone() {
    let mut book = OrderBook::new();
    ask(&mut book, 1, 101, 10);
    bid(&mut book, 2, 100, 15);

    book.cancel_order(1).unwrap();
    bid(&mut book, 3, 1, 5);

    assert_eq!(book.get_best_ask(), None);
    assert_eq!(book.get_best_bid_price(), Some(100));
    assert_eq!(book.quantity_at(Side::Ask, 101), 0);
    assert_eq!(book.quantity_at(Side::Bid, 100), 15);
}

#[test]
fn test_cancel_then_repopulate_bid_level() {
    let mut book = OrderBook::new();
    bid(&mut book, 1, 100, 10);
    book.cancel_order(1).unwrap();
    ask(&mut book, 2, 999, 5);
    assert_eq!(book.get_best_bid(), None);

    bid(&mut book, 3, 100, 20);
    ask(&mut book, 4, 100, 15);

    assert_eq!(book.get_best_bid_price(), Some(100));
    assert_eq!(book.get_best_bid().map(|o| (o.id, o.remaining_qty)), Some((3, 5)));
    assert_eq!(book.quantity_at(Side::Bid, 100), 5);
}

#[test]
fn test_cancel_then_repopulate_ask_level() {
    let mut book = OrderBook::new();
    ask(&mut book, 1, 100, 10);
    book.cancel_order(1).unwrap();
    bid(&mut book, 2, 1, 5);
    assert_eq!(book.get_best_ask(), None);

    ask(&mut book, 3, 100, 20);
    bid(&mut book, 4, 100, 15);

    assert_eq!(book.get_best_ask_price(), Some(100));
    assert_eq!(book.get_best_ask().map(|o| (o.id, o.remaining_qty)), Some((3, 5)));
    assert_eq!(book.quantity_at(Side::Ask, 100), 5);
}

#[test]
fn test_refill_before_cleanup_reuses_level() {
    let mut book = OrderBook::new();
    bid(&mut book, 1, 100, 10);
    book.cancel_order(1).unwrap();

    // No query in between, so the drained level is still tracked
    bid(&mut book, 2, 100, 7);

    assert_eq!(book.tracked_prices(Side::Bid), 1);
    assert_eq!(book.get_best_bid().map(|o| o.id), Some(2));
    assert_eq!(book.tracked_prices(Side::Bid), 1);
}

#[test]
fn test_cancel_then_sweep_bids() {
    let mut book = OrderBook::new();
    bid(&mut book, 1, 100, 10);
    book.cancel_order(1).unwrap();
    ask(&mut book, 2, 999, 5);

    bid(&mut book, 3, 100, 20);
    bid(&mut book, 4, 99, 30);
    ask(&mut book, 5, 99, 100);

    assert_eq!(book.get_best_bid(), None);
    assert_eq!(book.get_best_ask_price(), Some(99));
    assert_eq!(book.get_best_ask().map(|o| o.remaining_qty), Some(50));
}

#[test]
fn test_cancel_then_sweep_asks() {
    let mut book = OrderBook::new();
    ask(&mut book, 1, 100, 10);
    book.cancel_order(1).unwrap();
    bid(&mut book, 2, 1, 5);

    ask(&mut book, 3, 100, 20);
    ask(&mut book, 4, 101, 30);
    bid(&mut book, 5, 101, 100);

    assert_eq!(book.get_best_ask(), None);
    assert_eq!(book.get_best_bid_price(), Some(101));
    assert_eq!(book.get_best_bid().map(|o| o.remaining_qty), Some(50));
}

fn three_bid_levels(book: &mut OrderBook) {
    bid(book, 1, 102, 10);
    bid(book, 2, 102, 10);
    for id in 3..=5 {
        bid(book, id, 101, 15);
    }
    bid(book, 6, 100, 20);
}

fn three_ask_levels(book: &mut OrderBook) {
    ask(book, 1, 100, 10);
    ask(book, 2, 100, 10);
    for id in 3..=5 {
        ask(book, id, 101, 15);
    }
    ask(book, 6, 102, 20);
}

#[test]
fn test_cancel_middle_bid_level_then_partial_fill() {
    let mut book = OrderBook::new();
    three_bid_levels(&mut book);
    for id in 3..=5 {
        book.cancel_order(id).unwrap();
    }
    ask(&mut book, 7, 999, 5);

    assert_eq!(book.quantity_at(Side::Bid, 101), 0);
    assert_eq!(book.get_best_bid_price(), Some(102));

    ask(&mut book, 8, 102, 15);

    assert_eq!(book.get_best_bid_price(), Some(102));
    assert_eq!(fifo(&book, Side::Bid, 102), vec![(2, 5)]);
    assert_eq!(book.quantity_at(Side::Bid, 100), 20);
}

#[test]
fn test_cancel_middle_bid_level_then_sweep() {
    init_logging();
    let mut book = OrderBook::new();
    three_bid_levels(&mut book);
    for id in 3..=5 {
        book.cancel_order(id).unwrap();
    }

    // The sweep walks past the drained 101 level without trading there
    let result = book.place_limit_order_with_id(8, Side::Ask, 100, 50).unwrap();
    let prices: Vec<_> = result.trades.iter().map(|t| t.price).collect();
    assert_eq!(prices, vec![102, 102, 100]);

    assert_eq!(book.get_best_bid(), None);
    assert_eq!(book.get_best_ask_price(), Some(100));
    assert_eq!(book.get_best_ask().map(|o| o.remaining_qty), Some(10));
}

#[test]
fn test_cancel_middle_ask_level_then_partial_fill() {
    let mut book = OrderBook::new();
    three_ask_levels(&mut book);
    for id in 3..=5 {
        book.cancel_order(id).unwrap();
    }
    bid(&mut book, 7, 1, 5);

    assert_eq!(book.quantity_at(Side::Ask, 101), 0);
    assert_eq!(book.get_best_ask_price(), Some(100));

    bid(&mut book, 8, 100, 15);

    assert_eq!(book.get_best_ask_price(), Some(100));
    assert_eq!(book.quantity_at(Side::Ask, 100), 5);
    assert_eq!(book.quantity_at(Side::Ask, 102), 20);
}

#[test]
fn test_cancel_middle_ask_level_then_sweep() {
    let mut book = OrderBook::new();
    three_ask_levels(&mut book);
    for id in 3..=5 {
        book.cancel_order(id).unwrap();
    }
    bid(&mut book, 7, 1, 5);
    bid(&mut book, 8, 102, 50);

    assert_eq!(book.get_best_ask(), None);
    assert_eq!(book.get_best_bid_price(), Some(102));
    assert_eq!(book.get_best_bid().map(|o| o.remaining_qty), Some(10));
}

#[test]
fn test_cancel_head_middle_and_tail_of_level() {
    let mut book = OrderBook::new();
    for id in 1..=5 {
        bid(&mut book, id, 100, id * 10);
    }

    book.cancel_order(1).unwrap();
    book.cancel_order(3).unwrap();
    book.cancel_order(5).unwrap();

    assert_eq!(fifo(&book, Side::Bid, 100), vec![(2, 20), (4, 40)]);
    assert_eq!(book.quantity_at(Side::Bid, 100), 60);
    assert_eq!(book.get_best_bid().map(|o| o.id), Some(2));
}

#[test]
fn test_cancel_unknown_and_twice() {
    let mut book = OrderBook::new();
    bid(&mut book, 1, 100, 10);

    assert_eq!(
        book.cancel_order(42).unwrap_err(),
        BookError::NotFound { order_id: 42 }
    );

    let canceled = book.cancel_order(1).unwrap();
    assert_eq!(canceled.canceled_qty, 10);
    assert_eq!(
        book.cancel_order(1).unwrap_err(),
        BookError::NotFound { order_id: 1 }
    );
}

#[test]
fn test_cancel_filled_order_is_not_found() {
    let mut book = OrderBook::new();
    ask(&mut book, 1, 100, 10);
    bid(&mut book, 2, 100, 10);

    assert!(matches!(
        book.cancel_order(1),
        Err(BookError::NotFound { order_id: 1 })
    ));
    assert!(matches!(
        book.cancel_order(2),
        Err(BookError::NotFound { order_id: 2 })
    ));
}

#[test]
fn test_cancel_every_order_empties_book() {
    let mut book = OrderBook::new();
    for id in 1..=10 {
        bid(&mut book, id, 90 + id, 5);
        ask(&mut book, 100 + id, 200 + id, 5);
    }
    for id in 1..=10 {
        book.cancel_order(id).unwrap();
        book.cancel_order(100 + id).unwrap();
    }

    assert!(book.is_empty());
    assert_eq!(book.get_best_bid(), None);
    assert_eq!(book.get_best_ask(), None);
    assert_eq!(book.tracked_prices(Side::Bid), 0);
    assert_eq!(book.tracked_prices(Side::Ask), 0);
}
