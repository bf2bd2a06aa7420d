//! MatchingEngine: crosses the book and sweeps market orders (spec.md §4.2).
//!
//! Both entry points assume the caller already holds the exchange's
//! single matching lock; neither function takes or releases it itself,
//! mirroring the teacher's separation of `book.rs` (data structure)
//! from the lock discipline enforced by its callers.

use std::sync::Arc;

use super::order::{Order, Side};
use super::price_book::PriceBook;

/// Reported once per executed trade: the two resting/aggressing orders,
/// how much traded, and at what price.
pub struct Fill {
    pub bid_order: Arc<Order>,
    pub ask_order: Arc<Order>,
    pub trade_size: i64,
    pub execution_price: i64,
}

/// spec.md's deliberately-preserved pricing convention for a
/// limit/limit cross: every trade prints at the book's current best
/// ask, independent of which side is resting and which is aggressing.
/// This only applies to `match_limits` — `execute_market` prices each
/// fill at the resting level it consumes, the ordinary convention.
fn match_limits_execution_price(book: &PriceBook) -> Option<i64> {
    book.best_ask()
}

/// Cross the book while the best bid is at or above the best ask,
/// invoking `on_trade` once per match. Each call already reflects the
/// reduced remaining sizes and settled book state.
pub fn match_limits(book: &PriceBook, mut on_trade: impl FnMut(Fill)) {
    loop {
        let Some((bid_price, bid_order)) = book.peek_best(Side::Bid) else {
            break;
        };
        let Some((ask_price, ask_order)) = book.peek_best(Side::Ask) else {
            break;
        };
        if bid_price < ask_price {
            break;
        }

        let trade_size = bid_order.remaining().min(ask_order.remaining());
        if trade_size <= 0 {
            break;
        }
        let Some(price) = match_limits_execution_price(book) else {
            break;
        };

        bid_order.reduce_remaining(trade_size);
        ask_order.reduce_remaining(trade_size);
        book.settle_head(Side::Bid, bid_price);
        book.settle_head(Side::Ask, ask_price);

        on_trade(Fill {
            bid_order,
            ask_order,
            trade_size,
            execution_price: price,
        });
    }
}

/// Sweep `order` against the contra side of the book until it is
/// either fully filled or the contra side runs dry. The market order
/// is never inserted into the book: any unfilled remainder at the end
/// of the sweep is left on the order itself with no resting record
/// (spec.md §4.2, §9: the orphaned partial-fill is preserved behavior).
///
/// Returns `true` if `order` was fully filled.
pub fn execute_market(book: &PriceBook, order: &Arc<Order>, mut on_trade: impl FnMut(Fill)) -> bool {
    for (level_price, level) in book.contra_levels(order.side) {
        loop {
            if order.remaining() <= 0 {
                return true;
            }
            let Some(resting) = level.peek_front() else {
                break;
            };

            let trade_size = order.remaining().min(resting.remaining());
            if trade_size <= 0 {
                break;
            }
            let price = level_price;

            order.reduce_remaining(trade_size);
            resting.reduce_remaining(trade_size);
            let level_empty = level.settle();

            let (bid_order, ask_order) = match order.side {
                Side::Bid => (order.clone(), resting.clone()),
                Side::Ask => (resting.clone(), order.clone()),
            };
            on_trade(Fill {
                bid_order,
                ask_order,
                trade_size,
                execution_price: price,
            });

            if level_empty {
                book.settle_head(order.side.opposite(), level_price);
                break;
            }
        }
        if order.remaining() <= 0 {
            return true;
        }
    }
    order.remaining() <= 0
}
