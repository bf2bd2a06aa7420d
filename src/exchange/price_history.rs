//! Daily OHLCV aggregation over the trade log (spec.md §4.7).
//!
//! The trade log stores one half-record per side of every trade, both
//! carrying the same price, size and timestamp. The OHLCV series only
//! reads the ask half of each pair so every trade is counted exactly
//! once; bid/ask half-record counts are tallied separately per day.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use std::collections::BTreeMap;

use super::error::ExchangeError;
use super::order::Side;
use super::trade_log::TradeLog;

/// One GMT calendar day's open/high/low/close/volume plus trade counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub open: i64,
    pub high: i64,
    pub low: i64,
    pub close: i64,
    pub volume: i64,
    pub trades_count: i64,
    pub bid_trades: i64,
    pub ask_trades: i64,
}

/// The full `getPriceHistory` result: the requested month plus its
/// daily series and the totals spec.md §6 reports alongside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceHistoryReport {
    pub month: String,
    pub total_days: i64,
    pub total_trades: i64,
    pub bars: Vec<DailyBar>,
}

/// Parse a `MMYYYY` month selector (spec.md §6), e.g. `"032024"`.
fn parse_month_year(input: &str) -> Result<(u32, i32), ExchangeError> {
    if input.len() != 6 || !input.chars().all(|c| c.is_ascii_digit()) {
        return Err(ExchangeError::InvalidMonth {
            input: input.to_string(),
        });
    }
    let month: u32 = input[0..2].parse().map_err(|_| ExchangeError::InvalidMonth {
        input: input.to_string(),
    })?;
    let year: i32 = input[2..6].parse().map_err(|_| ExchangeError::InvalidMonth {
        input: input.to_string(),
    })?;
    if !(1..=12).contains(&month) {
        return Err(ExchangeError::InvalidMonth {
            input: input.to_string(),
        });
    }
    Ok((month, year))
}

/// Build the daily OHLCV series for the given `MMYYYY` month, in
/// ascending date order, plus the month's aggregate totals. An empty
/// `bars` vector means no trades occurred in that month, not an error.
pub fn price_history(log: &TradeLog, month_year: &str) -> Result<PriceHistoryReport, ExchangeError> {
    let (month, year) = parse_month_year(month_year)?;

    let to_date_in_month = |timestamp: i64| -> Option<NaiveDate> {
        let dt = DateTime::<Utc>::from_timestamp(timestamp, 0)?;
        (dt.year() == year && dt.month() == month).then_some(dt.date_naive())
    };

    let mut bid_counts: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    let mut ask_counts: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    let mut ask_halves: Vec<(NaiveDate, i64, i64)> = Vec::new();

    for record in log.load_all() {
        let Some(date) = to_date_in_month(record.timestamp) else {
            continue;
        };
        match record.side {
            Side::Bid => *bid_counts.entry(date).or_insert(0) += 1,
            Side::Ask => {
                *ask_counts.entry(date).or_insert(0) += 1;
                ask_halves.push((date, record.price, record.size));
            }
        }
    }
    ask_halves.sort_by_key(|(date, ..)| *date);

    let mut by_day: BTreeMap<NaiveDate, DailyBar> = BTreeMap::new();
    for (date, price, size) in ask_halves {
        by_day
            .entry(date)
            .and_modify(|bar| {
                bar.high = bar.high.max(price);
                bar.low = bar.low.min(price);
                bar.close = price;
                bar.volume += size;
                bar.trades_count += 1;
            })
            .or_insert(DailyBar {
                date,
                open: price,
                high: price,
                low: price,
                close: price,
                volume: size,
                trades_count: 1,
                bid_trades: 0,
                ask_trades: 0,
            });
    }
    for bar in by_day.values_mut() {
        bar.bid_trades = bid_counts.get(&bar.date).copied().unwrap_or(0);
        bar.ask_trades = ask_counts.get(&bar.date).copied().unwrap_or(0);
    }

    let bars: Vec<DailyBar> = by_day.into_values().collect();
    let total_trades = bars.iter().map(|bar| bar.trades_count).sum();
    let total_days = bars.len() as i64;

    Ok(PriceHistoryReport {
        month: month_year.to_string(),
        total_days,
        total_trades,
        bars,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::order::{OrderId, OrderKind};
    use crate::exchange::trade_log::TradeRecord;

    fn half(id: u64, side: Side, price: i64, size: i64, ts: i64) -> TradeRecord {
        TradeRecord {
            order_id: OrderId(id),
            side,
            order_type: OrderKind::Limit,
            size,
            price,
            timestamp: ts,
        }
    }

    #[test]
    fn rejects_malformed_month() {
        assert!(parse_month_year("132024").is_err());
        assert!(parse_month_year("2024").is_err());
        assert!(parse_month_year("ABCDEF").is_err());
        assert!(parse_month_year("032024").is_ok());
    }

    #[test]
    fn aggregates_one_day_from_multiple_trades() {
        let dir = tempfile::tempdir().expect("tempdir");
        let log = TradeLog::open(dir.path().join("t.json")).expect("open");

        // 2024-03-15 00:00:00 UTC and two hours later.
        let t0 = 1_710_460_800;
        let t1 = t0 + 7_200;
        log.append(half(1, Side::Bid, 100, 10, t0), half(2, Side::Ask, 100, 10, t0));
        log.append(half(3, Side::Bid, 120, 5, t1), half(4, Side::Ask, 90, 5, t1));

        let report = price_history(&log, "032024").unwrap();
        assert_eq!(report.month, "032024");
        assert_eq!(report.total_days, 1);
        assert_eq!(report.total_trades, 2);
        assert_eq!(report.bars.len(), 1);

        let bar = &report.bars[0];
        assert_eq!(bar.open, 100);
        assert_eq!(bar.high, 100);
        assert_eq!(bar.low, 90);
        assert_eq!(bar.close, 90);
        assert_eq!(bar.volume, 15);
        assert_eq!(bar.trades_count, 2);
        assert_eq!(bar.bid_trades, 2);
        assert_eq!(bar.ask_trades, 2);
    }

    #[test]
    fn ignores_trades_outside_the_month() {
        let dir = tempfile::tempdir().expect("tempdir");
        let log = TradeLog::open(dir.path().join("t.json")).expect("open");
        log.append(half(1, Side::Bid, 100, 10, 1_700_000_000), half(2, Side::Ask, 100, 10, 1_700_000_000));

        let report = price_history(&log, "032024").unwrap();
        assert!(report.bars.is_empty());
        assert_eq!(report.total_days, 0);
        assert_eq!(report.total_trades, 0);
    }
}
