use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use scraper::{ElementRef, Html};

use crate::document::{PageLayout, TextQuery};
use crate::exchange_rate::ExchangeRate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateSide {
    Buy,
    Sell,
}

impl fmt::Display for RateSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateSide::Buy => f.write_str("buy"),
            RateSide::Sell => f.write_str("sell"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Rate(ExchangeRate),
    /// Header or spacer row without a currency code.
    Spacer,
    Malformed {
        currency_code: String,
        side: RateSide,
        value: String,
        error: String,
    },
}

pub fn read_row(row: ElementRef<'_>, layout: &PageLayout, timestamp: NaiveDateTime) -> RowOutcome {
    let currency_code = row.select_text(&layout.currency);
    if currency_code.is_empty() {
        return RowOutcome::Spacer;
    }

    let buy_rate = match parse_rate(row, layout, RateSide::Buy) {
        Ok(rate) => rate,
        Err((value, error)) => {
            return RowOutcome::Malformed {
                currency_code,
                side: RateSide::Buy,
                value,
                error,
            };
        }
    };
    let sell_rate = match parse_rate(row, layout, RateSide::Sell) {
        Ok(rate) => rate,
        Err((value, error)) => {
            return RowOutcome::Malformed {
                currency_code,
                side: RateSide::Sell,
                value,
                error,
            };
        }
    };

    RowOutcome::Rate(ExchangeRate {
        currency_code: currency_code.trim().to_owned(),
        buy_rate,
        sell_rate,
        timestamp,
    })
}

fn parse_rate(
    row: ElementRef<'_>,
    layout: &PageLayout,
    side: RateSide,
) -> Result<Decimal, (String, String)> {
    let selector = match side {
        RateSide::Buy => &layout.buy,
        RateSide::Sell => &layout.sell,
    };
    let value = row.select_text(selector);
    // Decimal::from_str skips digit separators; the page never uses them.
    if value.contains('_') {
        return Err((value, "unexpected '_' in number".to_owned()));
    }
    Decimal::from_str(&value).map_err(|e| (value, e.to_string()))
}

/// Rates of every well-formed row, in document order.
///
/// Rows without a currency code are skipped silently, rows with an
/// unparseable rate are logged and skipped.
pub fn extract_rates(
    document: &Html,
    layout: &PageLayout,
    timestamp: NaiveDateTime,
) -> Vec<ExchangeRate> {
    let mut rates = Vec::new();

    for row in document.select(&layout.rows) {
        match read_row(row, layout, timestamp) {
            RowOutcome::Rate(rate) => rates.push(rate),
            RowOutcome::Spacer => {}
            RowOutcome::Malformed {
                currency_code,
                side,
                value,
                error,
            } => {
                log::warn!("Error parsing {side} rate {value:?} for {currency_code}: {error}");
            }
        }
    }

    rates
}
