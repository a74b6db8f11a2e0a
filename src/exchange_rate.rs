use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

/// One row of the published rate table, stamped with the time of the page it
/// was taken from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeRate {
    pub currency_code: String,
    pub buy_rate: Decimal,
    pub sell_rate: Decimal,
    pub timestamp: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct StoredExchangeRate {
    pub id: Uuid,
    pub currency_code: String,
    pub buy_rate: Decimal,
    pub sell_rate: Decimal,
    pub timestamp: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct AverageRate {
    pub currency_code: String,
    pub average_buy: Decimal,
    pub average_sell: Decimal,
}
