use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};
use sqlx::postgres::{PgPool, PgPoolOptions};
use uuid::Uuid;

use crate::exchange_rate::{AverageRate, ExchangeRate, StoredExchangeRate};

pub const QUERY_DATE_FORMAT: &str = "%d-%m-%Y";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RangeError {
    #[error("Both start_date and end_date are required")]
    Missing,
    #[error("Invalid start_date format. Use DD-MM-YYYY")]
    InvalidStart,
    #[error("Invalid end_date format. Use DD-MM-YYYY")]
    InvalidEnd,
}

/// Half-open interval `[start, end)` of stored timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl DateRange {
    /// Builds the range covering both supplied days entirely.
    pub fn from_query(start_date: &str, end_date: &str) -> Result<Self, RangeError> {
        if start_date.is_empty() || end_date.is_empty() {
            return Err(RangeError::Missing);
        }
        let start = NaiveDate::parse_from_str(start_date, QUERY_DATE_FORMAT)
            .map_err(|_| RangeError::InvalidStart)?;
        let end = NaiveDate::parse_from_str(end_date, QUERY_DATE_FORMAT)
            .map_err(|_| RangeError::InvalidEnd)?
            .checked_add_days(Days::new(1))
            .ok_or(RangeError::InvalidEnd)?;

        Ok(Self {
            start: start.and_time(NaiveTime::MIN),
            end: end.and_time(NaiveTime::MIN),
        })
    }

    #[cfg(test)]
    pub fn contains(&self, timestamp: NaiveDateTime) -> bool {
        self.start <= timestamp && timestamp < self.end
    }
}

#[async_trait]
pub trait RateStore: Send + Sync {
    async fn append(&self, rate: &ExchangeRate) -> Result<()>;

    /// Most recent rates of every currency code.
    async fn latest(&self) -> Result<Vec<StoredExchangeRate>>;

    async fn averages(&self, range: &DateRange) -> Result<Vec<AverageRate>>;
}

pub struct PgRateStore {
    pool: PgPool,
}

impl PgRateStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await
            .context("Failed to connect to database")?;

        Ok(Self { pool })
    }

    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS currencies (
                id UUID PRIMARY KEY,
                currency_code VARCHAR(10) NOT NULL,
                buy_rate DECIMAL(10,4) NOT NULL,
                sell_rate DECIMAL(10,4) NOT NULL,
                timestamp TIMESTAMP NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create table")?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_currency_timestamp ON currencies (currency_code, timestamp)",
        )
        .execute(&self.pool)
        .await
        .context("Failed to create index")?;

        Ok(())
    }
}

#[async_trait]
impl RateStore for PgRateStore {
    async fn append(&self, rate: &ExchangeRate) -> Result<()> {
        sqlx::query(
            "INSERT INTO currencies (id, currency_code, buy_rate, sell_rate, timestamp) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(Uuid::new_v4())
        .bind(&rate.currency_code)
        .bind(rate.buy_rate)
        .bind(rate.sell_rate)
        .bind(rate.timestamp)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn latest(&self) -> Result<Vec<StoredExchangeRate>> {
        let rates = sqlx::query_as::<_, StoredExchangeRate>(
            r#"
            WITH latest_timestamps AS (
                SELECT currency_code, MAX(timestamp) AS max_timestamp
                FROM currencies
                GROUP BY currency_code
            )
            SELECT c.id, c.currency_code, c.buy_rate, c.sell_rate, c.timestamp
            FROM currencies c
            JOIN latest_timestamps lt
                ON c.currency_code = lt.currency_code AND c.timestamp = lt.max_timestamp
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rates)
    }

    async fn averages(&self, range: &DateRange) -> Result<Vec<AverageRate>> {
        let averages = sqlx::query_as::<_, AverageRate>(
            r#"
            SELECT
                currency_code,
                AVG(buy_rate) AS average_buy,
                AVG(sell_rate) AS average_sell
            FROM currencies
            WHERE timestamp >= $1 AND timestamp < $2
            GROUP BY currency_code
            "#,
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await?;

        Ok(averages)
    }
}
