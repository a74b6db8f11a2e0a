use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::StatusCode;

use crate::document::{DocumentError, DocumentSource, PageLayout, parse_document};
use crate::exchange_rate::ExchangeRate;
use crate::rate_table::extract_rates;
use crate::storage::RateStore;
use crate::timestamp::extract_timestamp;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Failures that end a run before anything is persisted.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("Failed to fetch webpage: {0:#}")]
    Fetch(anyhow::Error),
    #[error("Bad response status: {0}")]
    Status(StatusCode),
    #[error("Failed to parse HTML: {0}")]
    Parse(#[from] DocumentError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub timestamp: NaiveDateTime,
    /// Set when no header parsed and the clock supplied the timestamp.
    pub timestamp_fallback: bool,
    pub rates: Vec<ExchangeRate>,
}

/// Parses the page and pulls every rate out of it, stamped with one shared
/// timestamp.
pub fn extract(body: &[u8], layout: &PageLayout, clock: &dyn Clock) -> Result<Extraction, DocumentError> {
    let document = parse_document(body)?;

    let (timestamp, timestamp_fallback) = match extract_timestamp(&document, layout) {
        Some(timestamp) => (timestamp, false),
        None => {
            log::info!("Using current time as timestamp");
            (clock.now().naive_utc(), true)
        }
    };
    let rates = extract_rates(&document, layout, timestamp);

    Ok(Extraction {
        timestamp,
        timestamp_fallback,
        rates,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub timestamp: NaiveDateTime,
    pub timestamp_fallback: bool,
    /// Number of inserts issued, whether or not they succeeded.
    pub attempted: usize,
    pub persisted: usize,
}

#[derive(Debug)]
pub enum RunOutcome {
    Aborted(RunError),
    Completed(RunSummary),
}

/// One fetch, extract and persist cycle against the rate page.
///
/// Holds no state between runs, so clones may run concurrently.
#[derive(Clone)]
pub struct Collector {
    source: Arc<dyn DocumentSource>,
    store: Arc<dyn RateStore>,
    clock: Arc<dyn Clock>,
    layout: Arc<PageLayout>,
}

impl Collector {
    pub fn new(
        source: Arc<dyn DocumentSource>,
        store: Arc<dyn RateStore>,
        clock: Arc<dyn Clock>,
        layout: PageLayout,
    ) -> Self {
        Self {
            source,
            store,
            clock,
            layout: Arc::new(layout),
        }
    }

    pub async fn run_once(&self) -> RunOutcome {
        log::info!("Starting currency parsing...");

        match self.collect().await {
            Ok(summary) => {
                log::info!("Parsed and saved {} currencies", summary.attempted);
                RunOutcome::Completed(summary)
            }
            Err(e) => {
                log::error!("{e}");
                RunOutcome::Aborted(e)
            }
        }
    }

    async fn collect(&self) -> Result<RunSummary, RunError> {
        let page = self.source.fetch().await.map_err(RunError::Fetch)?;
        if !page.status.is_success() {
            return Err(RunError::Status(page.status));
        }

        let extraction = extract(&page.body, &self.layout, self.clock.as_ref())?;
        let persisted = self.persist(&extraction.rates).await;

        Ok(RunSummary {
            timestamp: extraction.timestamp,
            timestamp_fallback: extraction.timestamp_fallback,
            attempted: extraction.rates.len(),
            persisted,
        })
    }

    async fn persist(&self, rates: &[ExchangeRate]) -> usize {
        let mut persisted = 0;
        for rate in rates {
            match self.store.append(rate).await {
                Ok(()) => persisted += 1,
                Err(e) => log::warn!("Failed to save currency {}: {e:#}", rate.currency_code),
            }
        }
        persisted
    }
}
