//! Adjusted close history from Yahoo Finance.

use crate::error::{DataError, Result};
use crate::source::{PriceRequest, PriceSource, SymbolHistory, align_histories};
use chrono::{DateTime, Days, NaiveDate};
use futures::{StreamExt, TryStreamExt, stream};
use std::future::Future;
use std::time::Duration;
use tangency_risk::PriceSeries;
use tokio::time::sleep;
use tracing::{debug, info};
use yahoo_finance_api as yahoo;

/// Maximum number of symbols fetched at once
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Yahoo Finance price source with rate limiting.
pub struct YahooPriceSource {
    provider: yahoo::YahooConnector,
    rate_limit_delay: Duration,
    concurrency: usize,
}

impl std::fmt::Debug for YahooPriceSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YahooPriceSource")
            .field("rate_limit_delay", &self.rate_limit_delay)
            .field("concurrency", &self.concurrency)
            .finish_non_exhaustive()
    }
}

impl YahooPriceSource {
    /// Create a source with default rate limiting (250ms after each request).
    ///
    /// # Errors
    /// Returns `YahooApi` if the HTTP connector cannot be built.
    pub fn try_new() -> Result<Self> {
        Self::with_rate_limit(Duration::from_millis(250))
    }

    /// Create a source with a custom delay after each request.
    ///
    /// # Errors
    /// Returns `YahooApi` if the HTTP connector cannot be built.
    pub fn with_rate_limit(rate_limit_delay: Duration) -> Result<Self> {
        Ok(Self {
            provider: yahoo::YahooConnector::new()?,
            rate_limit_delay,
            concurrency: DEFAULT_CONCURRENCY,
        })
    }

    /// Set how many symbols are requested concurrently (at least 1).
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Fetch the adjusted close history of one symbol over the closed range.
    ///
    /// # Errors
    /// * `InsufficientData` when Yahoo returns no quotes in the range
    /// * `YahooApi` for transport or response errors
    pub async fn fetch_history(&self, symbol: &str, request: &PriceRequest) -> Result<SymbolHistory> {
        let start_time = to_offset_date_time(request.start())?;
        // Yahoo treats the end as exclusive
        let end_time = to_offset_date_time(
            request
                .end()
                .checked_add_days(Days::new(1))
                .ok_or_else(|| DataError::TimeConversion(format!("{} overflows", request.end())))?,
        )?;

        debug!(symbol, start = %request.start(), end = %request.end(), "requesting quote history");

        let response = self
            .provider
            .get_quote_history(symbol, start_time, end_time)
            .await
            .map_err(|e| DataError::YahooApi(format!("{symbol}: {e}")))?;

        let quotes = quotes_or_empty(symbol, response.quotes())?;

        let observations = quotes
            .iter()
            .filter_map(|q| {
                let date = DateTime::from_timestamp(q.timestamp, 0)?.date_naive();
                request.contains(date).then_some((date, q.adjclose))
            })
            .collect::<Vec<_>>();

        sleep(self.rate_limit_delay).await;

        if observations.is_empty() {
            return Err(DataError::empty_history(symbol, 0));
        }

        info!(symbol, observations = observations.len(), "fetched price history");
        Ok(SymbolHistory::new(symbol, observations))
    }
}

impl PriceSource for YahooPriceSource {
    fn fetch_prices(
        &self,
        request: &PriceRequest,
    ) -> impl Future<Output = Result<PriceSeries>> + Send {
        async move {
            let fetches: Vec<_> = request
                .symbols()
                .iter()
                .map(|symbol| self.fetch_history(symbol, request))
                .collect();
            let histories: Vec<SymbolHistory> = stream::iter(fetches)
                .buffered(self.concurrency)
                .try_collect()
                .await?;

            align_histories(&histories)
        }
    }
}

/// An empty chart comes back as a quotes error; anything else is a bad response.
fn quotes_or_empty(
    symbol: &str,
    quotes: std::result::Result<Vec<yahoo::Quote>, yahoo::YahooError>,
) -> Result<Vec<yahoo::Quote>> {
    match quotes {
        Ok(quotes) => Ok(quotes),
        Err(e @ (yahoo::YahooError::NoQuotes | yahoo::YahooError::NoResult)) => {
            debug!(symbol, error = %e, "no quotes in response");
            Ok(Vec::new())
        }
        Err(e) => Err(DataError::YahooApi(format!("{symbol}: {e}"))),
    }
}

fn to_offset_date_time(date: NaiveDate) -> Result<time::OffsetDateTime> {
    let timestamp = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| DataError::TimeConversion(format!("invalid midnight for {date}")))?
        .and_utc()
        .timestamp();
    time::OffsetDateTime::from_unix_timestamp(timestamp)
        .map_err(|e| DataError::TimeConversion(e.to_string()))
}
