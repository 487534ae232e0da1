//! Timeout and fallback around a quote source

use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use super::source::{PriceQuote, QuoteError, QuoteSource};

/// Default time allowed for a source to answer
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(12);
/// Accepted timeout range for configured values
pub const MIN_TIMEOUT: Duration = Duration::from_secs(10);
pub const MAX_TIMEOUT: Duration = Duration::from_secs(15);

/// Label carried by fallback quotes
pub const REFERENCE_LABEL: &str = "Reference";

/// Something that always yields a quote
pub trait QuoteProvider: Send + Sync {
    fn quote(&self) -> PriceQuote;
}

/// Runs a source on a worker thread and waits at most `timeout` for it.
///
/// Any failure (error, timeout, implausible value) yields the reference
/// value with `is_live = false`. A source that times out keeps running
/// detached; its late answer is dropped.
pub struct GuardedProvider {
    source: Arc<dyn QuoteSource>,
    timeout: Duration,
    fallback: f64,
}

impl GuardedProvider {
    pub fn new(source: impl QuoteSource + 'static, fallback: f64) -> Self {
        Self {
            source: Arc::new(source),
            timeout: DEFAULT_TIMEOUT,
            fallback,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn fetch_with_timeout(&self) -> Result<PriceQuote, QuoteError> {
        let (tx, rx) = mpsc::channel();
        let source = Arc::clone(&self.source);
        thread::Builder::new()
            .name(format!("quote-{}", self.source.name()))
            .spawn(move || {
                // The receiver is gone if we already timed out
                let _ = tx.send(source.fetch());
            })
            .map_err(|e| QuoteError::Unavailable(format!("failed to spawn fetch: {e}")))?;

        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(QuoteError::Timeout(self.timeout)),
            Err(RecvTimeoutError::Disconnected) => Err(QuoteError::Unavailable(
                "fetch ended without a result".to_string(),
            )),
        }
    }
}

impl QuoteProvider for GuardedProvider {
    fn quote(&self) -> PriceQuote {
        match self.fetch_with_timeout() {
            Ok(quote) => {
                tracing::debug!(source = %quote.source, value = quote.value, "quote received");
                quote
            }
            Err(err) => {
                tracing::warn!(
                    source = self.source.name(),
                    fallback = self.fallback,
                    "quote unavailable, using reference value: {err}"
                );
                PriceQuote::new(self.fallback, REFERENCE_LABEL, false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prices::source::{Commodity, FixedSource, OfflineSource, PlausibleSource};

    struct SlowSource(Duration);

    impl QuoteSource for SlowSource {
        fn name(&self) -> &str {
            "slow"
        }

        fn fetch(&self) -> Result<PriceQuote, QuoteError> {
            thread::sleep(self.0);
            Ok(PriceQuote::new(1.0, "slow", true))
        }
    }

    #[test]
    fn test_successful_source_passes_through() {
        let provider = GuardedProvider::new(FixedSource::new("config", 91.5), 85.0);
        let quote = provider.quote();
        assert_eq!(quote.value, 91.5);
        assert_eq!(quote.source, "config");
    }

    #[test]
    fn test_failure_falls_back() {
        let quote = GuardedProvider::new(OfflineSource, 85.0).quote();
        assert_eq!(quote.value, 85.0);
        assert_eq!(quote.source, REFERENCE_LABEL);
        assert!(!quote.is_live);
    }

    #[test]
    fn test_timeout_falls_back() {
        let provider = GuardedProvider::new(SlowSource(Duration::from_millis(500)), 6.0)
            .with_timeout(Duration::from_millis(20));
        let quote = provider.quote();
        assert_eq!(quote.value, 6.0);
        assert!(!quote.is_live);
    }

    #[test]
    fn test_implausible_commodity_falls_back() {
        let source =
            PlausibleSource::for_commodity(FixedSource::new("config", 5000.0), Commodity::Rice);
        let quote = GuardedProvider::new(source, Commodity::Rice.reference_price()).quote();
        assert_eq!(quote.value, 1500.0);
        assert_eq!(quote.source, REFERENCE_LABEL);
    }
}
