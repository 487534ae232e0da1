//! Quote sources
//!
//! A [`QuoteSource`] produces one market value per call and may fail or
//! block. Sources never substitute fallbacks themselves; that is the job of
//! [`super::GuardedProvider`].

use std::fmt;
use std::time::Duration;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// A market value and where it came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub value: f64,
    /// Human-readable source label
    pub source: String,
    /// False for reference fallbacks and configured constants
    pub is_live: bool,
    pub fetched_at: Timestamp,
}

impl PriceQuote {
    pub fn new(value: f64, source: impl Into<String>, is_live: bool) -> Self {
        Self {
            value,
            source: source.into(),
            is_live,
            fetched_at: Timestamp::now(),
        }
    }
}

/// Why a source could not produce a quote
#[derive(Debug, Clone, PartialEq)]
pub enum QuoteError {
    /// The source did not answer within the allowed time
    Timeout(Duration),
    /// The source is unreachable or returned nothing usable
    Unavailable(String),
    /// The value lies outside the plausible window for the quantity
    Implausible { value: f64, min: f64, max: f64 },
}

impl fmt::Display for QuoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuoteError::Timeout(d) => write!(f, "no answer after {:.1}s", d.as_secs_f64()),
            QuoteError::Unavailable(msg) => write!(f, "source unavailable: {msg}"),
            QuoteError::Implausible { value, min, max } => {
                write!(f, "value {value} outside plausible range ({min}, {max})")
            }
        }
    }
}

impl std::error::Error for QuoteError {}

/// Strategy for obtaining one market quantity
pub trait QuoteSource: Send + Sync {
    fn name(&self) -> &str;

    fn fetch(&self) -> Result<PriceQuote, QuoteError>;
}

/// A constant supplied by configuration or the command line
#[derive(Debug, Clone)]
pub struct FixedSource {
    label: String,
    value: f64,
}

impl FixedSource {
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

impl QuoteSource for FixedSource {
    fn name(&self) -> &str {
        &self.label
    }

    fn fetch(&self) -> Result<PriceQuote, QuoteError> {
        if !self.value.is_finite() {
            return Err(QuoteError::Unavailable(format!(
                "{} is not a number",
                self.label
            )));
        }
        Ok(PriceQuote::new(self.value, self.label.clone(), false))
    }
}

/// A source with no live backend; every fetch fails so the guard falls back
#[derive(Debug, Clone, Default)]
pub struct OfflineSource;

impl QuoteSource for OfflineSource {
    fn name(&self) -> &str {
        "offline"
    }

    fn fetch(&self) -> Result<PriceQuote, QuoteError> {
        Err(QuoteError::Unavailable("no live source configured".to_string()))
    }
}

/// Crop commodities with known plausibility windows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Commodity {
    Rice,
    Wheat,
}

impl Commodity {
    /// Open plausible price window (currency/t); both bounds are rejected
    #[must_use]
    pub fn plausible_range(self) -> (f64, f64) {
        match self {
            Commodity::Rice => (800.0, 3000.0),
            Commodity::Wheat => (1000.0, 2500.0),
        }
    }

    /// Reference price used when no plausible quote is available
    #[must_use]
    pub fn reference_price(self) -> f64 {
        match self {
            Commodity::Rice => 1500.0,
            Commodity::Wheat => 1200.0,
        }
    }

    #[must_use]
    pub fn from_crop_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "rice" => Some(Commodity::Rice),
            "wheat" => Some(Commodity::Wheat),
            _ => None,
        }
    }
}

impl fmt::Display for Commodity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Commodity::Rice => write!(f, "rice"),
            Commodity::Wheat => write!(f, "wheat"),
        }
    }
}

/// Rejects quotes outside a plausibility window
pub struct PlausibleSource<S> {
    inner: S,
    min: f64,
    max: f64,
}

impl<S: QuoteSource> PlausibleSource<S> {
    pub fn new(inner: S, min: f64, max: f64) -> Self {
        Self { inner, min, max }
    }

    pub fn for_commodity(inner: S, commodity: Commodity) -> Self {
        let (min, max) = commodity.plausible_range();
        Self::new(inner, min, max)
    }
}

impl<S: QuoteSource> QuoteSource for PlausibleSource<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn fetch(&self) -> Result<PriceQuote, QuoteError> {
        let quote = self.inner.fetch()?;
        if quote.value > self.min && quote.value < self.max {
            Ok(quote)
        } else {
            Err(QuoteError::Implausible {
                value: quote.value,
                min: self.min,
                max: self.max,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_source_is_not_live() {
        let quote = FixedSource::new("config", 92.0).fetch().unwrap();
        assert_eq!(quote.value, 92.0);
        assert_eq!(quote.source, "config");
        assert!(!quote.is_live);
    }

    #[test]
    fn test_fixed_source_rejects_nan() {
        assert!(FixedSource::new("cli", f64::NAN).fetch().is_err());
    }

    #[test]
    fn test_plausibility_window() {
        let ok = PlausibleSource::for_commodity(FixedSource::new("cfg", 2999.0), Commodity::Rice);
        assert!(ok.fetch().is_ok());

        let low = PlausibleSource::for_commodity(FixedSource::new("cfg", 900.0), Commodity::Wheat);
        assert_eq!(
            low.fetch().unwrap_err(),
            QuoteError::Implausible {
                value: 900.0,
                min: 1000.0,
                max: 2500.0
            }
        );

        // Window bounds are exclusive
        for (value, commodity) in [
            (800.0, Commodity::Rice),
            (3000.0, Commodity::Rice),
            (1000.0, Commodity::Wheat),
            (2500.0, Commodity::Wheat),
        ] {
            let source = PlausibleSource::for_commodity(FixedSource::new("cfg", value), commodity);
            assert!(
                matches!(source.fetch(), Err(QuoteError::Implausible { .. })),
                "{commodity:?} at {value} should be rejected"
            );
        }
    }

    #[test]
    fn test_crop_names() {
        assert_eq!(Commodity::from_crop_name("Rice"), Some(Commodity::Rice));
        assert_eq!(Commodity::from_crop_name("WHEAT"), Some(Commodity::Wheat));
        assert_eq!(Commodity::from_crop_name("Maize"), None);
    }
}
