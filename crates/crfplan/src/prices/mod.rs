//! Market price provider
//!
//! Carbon price, FX rate and crop prices are obtained through injected
//! [`QuoteSource`] strategies. Each source is wrapped in a
//! [`GuardedProvider`] (timeout plus reference fallback) and a
//! [`CachedProvider`] (time-bounded memoization). The simulation core never
//! sees a provider; it receives plain numbers and a [`PriceProvenance`].

mod cache;
mod guard;
mod source;

pub use cache::{CachedProvider, DEFAULT_TTL};
pub use guard::{
    DEFAULT_TIMEOUT, GuardedProvider, MAX_TIMEOUT, MIN_TIMEOUT, QuoteProvider, REFERENCE_LABEL,
};
pub use source::{
    Commodity, FixedSource, OfflineSource, PlausibleSource, PriceQuote, QuoteError, QuoteSource,
};

use std::time::Duration;

use crfplan_core::model::{DEFAULT_CARBON_PRICE, DEFAULT_FX_RATE, PriceProvenance};
use jiff::SignedDuration;

/// Boxed provider stack used by the board
pub type BoxedProvider = Box<dyn QuoteProvider>;

/// Access point for every market quote a run needs
pub struct PriceBoard {
    carbon: BoxedProvider,
    fx: BoxedProvider,
    rice: BoxedProvider,
    wheat: BoxedProvider,
}

fn guarded_cached<S: QuoteSource + 'static>(
    source: S,
    fallback: f64,
    timeout: Duration,
    ttl: SignedDuration,
) -> BoxedProvider {
    Box::new(CachedProvider::new(
        GuardedProvider::new(source, fallback).with_timeout(timeout),
        ttl,
    ))
}

fn configured_or_offline(label: &str, value: Option<f64>) -> Box<dyn QuoteSource> {
    match value {
        Some(v) => Box::new(FixedSource::new(label, v)),
        None => Box::new(OfflineSource),
    }
}

impl QuoteSource for Box<dyn QuoteSource> {
    fn name(&self) -> &str {
        self.as_ref().name()
    }

    fn fetch(&self) -> Result<PriceQuote, QuoteError> {
        self.as_ref().fetch()
    }
}

/// Source label for values read from the run file
pub const CONFIG_LABEL: &str = "config";
/// Source label for values given on the command line
pub const CLI_LABEL: &str = "cli";

/// Where the configured carbon price and FX rate came from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarketOrigin {
    pub carbon_from_cli: bool,
    pub fx_from_cli: bool,
}

impl MarketOrigin {
    fn label(from_cli: bool) -> &'static str {
        if from_cli { CLI_LABEL } else { CONFIG_LABEL }
    }

    #[must_use]
    pub fn carbon_label(self) -> &'static str {
        Self::label(self.carbon_from_cli)
    }

    #[must_use]
    pub fn fx_label(self) -> &'static str {
        Self::label(self.fx_from_cli)
    }
}

/// Values and limits for building a [`PriceBoard`]
#[derive(Debug, Clone, PartialEq)]
pub struct BoardSettings {
    pub carbon_price: Option<f64>,
    pub fx_rate: Option<f64>,
    pub rice_price: Option<f64>,
    pub wheat_price: Option<f64>,
    pub origin: MarketOrigin,
    pub timeout: Duration,
    pub ttl: SignedDuration,
}

impl Default for BoardSettings {
    fn default() -> Self {
        Self {
            carbon_price: None,
            fx_rate: None,
            rice_price: None,
            wheat_price: None,
            origin: MarketOrigin::default(),
            timeout: DEFAULT_TIMEOUT,
            ttl: DEFAULT_TTL,
        }
    }
}

impl PriceBoard {
    /// Board whose configured values pass through the guard and cache, and
    /// whose unconfigured values fall back to reference constants
    pub fn from_settings(settings: &BoardSettings) -> Self {
        let (timeout, ttl) = (settings.timeout, settings.ttl);
        let commodity = |value: Option<f64>, c: Commodity| {
            guarded_cached(
                PlausibleSource::for_commodity(configured_or_offline(CONFIG_LABEL, value), c),
                c.reference_price(),
                timeout,
                ttl,
            )
        };
        Self {
            carbon: guarded_cached(
                configured_or_offline(settings.origin.carbon_label(), settings.carbon_price),
                DEFAULT_CARBON_PRICE,
                timeout,
                ttl,
            ),
            fx: guarded_cached(
                configured_or_offline(settings.origin.fx_label(), settings.fx_rate),
                DEFAULT_FX_RATE,
                timeout,
                ttl,
            ),
            rice: commodity(settings.rice_price, Commodity::Rice),
            wheat: commodity(settings.wheat_price, Commodity::Wheat),
        }
    }

    /// Carbon price, foreign currency per t-CO2e
    pub fn get_carbon_price(&self) -> PriceQuote {
        self.carbon.quote()
    }

    /// Local currency per unit of foreign currency
    pub fn get_fx_rate(&self) -> PriceQuote {
        self.fx.quote()
    }

    /// Crop price, currency per tonne
    pub fn get_commodity_price(&self, commodity: Commodity) -> PriceQuote {
        match commodity {
            Commodity::Rice => self.rice.quote(),
            Commodity::Wheat => self.wheat.quote(),
        }
    }

    /// Provenance labels for a pair of quotes
    #[must_use]
    pub fn provenance(carbon: &PriceQuote, fx: &PriceQuote) -> PriceProvenance {
        PriceProvenance {
            carbon_source: carbon.source.clone(),
            carbon_is_live: carbon.is_live,
            fx_source: fx.source.clone(),
            fx_is_live: fx.is_live,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unconfigured_board_uses_reference_values() {
        let board = PriceBoard::from_settings(&BoardSettings::default());
        let carbon = board.get_carbon_price();
        let fx = board.get_fx_rate();
        assert_eq!(carbon.value, DEFAULT_CARBON_PRICE);
        assert_eq!(fx.value, DEFAULT_FX_RATE);
        assert_eq!(carbon.source, REFERENCE_LABEL);
        assert_eq!(board.get_commodity_price(Commodity::Wheat).value, 1200.0);

        let provenance = PriceBoard::provenance(&carbon, &fx);
        assert_eq!(provenance, PriceProvenance::default());
    }

    #[test]
    fn test_configured_values_are_labelled() {
        let board = PriceBoard::from_settings(&BoardSettings {
            carbon_price: Some(100.0),
            rice_price: Some(1800.0),
            wheat_price: Some(9000.0),
            origin: MarketOrigin {
                carbon_from_cli: true,
                fx_from_cli: false,
            },
            ..Default::default()
        });
        let carbon = board.get_carbon_price();
        assert_eq!(carbon.value, 100.0);
        assert_eq!(carbon.source, CLI_LABEL);
        assert!(!carbon.is_live);
        let rice = board.get_commodity_price(Commodity::Rice);
        assert_eq!(rice.value, 1800.0);
        assert_eq!(rice.source, CONFIG_LABEL);
        // Out of window
        assert_eq!(board.get_commodity_price(Commodity::Wheat).value, 1200.0);
    }

    #[test]
    fn test_each_market_value_keeps_its_own_label() {
        let board = PriceBoard::from_settings(&BoardSettings {
            carbon_price: Some(110.0),
            fx_rate: Some(5.4),
            origin: MarketOrigin {
                carbon_from_cli: true,
                fx_from_cli: false,
            },
            ..Default::default()
        });
        let provenance = PriceBoard::provenance(&board.get_carbon_price(), &board.get_fx_rate());
        assert_eq!(provenance.carbon_source, CLI_LABEL);
        assert_eq!(provenance.fx_source, CONFIG_LABEL);
    }
}
