//! Time-bounded memoization of quotes

use std::sync::{Mutex, PoisonError};

use jiff::{SignedDuration, Timestamp};

use super::guard::QuoteProvider;
use super::source::PriceQuote;

/// Default time-to-live of a cached quote (one hour)
pub const DEFAULT_TTL: SignedDuration = SignedDuration::from_secs(3600);

/// Reuses the last quote until it is older than `ttl`.
///
/// Fallback quotes are cached too, so an unreachable source is retried at
/// most once per TTL.
pub struct CachedProvider<P> {
    inner: P,
    ttl: SignedDuration,
    slot: Mutex<Option<PriceQuote>>,
}

impl<P: QuoteProvider> CachedProvider<P> {
    pub fn new(inner: P, ttl: SignedDuration) -> Self {
        Self {
            inner,
            ttl,
            slot: Mutex::new(None),
        }
    }

    /// Drop the cached quote so the next call fetches again
    pub fn invalidate(&self) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn is_fresh(&self, quote: &PriceQuote, now: Timestamp) -> bool {
        now.duration_since(quote.fetched_at) < self.ttl
    }
}

impl<P: QuoteProvider> QuoteProvider for CachedProvider<P> {
    fn quote(&self) -> PriceQuote {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(cached) = slot.as_ref().filter(|q| self.is_fresh(q, Timestamp::now())) {
            return cached.clone();
        }
        let quote = self.inner.quote();
        *slot = Some(quote.clone());
        quote
    }
}
