use prometheus::{IntCounterVec, Opts, Registry};

use crate::domain::cache::CacheMetrics;

/// Cache hit/miss counters, labelled by cache.
#[derive(Clone)]
pub struct PrometheusCacheMetrics {
    hits: IntCounterVec,
    misses: IntCounterVec,
}

impl PrometheusCacheMetrics {
    pub fn register(registry: &Registry) -> prometheus::Result<Self> {
        let hits = IntCounterVec::new(
            Opts::new("weather_cache_hits_total", "Cache lookups served from the cache"),
            &["cache"],
        )?;
        let misses = IntCounterVec::new(
            Opts::new("weather_cache_misses_total", "Cache lookups forwarded to a provider"),
            &["cache"],
        )?;
        registry.register(Box::new(hits.clone()))?;
        registry.register(Box::new(misses.clone()))?;
        Ok(Self { hits, misses })
    }

    pub fn hits(&self, cache: &str) -> u64 {
        self.hits.with_label_values(&[cache]).get()
    }

    pub fn misses(&self, cache: &str) -> u64 {
        self.misses.with_label_values(&[cache]).get()
    }
}

impl CacheMetrics for PrometheusCacheMetrics {
    fn hit(&self, cache: &str) {
        self.hits.with_label_values(&[cache]).inc();
    }

    fn miss(&self, cache: &str) {
        self.misses.with_label_values(&[cache]).inc();
    }
}
