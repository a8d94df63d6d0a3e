//! Integration tests for the classification pipeline
//! Exercises the classifier against deterministic in-memory providers:
//! decision vectors, error mapping, cache reuse, and symbol normalization.

use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crypto_scanner::data::cache::Clock;
use crypto_scanner::data::indicators::{IndicatorKind, IndicatorSource};
use crypto_scanner::data::{
    DataError, DataResult, IndicatorCache, IndicatorProvider, IndicatorSnapshot, PriceProvider,
    TaapiClient,
};
use crypto_scanner::scanner::{Regime, RegimeClassifier, RuleStrategy};

struct FixedPrice {
    price: f64,
    fail_status: Option<u16>,
}

impl FixedPrice {
    fn ok(price: f64) -> Self {
        Self {
            price,
            fail_status: None,
        }
    }

    fn failing(status: u16) -> Self {
        Self {
            price: 0.0,
            fail_status: Some(status),
        }
    }
}

#[async_trait]
impl PriceProvider for FixedPrice {
    async fn fetch_last_price(&self, _symbol: &str) -> DataResult<f64> {
        match self.fail_status {
            Some(status) => Err(DataError::api_error(status, "quote endpoint failure")),
            None => Ok(self.price),
        }
    }
}

struct FixedIndicators {
    snapshot: IndicatorSnapshot,
}

#[async_trait]
impl IndicatorProvider for FixedIndicators {
    async fn fetch_indicators(&self, _symbol: &str) -> DataResult<IndicatorSnapshot> {
        Ok(self.snapshot)
    }
}

struct ManualClock {
    now_ms: AtomicI64,
}

impl ManualClock {
    fn new() -> Self {
        Self {
            now_ms: AtomicI64::new(0),
        }
    }

    fn advance(&self, delta_ms: i64) {
        self.now_ms.fetch_add(delta_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

/// Indicator source that counts upstream reads.
struct CountingSource {
    reads: AtomicUsize,
    ema20: f64,
    adx: f64,
}

impl CountingSource {
    fn new(ema20: f64, adx: f64) -> Self {
        Self {
            reads: AtomicUsize::new(0),
            ema20,
            adx,
        }
    }
}

/// Local newtype so `IndicatorSource` (a foreign trait in this test crate)
/// can be implemented without tripping the orphan rule on `Arc`.
struct SharedSource(Arc<CountingSource>);

#[async_trait]
impl IndicatorSource for SharedSource {
    async fn read_value(&self, kind: IndicatorKind, _symbol: &str) -> DataResult<f64> {
        self.0.reads.fetch_add(1, Ordering::SeqCst);
        Ok(match kind {
            IndicatorKind::Ema20 => self.0.ema20,
            IndicatorKind::Adx => self.0.adx,
        })
    }
}

fn classifier_with_fixed(price: f64, ema20: f64, adx: f64) -> RegimeClassifier {
    RegimeClassifier::new(
        Arc::new(FixedPrice::ok(price)),
        Arc::new(FixedIndicators {
            snapshot: IndicatorSnapshot { ema20, adx },
        }),
        Arc::new(RuleStrategy),
    )
}

/// Classifier whose indicator side runs the real client + cache against a
/// counting source and a manual clock.
fn classifier_with_cache(
    source: Arc<CountingSource>,
    clock: Arc<ManualClock>,
) -> RegimeClassifier {
    let indicators = TaapiClient::new(SharedSource(source), IndicatorCache::new(65_000, clock));
    RegimeClassifier::new(
        Arc::new(FixedPrice::ok(45_000.0)),
        Arc::new(indicators),
        Arc::new(RuleStrategy),
    )
}

#[tokio::test]
async fn test_trending_decision_vector() {
    let result = classifier_with_fixed(45_000.0, 44_500.0, 65.0)
        .classify("BTC")
        .await;

    assert_eq!(result.regime, Regime::Trending);
    assert_eq!(result.confidence, 1.0);
    assert_eq!(result.last_price, 45_000.0);
    assert_eq!(
        result.indicators,
        Some(IndicatorSnapshot {
            ema20: 44_500.0,
            adx: 65.0
        })
    );
}

#[tokio::test]
async fn test_price_below_ema_ranges() {
    let result = classifier_with_fixed(44_000.0, 44_500.0, 65.0)
        .classify("BTC")
        .await;
    assert_eq!(result.regime, Regime::Ranging);
    assert_eq!(result.confidence, 0.5);
}

#[tokio::test]
async fn test_weak_adx_ranges() {
    let result = classifier_with_fixed(45_000.0, 44_500.0, 20.0)
        .classify("BTC")
        .await;
    assert_eq!(result.regime, Regime::Ranging);
    assert_eq!(result.confidence, 0.5);
}

#[tokio::test]
async fn test_successful_pipeline_never_returns_unknown() {
    for (price, ema20, adx) in [
        (1.0, 2.0, 0.0),
        (100.0, 50.0, 25.0),
        (100.0, 50.0, 99.0),
        (0.1, 0.2, 45.0),
    ] {
        let result = classifier_with_fixed(price, ema20, adx).classify("ETH").await;
        assert_ne!(result.regime, Regime::Unknown);
        assert!((0.0..=1.0).contains(&result.confidence));
    }
}

#[tokio::test]
async fn test_upstream_failure_produces_exact_unknown_shape() {
    let classifier = RegimeClassifier::new(
        Arc::new(FixedPrice::failing(429)),
        Arc::new(FixedIndicators {
            snapshot: IndicatorSnapshot {
                ema20: 44_500.0,
                adx: 65.0,
            },
        }),
        Arc::new(RuleStrategy),
    );

    let result = classifier.classify("BTC").await;

    assert_eq!(result.symbol, "BTC");
    assert_eq!(result.regime, Regime::Unknown);
    assert_eq!(result.confidence, 0.0);
    assert!(result.last_price.is_nan());
    assert!(result.indicators.is_none());
    assert_eq!(result.model.as_deref(), Some("error_429"));
}

#[tokio::test]
async fn test_cache_bounds_upstream_requests_across_classify_calls() {
    let source = Arc::new(CountingSource::new(44_500.0, 30.0));
    let clock = Arc::new(ManualClock::new());
    let classifier = classifier_with_cache(source.clone(), clock.clone());

    classifier.classify("BTC").await;
    clock.advance(30_000);
    classifier.classify("BTC").await;
    assert_eq!(
        source.reads.load(Ordering::SeqCst),
        2,
        "two classify calls inside the window share one request pair"
    );

    clock.advance(40_000);
    classifier.classify("BTC").await;
    assert_eq!(
        source.reads.load(Ordering::SeqCst),
        4,
        "expiry forces a second request pair"
    );
}

#[tokio::test]
async fn test_lowercase_and_uppercase_symbols_share_cache_and_agree() {
    let source = Arc::new(CountingSource::new(44_500.0, 30.0));
    let clock = Arc::new(ManualClock::new());
    let classifier = classifier_with_cache(source.clone(), clock.clone());

    let lower = classifier.classify("btc").await;
    let upper = classifier.classify("BTC").await;

    assert_eq!(lower.symbol, "BTC");
    assert_eq!(upper.symbol, "BTC");
    assert_eq!(lower.indicators, upper.indicators);
    assert_eq!(
        source.reads.load(Ordering::SeqCst),
        2,
        "the second spelling hit the first spelling's cache entry"
    );
}

#[tokio::test]
async fn test_repeated_calls_with_identical_upstreams_are_idempotent() {
    let classifier = classifier_with_fixed(44_000.0, 44_500.0, 65.0);

    let first = classifier.classify("SOL").await;
    let second = classifier.classify("SOL").await;

    assert_eq!(first.regime, second.regime);
    assert_eq!(first.confidence, second.confidence);
    assert_eq!(first.last_price, second.last_price);
    assert_eq!(first.indicators, second.indicators);
}
