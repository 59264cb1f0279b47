//! Entry point that keeps the rate store in line with a rate source

use crate::core::config::AppConfig;
use crate::core::currency::{
    CurrencyCode, CurrencyId, CurrencyResolver, IsoCurrencyResolver, normalize_currencies,
    normalize_currency,
};
use crate::core::derive::CrossRateDeriver;
use crate::core::error::Result;
use crate::core::rates::{Multipliers, RateSource, RateStore};
use crate::providers::default_rate_source;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

type SourceFactory = Box<dyn Fn() -> Arc<dyn RateSource> + Send + Sync>;

/// What to derive. Built either from a plain list of currencies or through
/// the builder methods.
#[derive(Clone, Default)]
pub struct RateRequest {
    currencies: Vec<CurrencyId>,
    reference: Option<CurrencyId>,
    source: Option<Arc<dyn RateSource>>,
}

impl RateRequest {
    pub fn new<I, C>(currencies: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<CurrencyId>,
    {
        Self {
            currencies: currencies.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Currency the direct rates are quoted from. Defaults to the first currency.
    pub fn reference(mut self, reference: impl Into<CurrencyId>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    /// Uses `source` instead of the sync's default source.
    pub fn source(mut self, source: Arc<dyn RateSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn currencies(&self) -> &[CurrencyId] {
        &self.currencies
    }

    pub fn reference_currency(&self) -> Option<&CurrencyId> {
        self.reference.as_ref()
    }
}

impl fmt::Debug for RateRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateRequest")
            .field("currencies", &self.currencies)
            .field("reference", &self.reference)
            .field("source", &self.source.as_ref().map(|_| "custom"))
            .finish()
    }
}

impl<C: Into<CurrencyId>> From<Vec<C>> for RateRequest {
    fn from(currencies: Vec<C>) -> Self {
        RateRequest::new(currencies)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyncReport {
    pub reference: Option<CurrencyCode>,
    pub currencies: Vec<CurrencyCode>,
    pub writes: usize,
}

pub struct RateSync {
    store: Arc<dyn RateStore>,
    deriver: CrossRateDeriver,
    resolver: Arc<dyn CurrencyResolver>,
    default_source: SourceFactory,
}

impl RateSync {
    pub fn new<F>(store: Arc<dyn RateStore>, multipliers: Multipliers, default_source: F) -> Self
    where
        F: Fn() -> Arc<dyn RateSource> + Send + Sync + 'static,
    {
        Self {
            store,
            deriver: CrossRateDeriver::new(multipliers),
            resolver: Arc::new(IsoCurrencyResolver),
            default_source: Box::new(default_source),
        }
    }

    /// Multipliers and the default source both come from `config`.
    pub fn from_config(config: &AppConfig, store: Arc<dyn RateStore>) -> Self {
        let source_config = config.clone();
        Self::new(store, config.multipliers(), move || {
            default_rate_source(&source_config)
        })
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn CurrencyResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn store(&self) -> Arc<dyn RateStore> {
        Arc::clone(&self.store)
    }

    /// Normalizes the requested currencies, refreshes the source and writes
    /// every ordered pair rate into the store.
    pub async fn derive_and_store(&self, request: impl Into<RateRequest>) -> Result<SyncReport> {
        let request = request.into();
        let currencies = self.resolve_currencies(&request)?;

        let source = match request.source {
            Some(source) => source,
            None => {
                debug!("No rate source given, using the default");
                (self.default_source)()
            }
        };

        let writes = self
            .deriver
            .derive_and_store(&currencies, source.as_ref(), self.store.as_ref())
            .await?;

        info!(writes, "Rate sync finished");
        Ok(SyncReport {
            reference: currencies.first().cloned(),
            currencies,
            writes,
        })
    }

    // Normalized currencies with the reference first.
    fn resolve_currencies(&self, request: &RateRequest) -> Result<Vec<CurrencyCode>> {
        let mut currencies = normalize_currencies(&request.currencies, self.resolver.as_ref())?;
        if let Some(reference) = &request.reference {
            let reference = normalize_currency(reference, self.resolver.as_ref())?;
            currencies.retain(|c| c != &reference);
            currencies.insert(0, reference);
        }
        Ok(currencies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::currency::find_currency;
    use crate::core::error::RateError;
    use crate::providers::fixed::FixedRateSource;
    use crate::store::memory::MemoryRateStore;
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn code(c: &str) -> CurrencyCode {
        c.parse().unwrap()
    }

    /// Fixed source that counts refreshes.
    struct CountingSource {
        inner: FixedRateSource,
        refreshes: AtomicUsize,
    }

    impl CountingSource {
        fn eur() -> Self {
            Self {
                inner: FixedRateSource::new(
                    code("EUR"),
                    BTreeMap::from([(code("USD"), 1.42), (code("CAD"), 1.12)]),
                ),
                refreshes: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl RateSource for CountingSource {
        async fn refresh(&self, currencies: &[CurrencyCode]) -> Result<()> {
            self.refreshes.fetch_add(1, Ordering::SeqCst);
            self.inner.refresh(currencies).await
        }

        async fn get_direct_rate(&self, from: &CurrencyCode, to: &CurrencyCode) -> Result<f64> {
            self.inner.get_direct_rate(from, to).await
        }
    }

    fn sync_with_default(
        store: Arc<MemoryRateStore>,
        multipliers: Multipliers,
    ) -> (RateSync, Arc<CountingSource>, Arc<AtomicUsize>) {
        let source = Arc::new(CountingSource::eur());
        let built = Arc::new(AtomicUsize::new(0));
        let (factory_source, factory_built) = (Arc::clone(&source), Arc::clone(&built));
        let sync = RateSync::new(store, multipliers, move || {
            factory_built.fetch_add(1, Ordering::SeqCst);
            Arc::clone(&factory_source) as Arc<dyn RateSource>
        });
        (sync, source, built)
    }

    async fn rate(store: &MemoryRateStore, from: &str, to: &str) -> f64 {
        store
            .get_rate(&code(from), &code(to))
            .await
            .unwrap()
            .unwrap_or_else(|| panic!("no rate for {from}/{to}"))
            .rate
    }

    async fn assert_eur_usd_cad(store: &MemoryRateStore) {
        assert_eq!(store.all_rates().await.unwrap().len(), 6);
        assert_eq!(rate(store, "EUR", "USD").await, 1.42);
        assert_eq!(rate(store, "USD", "EUR").await, 1.0 / 1.42);
        assert_eq!(rate(store, "EUR", "CAD").await, 1.12);
        assert_eq!(rate(store, "CAD", "EUR").await, 1.0 / 1.12);
        assert!((rate(store, "CAD", "USD").await - 1.42 / 1.12).abs() < 1e-7);
        assert!((rate(store, "USD", "CAD").await - 1.12 / 1.42).abs() < 1e-7);
    }

    #[tokio::test]
    async fn test_default_source() {
        let store = Arc::new(MemoryRateStore::new());
        let (sync, source, built) = sync_with_default(Arc::clone(&store), Multipliers::new());

        let report = sync
            .derive_and_store(RateRequest::new(["EUR", "USD", "CAD"]))
            .await
            .unwrap();

        assert_eq!(report.writes, 6);
        assert_eq!(report.reference, Some(code("EUR")));
        assert_eq!(built.load(Ordering::SeqCst), 1);
        assert_eq!(source.refreshes.load(Ordering::SeqCst), 1);
        assert_eur_usd_cad(&store).await;
    }

    #[tokio::test]
    async fn test_given_source_skips_default() {
        let store = Arc::new(MemoryRateStore::new());
        let (sync, default_source, built) =
            sync_with_default(Arc::clone(&store), Multipliers::new());
        let custom = Arc::new(CountingSource::eur());

        sync.derive_and_store(RateRequest::new(["EUR", "USD", "CAD"]).source(custom.clone()))
            .await
            .unwrap();

        assert_eq!(built.load(Ordering::SeqCst), 0);
        assert_eq!(default_source.refreshes.load(Ordering::SeqCst), 0);
        assert_eq!(custom.refreshes.load(Ordering::SeqCst), 1);
        assert_eur_usd_cad(&store).await;
    }

    #[tokio::test]
    async fn test_mixed_currency_identifiers() {
        let store = Arc::new(MemoryRateStore::new());
        let (sync, _, _) = sync_with_default(Arc::clone(&store), Multipliers::new());

        let currencies: Vec<CurrencyId> = vec![
            "eur".into(),
            String::from("USD").into(),
            find_currency("CAD").unwrap().into(),
        ];
        let report = sync.derive_and_store(RateRequest::new(currencies)).await.unwrap();

        assert_eq!(report.currencies, vec![code("EUR"), code("USD"), code("CAD")]);
        assert_eur_usd_cad(&store).await;
    }

    #[tokio::test]
    async fn test_plain_list_matches_builder() {
        let store = Arc::new(MemoryRateStore::new());
        let (sync, _, built) = sync_with_default(Arc::clone(&store), Multipliers::new());

        let report = sync.derive_and_store(vec!["EUR", "USD", "CAD"]).await.unwrap();

        assert_eq!(report.writes, 6);
        assert_eq!(built.load(Ordering::SeqCst), 1);
        assert_eur_usd_cad(&store).await;
    }

    #[tokio::test]
    async fn test_multipliers() {
        let store = Arc::new(MemoryRateStore::new());
        let multipliers = Multipliers::new()
            .with(code("USD"), code("EUR"), 1.1)
            .with(code("CAD"), code("EUR"), 1.2);
        let (sync, _, _) = sync_with_default(Arc::clone(&store), multipliers);

        sync.derive_and_store(vec!["EUR", "USD", "CAD"]).await.unwrap();

        assert_eq!(store.all_rates().await.unwrap().len(), 6);
        assert_eq!(rate(&store, "EUR", "USD").await, 1.42);
        assert_eq!(rate(&store, "USD", "EUR").await, (1.0 / 1.42) * 1.1);
        assert_eq!(rate(&store, "EUR", "CAD").await, 1.12);
        assert_eq!(rate(&store, "CAD", "EUR").await, (1.0 / 1.12) * 1.2);
        assert!((rate(&store, "CAD", "USD").await - 1.42 / 1.12).abs() < 1e-7);
        assert!((rate(&store, "USD", "CAD").await - 1.12 / 1.42).abs() < 1e-7);
    }

    #[tokio::test]
    async fn test_repeated_sync_is_idempotent() {
        let store = Arc::new(MemoryRateStore::new());
        let (sync, source, _) = sync_with_default(Arc::clone(&store), Multipliers::new());

        sync.derive_and_store(vec!["EUR", "USD", "CAD"]).await.unwrap();
        let first: Vec<_> = store
            .all_rates()
            .await
            .unwrap()
            .into_iter()
            .map(|(f, t, s)| (f, t, s.rate))
            .collect();

        sync.derive_and_store(vec!["EUR", "USD", "CAD"]).await.unwrap();
        let second: Vec<_> = store
            .all_rates()
            .await
            .unwrap()
            .into_iter()
            .map(|(f, t, s)| (f, t, s.rate))
            .collect();

        assert_eq!(first, second);
        assert_eq!(source.refreshes.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_explicit_reference_moves_to_front() {
        let store = Arc::new(MemoryRateStore::new());
        let (sync, _, _) = sync_with_default(Arc::clone(&store), Multipliers::new());

        let report = sync
            .derive_and_store(RateRequest::new(["USD", "CAD"]).reference("eur"))
            .await
            .unwrap();

        assert_eq!(report.currencies, vec![code("EUR"), code("USD"), code("CAD")]);
        assert_eur_usd_cad(&store).await;
    }

    #[tokio::test]
    async fn test_unknown_currency_fails_before_refresh() {
        let store = Arc::new(MemoryRateStore::new());
        let (sync, source, built) = sync_with_default(Arc::clone(&store), Multipliers::new());

        let err = sync.derive_and_store(vec!["EUR", "ZZZ"]).await.unwrap_err();

        assert!(matches!(err, RateError::UnresolvedCurrency(_)));
        assert_eq!(built.load(Ordering::SeqCst), 0);
        assert_eq!(source.refreshes.load(Ordering::SeqCst), 0);
        assert!(store.all_rates().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_request_still_refreshes_once() {
        let store = Arc::new(MemoryRateStore::new());
        let (sync, source, built) = sync_with_default(Arc::clone(&store), Multipliers::new());

        let report = sync.derive_and_store(Vec::<&str>::new()).await.unwrap();

        assert_eq!(report.writes, 0);
        assert_eq!(report.reference, None);
        assert_eq!(built.load(Ordering::SeqCst), 1);
        assert_eq!(source.refreshes.load(Ordering::SeqCst), 1);
        assert!(store.all_rates().await.unwrap().is_empty());
    }

    #[test]
    fn test_request_debug_hides_source() {
        let request = RateRequest::new(["EUR"]).source(Arc::new(CountingSource::eur()));
        let printed = format!("{request:?}");
        assert!(printed.contains("RateRequest"));
        assert!(printed.contains("Some(\"custom\")"));
    }

    #[tokio::test]
    async fn test_unavailable_rate_propagates() {
        let store = Arc::new(MemoryRateStore::new());
        let (sync, _, _) = sync_with_default(Arc::clone(&store), Multipliers::new());

        let err = sync.derive_and_store(vec!["EUR", "USD", "JPY"]).await.unwrap_err();

        assert_eq!(
            err.to_string(),
            "No rate available for EUR/JPY: no fixed rate configured"
        );
    }

    struct EuroOnlyResolver;

    impl CurrencyResolver for EuroOnlyResolver {
        fn resolve(&self, code: &str) -> Option<crate::core::currency::Currency> {
            find_currency(code).filter(|c| c.code().as_str() == "EUR")
        }
    }

    #[tokio::test]
    async fn test_custom_resolver_rejects_unknown() {
        let store = Arc::new(MemoryRateStore::new());
        let (sync, _, _) = sync_with_default(Arc::clone(&store), Multipliers::new());
        let sync = sync.with_resolver(Arc::new(EuroOnlyResolver));

        let err = sync.derive_and_store(vec!["EUR", "USD"]).await.unwrap_err();

        assert_eq!(err.to_string(), "Unknown currency: USD");
    }
}
