/// Per-dimension statistics aggregation.
///
/// Given a short code and a set of dimensions, fetches one breakdown per
/// dimension concurrently and merges them into a single map.
///
/// # Failure handling
///
/// - A dimension whose request fails gets an empty placeholder; the other
///   dimensions and the top-level error are unaffected.
/// - Only a cycle-level transport failure (every request failed before any
///   response was received) sets the top-level error. Previous data is kept.
///
/// # Cancellation
///
/// Each fetch cycle takes a generation number. When inputs change or a
/// refetch starts while a cycle is in flight, the older cycle's results are
/// discarded on completion instead of overwriting newer state.
use futures_util::future::join_all;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tokio::sync::watch;

use crate::error::ApiError;
use crate::models::statistics::{DimensionType, StatisticsResponse};

/// Dimension -> breakdown, keys only for requested dimensions.
pub type AggregatedStatistics = BTreeMap<DimensionType, StatisticsResponse>;

/// Anything that can fetch a single dimension's breakdown.
pub trait StatisticsSource {
    fn fetch_dimension(
        &self,
        short_code: &str,
        dimension: DimensionType,
    ) -> impl Future<Output = Result<StatisticsResponse, ApiError>> + Send;
}

/// One dimension or several; the order and duplicates do not matter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimensionSelection(Vec<DimensionType>);

impl DimensionSelection {
    fn normalized(mut dims: Vec<DimensionType>) -> Self {
        dims.sort();
        dims.dedup();
        Self(dims)
    }

    pub fn dimensions(&self) -> &[DimensionType] {
        &self.0
    }
}

impl From<DimensionType> for DimensionSelection {
    fn from(dimension: DimensionType) -> Self {
        Self(vec![dimension])
    }
}

impl From<Vec<DimensionType>> for DimensionSelection {
    fn from(dims: Vec<DimensionType>) -> Self {
        Self::normalized(dims)
    }
}

impl From<&[DimensionType]> for DimensionSelection {
    fn from(dims: &[DimensionType]) -> Self {
        Self::normalized(dims.to_vec())
    }
}

impl<const N: usize> From<[DimensionType; N]> for DimensionSelection {
    fn from(dims: [DimensionType; N]) -> Self {
        Self::normalized(dims.to_vec())
    }
}

/// Published state of the aggregator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatisticsState {
    pub data: AggregatedStatistics,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct StatisticsQuery {
    short_code: String,
    dimensions: DimensionSelection,
}

pub struct StatisticsAggregator<S> {
    source: S,
    query: Mutex<Option<StatisticsQuery>>,
    generation: AtomicU64,
    state: watch::Sender<StatisticsState>,
}

impl<S: StatisticsSource> StatisticsAggregator<S> {
    pub fn new(source: S) -> Self {
        let (state, _) = watch::channel(StatisticsState::default());
        Self {
            source,
            query: Mutex::new(None),
            generation: AtomicU64::new(0),
            state,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Receiver that observes every state change.
    pub fn subscribe(&self) -> watch::Receiver<StatisticsState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> StatisticsState {
        self.state.borrow().clone()
    }

    /// Set the inputs and fetch when they changed by value.
    ///
    /// Returns `true` when a fetch cycle ran. An empty short code never
    /// fetches and leaves the current state untouched.
    pub async fn set_inputs(
        &self,
        short_code: &str,
        dimensions: impl Into<DimensionSelection>,
    ) -> bool {
        let query = StatisticsQuery {
            short_code: short_code.trim().to_string(),
            dimensions: dimensions.into(),
        };

        {
            let mut current = self.query.lock().unwrap_or_else(|e| e.into_inner());
            if current.as_ref() == Some(&query) {
                tracing::debug!("Statistics inputs unchanged, skipping fetch");
                return false;
            }
            *current = Some(query.clone());
        }

        self.run_cycle(query).await
    }

    /// Re-issue the fetch for the current inputs.
    pub async fn refetch(&self) -> bool {
        let query = self
            .query
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        match query {
            Some(query) => self.run_cycle(query).await,
            None => false,
        }
    }

    async fn run_cycle(&self, query: StatisticsQuery) -> bool {
        if query.short_code.is_empty() {
            return false;
        }

        // Generation is only bumped and checked under the watch lock
        let mut generation = 0;
        self.state.send_modify(|s| {
            generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            s.loading = true;
            s.error = None;
        });

        tracing::debug!(
            "Fetching {} dimension(s) for {} (cycle {})",
            query.dimensions.dimensions().len(),
            query.short_code,
            generation
        );

        let short_code = query.short_code.as_str();
        let fetches = query.dimensions.dimensions().iter().map(|&dimension| async move {
            let result = self.source.fetch_dimension(short_code, dimension).await;
            (dimension, result)
        });
        let merged = merge_results(join_all(fetches).await);

        let published = self.state.send_if_modified(|s| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            match merged {
                Ok(data) => {
                    s.data = data;
                    s.error = None;
                }
                Err(message) => s.error = Some(message),
            }
            s.loading = false;
            true
        });
        if !published {
            tracing::debug!("Discarding stale statistics cycle {}", generation);
        }
        true
    }
}

/// Merge settled per-dimension results.
///
/// Commutative: the input order does not affect the output. Returns `Err`
/// with the transport message when every request failed without a response.
pub fn merge_results(
    results: Vec<(DimensionType, Result<StatisticsResponse, ApiError>)>,
) -> Result<AggregatedStatistics, String> {
    let all_transport = !results.is_empty()
        && results
            .iter()
            .all(|(_, r)| r.as_ref().is_err_and(ApiError::is_transport));

    if all_transport {
        let message = results
            .into_iter()
            .find_map(|(_, r)| r.err())
            .map(|e| e.to_string())
            .unwrap_or_default();
        return Err(message);
    }

    Ok(results
        .into_iter()
        .map(|(dimension, result)| {
            let response = result.unwrap_or_else(|e| {
                tracing::debug!("Dimension {} failed, using placeholder: {}", dimension, e);
                StatisticsResponse::empty(dimension)
            });
            (dimension, response)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::statistics::StatisticsDataPoint;
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use std::time::Duration;

    /// Scripted source: per-code delay, failing dimensions, call log.
    #[derive(Default)]
    struct FakeSource {
        delays: HashMap<String, Duration>,
        failing: HashSet<DimensionType>,
        offline: AtomicBool,
        calls: Mutex<Vec<(String, DimensionType)>>,
    }

    impl FakeSource {
        fn calls(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    fn response(code: &str, dimension: DimensionType) -> StatisticsResponse {
        StatisticsResponse {
            data: vec![StatisticsDataPoint {
                name: format!("{}-{}", code, dimension),
                clicks: 3,
                percentage: 100.0,
            }]
            .into(),
            total_clicks: 3,
            category: dimension.to_string(),
        }
    }

    impl StatisticsSource for FakeSource {
        async fn fetch_dimension(
            &self,
            short_code: &str,
            dimension: DimensionType,
        ) -> Result<StatisticsResponse, ApiError> {
            self.calls
                .lock()
                .unwrap()
                .push((short_code.to_string(), dimension));
            if let Some(delay) = self.delays.get(short_code) {
                tokio::time::sleep(*delay).await;
            }
            if self.offline.load(Ordering::SeqCst) {
                return Err(ApiError::Network {
                    detail: "dns error".to_string(),
                });
            }
            if self.failing.contains(&dimension) {
                return Err(ApiError::Server {
                    status: 500,
                    message: "boom".to_string(),
                });
            }
            Ok(response(short_code, dimension))
        }
    }

    #[tokio::test]
    async fn test_permutation_yields_same_map() {
        let a = StatisticsAggregator::new(FakeSource::default());
        a.set_inputs(
            "abc",
            vec![DimensionType::Browser, DimensionType::Country, DimensionType::Os],
        )
        .await;

        let b = StatisticsAggregator::new(FakeSource::default());
        b.set_inputs(
            "abc",
            vec![DimensionType::Os, DimensionType::Browser, DimensionType::Country],
        )
        .await;

        assert_eq!(a.snapshot().data, b.snapshot().data);
        assert_eq!(a.snapshot().data.len(), 3);
    }

    #[tokio::test]
    async fn test_single_failure_is_masked() {
        let source = FakeSource {
            failing: [DimensionType::Country].into_iter().collect(),
            ..Default::default()
        };
        let agg = StatisticsAggregator::new(source);
        agg.set_inputs(
            "abc",
            [DimensionType::Browser, DimensionType::Country, DimensionType::Referrer],
        )
        .await;

        let state = agg.snapshot();
        assert_eq!(state.data.len(), 3);
        assert!(state.error.is_none());
        assert!(!state.loading);
        assert_eq!(
            state.data[&DimensionType::Country],
            StatisticsResponse::empty(DimensionType::Country)
        );
        assert_eq!(state.data[&DimensionType::Browser].total_clicks, 3);
    }

    #[tokio::test]
    async fn test_transport_failure_keeps_previous_data() {
        let agg = StatisticsAggregator::new(FakeSource::default());
        agg.set_inputs("abc", DimensionType::Browser).await;
        let before = agg.snapshot().data;
        assert_eq!(before.len(), 1);

        agg.source().offline.store(true, Ordering::SeqCst);
        agg.set_inputs("abc", DimensionType::Country).await;

        let state = agg.snapshot();
        assert_eq!(state.error.as_deref(), Some(crate::error::NETWORK_MESSAGE));
        assert_eq!(state.data, before);
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn test_empty_short_code_does_not_fetch() {
        let agg = StatisticsAggregator::new(FakeSource::default());
        agg.set_inputs("abc", DimensionType::Browser).await;
        let before = agg.snapshot();

        assert!(!agg.set_inputs("", DimensionType::Country).await);
        assert!(!agg.refetch().await);
        assert_eq!(agg.source().calls(), 1);
        assert_eq!(agg.snapshot(), before);
    }

    #[tokio::test]
    async fn test_unchanged_inputs_do_not_refetch() {
        let agg = StatisticsAggregator::new(FakeSource::default());
        assert!(
            agg.set_inputs("abc", vec![DimensionType::Browser, DimensionType::Os])
                .await
        );
        // Same contents, new vector, different order
        assert!(
            !agg.set_inputs("abc", vec![DimensionType::Os, DimensionType::Browser])
                .await
        );
        assert_eq!(agg.source().calls(), 2);

        // Refetch re-issues the same calls and keeps the shape
        assert!(agg.refetch().await);
        assert_eq!(agg.source().calls(), 4);
        assert_eq!(agg.snapshot().data.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_cycle_is_discarded() {
        let source = FakeSource {
            delays: [("slow".to_string(), Duration::from_millis(300))]
                .into_iter()
                .collect(),
            ..Default::default()
        };
        let agg = Arc::new(StatisticsAggregator::new(source));

        let slow = {
            let agg = agg.clone();
            tokio::spawn(async move { agg.set_inputs("slow", DimensionType::Browser).await })
        };
        // Let the slow cycle start before the newer one
        tokio::time::sleep(Duration::from_millis(10)).await;
        agg.set_inputs("fast", DimensionType::Browser).await;
        slow.await.unwrap();

        let state = agg.snapshot();
        assert_eq!(
            state.data[&DimensionType::Browser].points()[0].name,
            "fast-BROWSER"
        );
        assert!(!state.loading);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_cycle_leaves_newer_cycle_loading() {
        let source = FakeSource {
            delays: [
                ("old".to_string(), Duration::from_millis(100)),
                ("new".to_string(), Duration::from_millis(500)),
            ]
            .into_iter()
            .collect(),
            ..Default::default()
        };
        let agg = Arc::new(StatisticsAggregator::new(source));
        let mut rx = agg.subscribe();

        let old = {
            let agg = agg.clone();
            tokio::spawn(async move { agg.set_inputs("old", DimensionType::Os).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        let new = {
            let agg = agg.clone();
            tokio::spawn(async move { agg.set_inputs("new", DimensionType::Os).await })
        };

        // The older cycle settles first and must not touch the state
        old.await.unwrap();
        let _ = rx.borrow_and_update();
        let state = agg.snapshot();
        assert!(state.loading);
        assert!(state.data.is_empty());

        new.await.unwrap();
        assert!(rx.has_changed().unwrap());
        let state = agg.snapshot();
        assert!(!state.loading);
        assert_eq!(state.data[&DimensionType::Os].points()[0].name, "new-OS");
    }

    #[tokio::test]
    async fn test_subscribers_see_final_state() {
        let agg = StatisticsAggregator::new(FakeSource::default());
        let mut rx = agg.subscribe();
        agg.set_inputs("abc", DimensionType::Language).await;

        assert!(rx.has_changed().unwrap());
        let state = rx.borrow_and_update().clone();
        assert!(!state.loading);
        assert!(state.data.contains_key(&DimensionType::Language));
    }

    #[test]
    fn test_merge_is_order_independent() {
        let ok = |d| (d, Ok(response("x", d)));
        let failed = |d| {
            (
                d,
                Err(ApiError::NotFound {
                    message: "gone".to_string(),
                }),
            )
        };

        let forward = merge_results(vec![
            ok(DimensionType::Browser),
            failed(DimensionType::City),
            ok(DimensionType::Os),
        ])
        .unwrap();
        let backward = merge_results(vec![
            ok(DimensionType::Os),
            failed(DimensionType::City),
            ok(DimensionType::Browser),
        ])
        .unwrap();
        assert_eq!(forward, backward);
        assert_eq!(
            forward[&DimensionType::City],
            StatisticsResponse::empty(DimensionType::City)
        );
    }

    #[test]
    fn test_merge_partial_transport_failure_is_masked() {
        let merged = merge_results(vec![
            (DimensionType::Browser, Ok(response("x", DimensionType::Browser))),
            (
                DimensionType::Os,
                Err(ApiError::Network {
                    detail: "reset".to_string(),
                }),
            ),
        ])
        .unwrap();
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[&DimensionType::Os].total_clicks, 0);
    }

    #[test]
    fn test_selection_normalizes() {
        let sel: DimensionSelection = vec![
            DimensionType::Os,
            DimensionType::Browser,
            DimensionType::Os,
        ]
        .into();
        assert_eq!(
            sel.dimensions(),
            &[DimensionType::Browser, DimensionType::Os]
        );
    }
}
