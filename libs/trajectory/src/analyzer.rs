use std::sync::Arc;
use std::time::Duration;

use tracker_api::{ActorId, Coordinates, PositionRecord, PositionSource, TrackerError};

use crate::detector::StallDetector;
use crate::distance::{DistanceEstimator, Haversine};

// ═══════════════════════════════════════════════════════════════
//  Classification
// ═══════════════════════════════════════════════════════════════

/// Verdict for one actor over one window.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub actor: ActorId,
    pub stalled: bool,
    /// Path distance in km. `None` when fewer than two positions were visible.
    pub distance: Option<f64>,
    pub samples: usize,
}

// ═══════════════════════════════════════════════════════════════
//  TrajectoryAnalyzer
// ═══════════════════════════════════════════════════════════════

/// Fetch window → path distance → stall verdict.
///
/// Stateless per call. The source is an injected shared handle; whether it
/// is a colocated store or a sibling service does not change the result.
pub struct TrajectoryAnalyzer {
    source: Arc<dyn PositionSource>,
    estimator: Arc<dyn DistanceEstimator>,
    detector: StallDetector,
    fetch_timeout: Option<Duration>,
}

impl TrajectoryAnalyzer {
    pub fn new(source: Arc<dyn PositionSource>, detector: StallDetector) -> Self {
        Self {
            source,
            estimator: Arc::new(Haversine),
            detector,
            fetch_timeout: None,
        }
    }

    pub fn with_estimator(mut self, estimator: Arc<dyn DistanceEstimator>) -> Self {
        self.estimator = estimator;
        self
    }

    /// Deadline applied to every fetch. Elapsing fails the call as unavailable.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }

    pub fn detector(&self) -> StallDetector {
        self.detector
    }

    pub fn source(&self) -> &Arc<dyn PositionSource> {
        &self.source
    }

    /// Windowed, oldest-first positions for `actor`, all-or-nothing.
    pub async fn fetch(
        &self,
        actor: &ActorId,
        window_minutes: u32,
    ) -> Result<Vec<PositionRecord>, TrackerError> {
        let fetch = self.source.fetch(actor, window_minutes);
        match self.fetch_timeout {
            Some(limit) => tokio::time::timeout(limit, fetch).await.map_err(|_| {
                TrackerError::unavailable(format!("fetch timed out after {}ms", limit.as_millis()))
            })?,
            None => fetch.await,
        }
    }

    /// Classify `actor` over the trailing `window_minutes`.
    ///
    /// Fewer than two positions is not an error: the verdict defaults to
    /// not stalled. Fetch failures propagate unchanged.
    pub async fn classify(
        &self,
        actor: &ActorId,
        window_minutes: u32,
    ) -> Result<Classification, TrackerError> {
        let records = self.fetch(actor, window_minutes).await?;
        let samples = records.len();

        if samples < 2 {
            tracing::info!(
                actor = %actor,
                samples,
                window_minutes,
                "not enough positions to classify, defaulting to active"
            );
            return Ok(Classification {
                actor: actor.clone(),
                stalled: false,
                distance: None,
                samples,
            });
        }

        let points: Vec<Coordinates> = records.iter().map(PositionRecord::coordinates).collect();
        let distance = self.estimator.path_distance(&points);
        let stalled = self.detector.is_stalled(distance);

        tracing::info!(
            actor = %actor,
            samples,
            window_minutes,
            distance_km = distance,
            minimum_km = self.detector.minimum_distance,
            stalled,
            "classified actor"
        );

        Ok(Classification {
            actor: actor.clone(),
            stalled,
            distance: Some(distance),
            samples,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex;

    use chrono::{DateTime, Duration as ChronoDuration, Utc};
    use tracker_api::ErrorKind;

    use super::*;

    /// Canned source: returns `records` as-is, or `error`, or never resolves.
    #[derive(Default)]
    struct StubSource {
        records: Vec<PositionRecord>,
        error: Option<TrackerError>,
        hang: bool,
        calls: Mutex<Vec<(ActorId, u32)>>,
    }

    impl PositionSource for StubSource {
        fn fetch(
            &self,
            actor: &ActorId,
            window_minutes: u32,
        ) -> Pin<Box<dyn Future<Output = Result<Vec<PositionRecord>, TrackerError>> + Send + '_>> {
            self.calls.lock().unwrap().push((actor.clone(), window_minutes));
            Box::pin(async move {
                if self.hang {
                    std::future::pending::<()>().await;
                }
                match &self.error {
                    Some(e) => Err(e.clone()),
                    None => Ok(self.records.clone()),
                }
            })
        }

        fn ping(&self) -> Pin<Box<dyn Future<Output = Result<(), TrackerError>> + Send + '_>> {
            Box::pin(async { Ok(()) })
        }
    }

    fn track(actor: &ActorId, points: &[(f64, f64)]) -> Vec<PositionRecord> {
        let start: DateTime<Utc> = Utc::now() - ChronoDuration::minutes(4);
        points
            .iter()
            .enumerate()
            .map(|(i, &(lat, lon))| {
                PositionRecord::new(
                    actor.clone(),
                    Coordinates::new(lat, lon),
                    start + ChronoDuration::seconds(10 * i as i64),
                )
            })
            .collect()
    }

    fn analyzer(source: StubSource, minimum: f64) -> TrajectoryAnalyzer {
        TrajectoryAnalyzer::new(Arc::new(source), StallDetector::new(minimum))
    }

    #[tokio::test]
    async fn immobile_actor_is_stalled() {
        let actor = ActorId::from(1);
        let records = track(&actor, &[(48.8566, 2.3522); 3]);
        let analyzer = analyzer(StubSource { records, ..Default::default() }, 500.0);

        let verdict = analyzer.classify(&actor, 5).await.unwrap();
        assert!(verdict.stalled);
        assert_eq!(verdict.distance, Some(0.0));
        assert_eq!(verdict.samples, 3);
    }

    #[tokio::test]
    async fn long_trip_is_active() {
        let actor = ActorId::from(2);
        let records = track(&actor, &[(48.8566, 2.3522), (51.5074, 0.1278)]);
        let analyzer = analyzer(StubSource { records, ..Default::default() }, 100.0);

        let verdict = analyzer.classify(&actor, 5).await.unwrap();
        assert!(!verdict.stalled);
        assert_eq!(verdict.distance, Some(334.576));
    }

    #[tokio::test]
    async fn short_history_defaults_to_active() {
        let actor = ActorId::from(3);
        for points in [vec![], vec![(1.0, 1.0)]] {
            let records = track(&actor, &points);
            let analyzer = analyzer(StubSource { records, ..Default::default() }, 500.0);

            let verdict = analyzer.classify(&actor, 5).await.unwrap();
            assert!(!verdict.stalled);
            assert_eq!(verdict.distance, None);
            assert_eq!(verdict.samples, points.len());
        }
    }

    #[tokio::test]
    async fn forwards_actor_and_window() {
        let actor = ActorId::from(4);
        let source = Arc::new(StubSource::default());
        let analyzer = TrajectoryAnalyzer::new(source.clone(), StallDetector::new(1.0));

        analyzer.classify(&actor, 15).await.unwrap();
        assert_eq!(source.calls.lock().unwrap().as_slice(), &[(actor, 15)]);
    }

    #[tokio::test]
    async fn store_failure_propagates_unchanged() {
        let source = StubSource {
            error: Some(TrackerError::unavailable("redis down")),
            ..Default::default()
        };
        let err = analyzer(source, 500.0).classify(&ActorId::from(5), 5).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unavailable);
        assert_eq!(err.message(), "redis down");
    }

    #[tokio::test(start_paused = true)]
    async fn slow_fetch_times_out_as_unavailable() {
        let source = StubSource { hang: true, ..Default::default() };
        let analyzer = analyzer(source, 500.0).with_fetch_timeout(Duration::from_secs(2));

        let err = analyzer.classify(&ActorId::from(6), 5).await.unwrap_err();
        assert!(err.is_unavailable());
    }
}
