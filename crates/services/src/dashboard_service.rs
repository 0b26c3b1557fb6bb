use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use storage::repository::ActivityRepository;
use vault_core::model::{ActivityRecord, CertTrack, aggregate_domain_scores};
use vault_core::readiness::{
    DomainIntegrity, OperatorLoad, Readiness, compute_readiness, domain_breakdown, operator_load,
};

use crate::Clock;
use crate::error::DashboardError;

/// Everything the readiness view shows for one track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackDashboard {
    pub track: CertTrack,
    pub readiness: Readiness,
    pub domains: Vec<DomainIntegrity>,
    pub operator_load: OperatorLoad,
    pub activity_count: usize,
    /// Served from the last good snapshot because the store read failed.
    pub stale: bool,
}

impl TrackDashboard {
    fn build(
        track: CertTrack,
        activities: &[ActivityRecord],
        session_started_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        let scores = aggregate_domain_scores(track, activities);
        Self {
            track,
            readiness: compute_readiness(&scores, session_started_at, now),
            domains: domain_breakdown(&scores),
            operator_load: operator_load(activities, now),
            activity_count: activities.len(),
            stale: false,
        }
    }
}

/// Computes readiness dashboards from stored telemetry.
pub struct DashboardService {
    clock: Clock,
    activities: Arc<dyn ActivityRepository>,
    last_known: Mutex<HashMap<CertTrack, TrackDashboard>>,
}

impl DashboardService {
    #[must_use]
    pub fn new(clock: Clock, activities: Arc<dyn ActivityRepository>) -> Self {
        Self {
            clock,
            activities,
            last_known: Mutex::new(HashMap::new()),
        }
    }

    /// Build a fresh dashboard for `track`.
    ///
    /// # Errors
    ///
    /// Returns `DashboardError::Storage` if activity cannot be loaded.
    pub async fn try_snapshot(
        &self,
        track: CertTrack,
        session_started_at: DateTime<Utc>,
    ) -> Result<TrackDashboard, DashboardError> {
        let activities = self.activities.activities_for_track(track).await?;
        let dashboard =
            TrackDashboard::build(track, &activities, session_started_at, self.clock.now());

        if let Ok(mut guard) = self.last_known.lock() {
            guard.insert(track, dashboard.clone());
        }
        Ok(dashboard)
    }

    /// Like [`Self::try_snapshot`], but never fails.
    ///
    /// A failed read falls back to the last good dashboard for the track,
    /// marked stale, or to an all-zero dashboard if there is none.
    pub async fn snapshot(
        &self,
        track: CertTrack,
        session_started_at: DateTime<Utc>,
    ) -> TrackDashboard {
        match self.try_snapshot(track, session_started_at).await {
            Ok(dashboard) => dashboard,
            Err(err) => {
                tracing::warn!(%track, error = %err, "activity read failed; serving last known dashboard");
                let cached = self
                    .last_known
                    .lock()
                    .ok()
                    .and_then(|guard| guard.get(&track).cloned());
                let mut dashboard = cached.unwrap_or_else(|| {
                    TrackDashboard::build(track, &[], session_started_at, self.clock.now())
                });
                dashboard.stale = true;
                dashboard
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use storage::repository::{InMemoryRepository, StorageError};
    use vault_core::model::{ActivityId, DrillId};
    use vault_core::readiness::{DomainBand, StabilityLabel};
    use vault_core::time::{fixed_clock, fixed_now};

    /// Delegates to an in-memory store until switched off.
    struct Flaky {
        inner: InMemoryRepository,
        down: AtomicBool,
    }

    #[async_trait]
    impl ActivityRepository for Flaky {
        async fn append_activity(
            &self,
            activity: &ActivityRecord,
        ) -> Result<ActivityId, StorageError> {
            self.inner.append_activity(activity).await
        }

        async fn activities_for_track(
            &self,
            track: CertTrack,
        ) -> Result<Vec<ActivityRecord>, StorageError> {
            if self.down.load(Ordering::SeqCst) {
                return Err(StorageError::Connection("offline".into()));
            }
            self.inner.activities_for_track(track).await
        }
    }

    fn record(domain: &str, score: u32) -> ActivityRecord {
        ActivityRecord::new(
            CertTrack::SecurityPlus,
            DrillId::new("d"),
            domain,
            score,
            600,
            fixed_now(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn snapshot_aggregates_activity() {
        let repo = InMemoryRepository::new();
        for d in ["D1", "D2", "D3", "D4", "D5"] {
            repo.append_activity(&record(d, 90)).await.unwrap();
        }
        let svc = DashboardService::new(fixed_clock(), Arc::new(repo));

        let dash = svc.try_snapshot(CertTrack::SecurityPlus, fixed_now()).await.unwrap();
        assert_eq!(dash.readiness.competency_score, 90);
        assert_eq!(dash.readiness.stability, StabilityLabel::CombatReady);
        assert_eq!(dash.activity_count, 5);
        assert_eq!(dash.operator_load.minutes, 50);
        assert!(dash.domains.iter().all(|d| d.band == DomainBand::Optimal));
        assert!(!dash.stale);
    }

    #[tokio::test]
    async fn failed_read_serves_last_known_as_stale() {
        let repo = Arc::new(Flaky {
            inner: InMemoryRepository::new(),
            down: AtomicBool::new(false),
        });
        repo.append_activity(&record("D4", 100)).await.unwrap();
        let svc = DashboardService::new(fixed_clock(), repo.clone());

        let fresh = svc.snapshot(CertTrack::SecurityPlus, fixed_now()).await;
        repo.down.store(true, Ordering::SeqCst);
        let fallback = svc.snapshot(CertTrack::SecurityPlus, fixed_now()).await;

        assert!(fallback.stale);
        assert_eq!(fallback.readiness, fresh.readiness);
        assert_eq!(fallback.activity_count, 1);
    }

    #[tokio::test]
    async fn failed_read_without_history_is_zeroed() {
        let repo = Arc::new(Flaky {
            inner: InMemoryRepository::new(),
            down: AtomicBool::new(true),
        });
        let svc = DashboardService::new(fixed_clock(), repo);

        let dash = svc.snapshot(CertTrack::Cissp, fixed_now()).await;
        assert!(dash.stale);
        assert_eq!(dash.readiness.competency_score, 0);
        assert_eq!(dash.domains.len(), CertTrack::Cissp.blueprint().len());
        assert!(dash.domains.iter().all(|d| d.band == DomainBand::Critical));
        assert!(svc.try_snapshot(CertTrack::Cissp, fixed_now()).await.is_err());
    }
}
