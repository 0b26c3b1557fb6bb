use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{ActivityId, DrillId};
use crate::model::track::CertTrack;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ActivityError {
    #[error("activity score must be within 0..=100, got {0}")]
    ScoreOutOfRange(u32),

    #[error("activity domain cannot be empty")]
    EmptyDomain,
}

/// Telemetry for one completed drill attempt. Readiness is computed from these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub id: Option<ActivityId>,
    pub track: CertTrack,
    pub drill_id: DrillId,
    pub domain: String,
    pub score: u8,
    pub duration_secs: u32,
    pub recorded_at: DateTime<Utc>,
}

impl ActivityRecord {
    /// Builds a not-yet-persisted activity record.
    ///
    /// # Errors
    ///
    /// Returns `ActivityError` if the score exceeds 100 or the domain is blank.
    pub fn new(
        track: CertTrack,
        drill_id: DrillId,
        domain: impl Into<String>,
        score: u32,
        duration_secs: u32,
        recorded_at: DateTime<Utc>,
    ) -> Result<Self, ActivityError> {
        let domain = domain.into();
        if domain.trim().is_empty() {
            return Err(ActivityError::EmptyDomain);
        }
        let score = u8::try_from(score)
            .ok()
            .filter(|s| *s <= 100)
            .ok_or(ActivityError::ScoreOutOfRange(score))?;

        Ok(Self {
            id: None,
            track,
            drill_id,
            domain,
            score,
            duration_secs,
            recorded_at,
        })
    }

    #[must_use]
    pub fn with_id(mut self, id: ActivityId) -> Self {
        self.id = Some(id);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn rejects_out_of_range_score() {
        let err = ActivityRecord::new(
            CertTrack::Cissp,
            DrillId::new("d"),
            "IAM",
            101,
            60,
            fixed_now(),
        )
        .unwrap_err();
        assert_eq!(err, ActivityError::ScoreOutOfRange(101));
    }

    #[test]
    fn rejects_blank_domain() {
        let err =
            ActivityRecord::new(CertTrack::Cissp, DrillId::new("d"), " ", 50, 60, fixed_now())
                .unwrap_err();
        assert_eq!(err, ActivityError::EmptyDomain);
    }
}
