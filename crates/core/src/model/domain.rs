use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;

use crate::model::activity::ActivityRecord;
use crate::model::track::{CertTrack, normalize_domain};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum DomainScoreError {
    #[error("domain id cannot be empty")]
    EmptyId,

    #[error("domain weight must be finite and non-negative, got {0}")]
    InvalidWeight(f64),
}

//
// ─── DOMAIN SCORE ──────────────────────────────────────────────────────────────
//

/// A syllabus domain together with its exam weight and the user's mastery.
///
/// `user_score` is a fraction in `[0, 1]`; out-of-range or non-finite input is
/// clamped on construction so the readiness engine never sees it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainScore {
    id: String,
    name: String,
    weight: f64,
    user_score: f64,
}

impl DomainScore {
    /// # Errors
    ///
    /// Returns `DomainScoreError` for an empty id or a negative/non-finite weight.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        weight: f64,
        user_score: f64,
    ) -> Result<Self, DomainScoreError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(DomainScoreError::EmptyId);
        }
        if !weight.is_finite() || weight < 0.0 {
            return Err(DomainScoreError::InvalidWeight(weight));
        }
        let user_score = if user_score.is_finite() {
            user_score.clamp(0.0, 1.0)
        } else {
            0.0
        };

        Ok(Self {
            id,
            name: name.into(),
            weight,
            user_score,
        })
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn weight(&self) -> f64 {
        self.weight
    }

    #[must_use]
    pub fn user_score(&self) -> f64 {
        self.user_score
    }
}

//
// ─── AGGREGATION ───────────────────────────────────────────────────────────────
//

/// Builds the per-domain score table for a track from raw activity telemetry.
///
/// Every blueprint domain appears exactly once, in blueprint order. Domains
/// without activity score 0 and still carry their weight. Activity tagged with
/// another track, or with a domain outside the blueprint, is ignored.
#[must_use]
pub fn aggregate_domain_scores(track: CertTrack, activities: &[ActivityRecord]) -> Vec<DomainScore> {
    let mut buckets: HashMap<&'static str, (u64, u64)> = HashMap::new();

    for activity in activities.iter().filter(|a| a.track == track) {
        let key = normalize_domain(&activity.domain);
        let Some(domain) = track.domain(&key) else {
            continue;
        };
        let entry = buckets.entry(domain.code).or_insert((0, 0));
        entry.0 += u64::from(activity.score);
        entry.1 += 1;
    }

    track
        .blueprint()
        .iter()
        .map(|d| {
            let avg_percent = match buckets.get(d.code) {
                #[allow(clippy::cast_precision_loss)]
                Some(&(sum, count)) if count > 0 => sum as f64 / count as f64,
                _ => 0.0,
            };
            DomainScore {
                id: d.code.to_string(),
                name: d.label.to_string(),
                weight: d.weight,
                user_score: (avg_percent / 100.0).clamp(0.0, 1.0),
            }
        })
        .collect()
}
