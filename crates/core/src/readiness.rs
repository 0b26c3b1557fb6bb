//! Weighted readiness scoring.
//!
//! Turns a track's per-domain mastery table into the headline numbers shown on a
//! dashboard: an overall competency percentage, a session fatigue level and a
//! coarse stability label. Everything here is a pure function of its inputs.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::{ActivityRecord, DomainScore};

/// Fatigue rises by one point per this many minutes of session time.
pub const MINUTES_PER_FATIGUE_POINT: i64 = 10;

/// Upper bound of `fatigue_level`.
pub const MAX_FATIGUE: u8 = 100;

/// Below this fatigue level the operator is reported as nominal.
pub const STRESS_THRESHOLD: u8 = 5;

/// Trailing window used for operator load.
pub const OPERATOR_LOAD_WINDOW_HOURS: i64 = 24;

/// Operator load above this many minutes is an overload.
pub const OPERATOR_OVERLOAD_MINUTES: u32 = 120;

//
// ─── STABILITY ─────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StabilityLabel {
    CombatReady,
    Optimal,
    Stabilizing,
    Degraded,
}

impl StabilityLabel {
    /// Bands are strict: exactly 85, 70 and 45 fall into the next-lower band.
    #[must_use]
    pub fn for_score(competency_score: u8) -> Self {
        match competency_score {
            s if s > 85 => StabilityLabel::CombatReady,
            s if s > 70 => StabilityLabel::Optimal,
            s if s > 45 => StabilityLabel::Stabilizing,
            _ => StabilityLabel::Degraded,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            StabilityLabel::CombatReady => "COMBAT_READY",
            StabilityLabel::Optimal => "OPTIMAL",
            StabilityLabel::Stabilizing => "STABILIZING",
            StabilityLabel::Degraded => "DEGRADED",
        }
    }
}

impl fmt::Display for StabilityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── READINESS ─────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Readiness {
    pub competency_score: u8,
    pub fatigue_level: u8,
    pub stability: StabilityLabel,
    pub fatigue_display: String,
}

/// Computes the readiness metrics for one track.
///
/// A zero total weight yields a competency score of 0 rather than NaN. Missing
/// scores are expected to already be 0 in `domains` (see
/// [`crate::model::aggregate_domain_scores`]). A `now` earlier than
/// `session_started_at` counts as zero elapsed time.
#[must_use]
pub fn compute_readiness(
    domains: &[DomainScore],
    session_started_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Readiness {
    let competency_score = competency_score(domains);
    let fatigue_level = fatigue_level(now.signed_duration_since(session_started_at));

    Readiness {
        competency_score,
        fatigue_level,
        stability: StabilityLabel::for_score(competency_score),
        fatigue_display: fatigue_display(fatigue_level),
    }
}

/// Weighted mean of `user_score` as a rounded percentage in `0..=100`.
#[must_use]
pub fn competency_score(domains: &[DomainScore]) -> u8 {
    let total_weight: f64 = domains.iter().map(DomainScore::weight).sum();
    if total_weight <= 0.0 || !total_weight.is_finite() {
        return 0;
    }
    let weighted: f64 = domains.iter().map(|d| d.user_score() * d.weight()).sum();
    let percent = ((weighted / total_weight) * 100.0).round();

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let score = percent.clamp(0.0, 100.0) as u8;
    score
}

/// One point per ten whole minutes of session time, capped at 100.
#[must_use]
pub fn fatigue_level(elapsed: Duration) -> u8 {
    let minutes = elapsed.num_milliseconds().div_euclid(60_000).max(0);
    let points = (minutes / MINUTES_PER_FATIGUE_POINT).min(i64::from(MAX_FATIGUE));
    u8::try_from(points).unwrap_or(MAX_FATIGUE)
}

#[must_use]
pub fn fatigue_display(fatigue_level: u8) -> String {
    if fatigue_level < STRESS_THRESHOLD {
        format!("NOMINAL ({fatigue_level}%)")
    } else {
        format!("STRESS_DETECTED ({fatigue_level}%)")
    }
}

//
// ─── DOMAIN BREAKDOWN ──────────────────────────────────────────────────────────
//

/// Health band of a single domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DomainBand {
    Optimal,
    Degraded,
    Critical,
}

impl DomainBand {
    #[must_use]
    pub fn for_percent(percent: u8) -> Self {
        match percent {
            p if p >= 80 => DomainBand::Optimal,
            p if p >= 60 => DomainBand::Degraded,
            _ => DomainBand::Critical,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DomainBand::Optimal => "OPTIMAL",
            DomainBand::Degraded => "DEGRADED",
            DomainBand::Critical => "CRITICAL",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainIntegrity {
    pub id: String,
    pub label: String,
    pub percent: u8,
    pub weight_percent: u8,
    pub band: DomainBand,
}

#[must_use]
pub fn domain_breakdown(domains: &[DomainScore]) -> Vec<DomainIntegrity> {
    domains
        .iter()
        .map(|d| {
            let percent = to_percent(d.user_score());
            DomainIntegrity {
                id: d.id().to_string(),
                label: d.name().to_string(),
                percent,
                weight_percent: to_percent(d.weight()),
                band: DomainBand::for_percent(percent),
            }
        })
        .collect()
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_percent(fraction: f64) -> u8 {
    (fraction * 100.0).round().clamp(0.0, 100.0) as u8
}

//
// ─── OPERATOR LOAD ─────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorLoad {
    pub minutes: u32,
    pub overloaded: bool,
}

/// Study time recorded in the trailing 24 hours.
#[must_use]
pub fn operator_load(activities: &[ActivityRecord], now: DateTime<Utc>) -> OperatorLoad {
    let cutoff = now - Duration::hours(OPERATOR_LOAD_WINDOW_HOURS);
    let seconds: u64 = activities
        .iter()
        .filter(|a| a.recorded_at > cutoff)
        .map(|a| u64::from(a.duration_secs))
        .sum();
    let minutes = u32::try_from((seconds + 30) / 60).unwrap_or(u32::MAX);

    OperatorLoad {
        minutes,
        overloaded: minutes > OPERATOR_OVERLOAD_MINUTES,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CertTrack, DrillId};
    use crate::time::fixed_now;

    fn d(weight: f64, score: f64) -> DomainScore {
        DomainScore::new("X", "X", weight, score).unwrap()
    }

    #[test]
    fn equal_weights_average() {
        let r = compute_readiness(&[d(1.0, 0.8), d(1.0, 0.6)], fixed_now(), fixed_now());
        assert_eq!(r.competency_score, 70);
        assert_eq!(r.stability, StabilityLabel::Stabilizing);
    }

    #[test]
    fn uneven_weights_round_to_nearest() {
        let domains = [d(0.26, 0.8), d(0.29, 0.7), d(0.25, 0.6), d(0.20, 0.9)];
        assert_eq!(competency_score(&domains), 74);
    }

    #[test]
    fn rescaling_weights_does_not_change_score() {
        let base = [d(0.26, 0.8), d(0.29, 0.7), d(0.25, 0.6), d(0.20, 0.9)];
        let scaled: Vec<_> = base
            .iter()
            .map(|x| d(x.weight() * 37.5, x.user_score()))
            .collect();
        assert_eq!(competency_score(&base), competency_score(&scaled));
    }

    #[test]
    fn zero_total_weight_falls_back_to_zero() {
        assert_eq!(competency_score(&[]), 0);
        assert_eq!(competency_score(&[d(0.0, 1.0), d(0.0, 0.5)]), 0);
    }

    #[test]
    fn missing_score_still_counts_in_denominator() {
        assert_eq!(competency_score(&[d(1.0, 1.0), d(1.0, 0.0)]), 50);
    }

    #[test]
    fn stability_boundaries_are_strict() {
        assert_eq!(StabilityLabel::for_score(86), StabilityLabel::CombatReady);
        assert_eq!(StabilityLabel::for_score(85), StabilityLabel::Optimal);
        assert_eq!(StabilityLabel::for_score(70), StabilityLabel::Stabilizing);
        assert_eq!(StabilityLabel::for_score(45), StabilityLabel::Degraded);
        assert_eq!(StabilityLabel::for_score(0), StabilityLabel::Degraded);
    }

    #[test]
    fn fatigue_after_twenty_five_minutes() {
        let now = fixed_now();
        let r = compute_readiness(&[], now - Duration::minutes(25), now);
        assert_eq!(r.fatigue_level, 2);
        assert_eq!(r.fatigue_display, "NOMINAL (2%)");
    }

    #[test]
    fn fatigue_is_monotonic_and_saturates() {
        let mut last = 0;
        for minutes in (0..2_000).step_by(7) {
            let level = fatigue_level(Duration::minutes(minutes));
            assert!(level >= last);
            last = level;
        }
        assert_eq!(fatigue_level(Duration::days(30)), 100);
        assert_eq!(fatigue_display(5), "STRESS_DETECTED (5%)");
    }

    #[test]
    fn negative_elapsed_time_is_zero_fatigue() {
        assert_eq!(fatigue_level(Duration::minutes(-90)), 0);
    }

    #[test]
    fn breakdown_bands() {
        let rows = domain_breakdown(&[d(0.15, 0.8), d(0.10, 0.6), d(0.13, 0.59)]);
        assert_eq!(rows[0].band, DomainBand::Optimal);
        assert_eq!(rows[0].weight_percent, 15);
        assert_eq!(rows[1].band, DomainBand::Degraded);
        assert_eq!(rows[2].band, DomainBand::Critical);
    }

    #[test]
    fn operator_load_only_counts_last_day() {
        let now = fixed_now();
        let recent = ActivityRecord::new(
            CertTrack::Cissp,
            DrillId::new("a"),
            "IAM",
            70,
            90 * 60,
            now - Duration::hours(2),
        )
        .unwrap();
        let old = ActivityRecord::new(
            CertTrack::Cissp,
            DrillId::new("b"),
            "IAM",
            70,
            60 * 60,
            now - Duration::hours(30),
        )
        .unwrap();
        let load = operator_load(&[recent.clone(), old], now);
        assert_eq!(load.minutes, 90);
        assert!(!load.overloaded);

        let mut heavy = recent;
        heavy.duration_secs = 121 * 60;
        assert!(operator_load(&[heavy], now).overloaded);
    }
}
