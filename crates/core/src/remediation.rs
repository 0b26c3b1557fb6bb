//! Remediation policy: what a finished drill means for the task board.

use chrono::{DateTime, Utc};

use crate::model::{CertTrack, DrillId, NewTask, RemediationMetadata, TaskOrigin, TaskStatus};

/// Scores at or above this close open tasks; scores below it open one.
pub const MASTERY_THRESHOLD: u8 = 80;

/// Scores below this produce a critical-priority task.
pub const CRITICAL_THRESHOLD: u8 = 50;

pub const PRIORITY_CRITICAL: i32 = 10;
pub const PRIORITY_HIGH: i32 = 5;

/// A finished drill attempt, as handed to the emitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionReport {
    pub drill_id: DrillId,
    pub topic: String,
    pub domain: String,
    pub track: CertTrack,
    pub score: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RemediationDecision {
    /// Mastery: close every open task for the drill.
    CloseOpen(DrillId),
    /// Below mastery: create this task.
    Emit(NewTask),
}

#[must_use]
pub fn priority_for(score: u8) -> i32 {
    if score < CRITICAL_THRESHOLD {
        PRIORITY_CRITICAL
    } else {
        PRIORITY_HIGH
    }
}

#[must_use]
pub fn decide(report: &CompletionReport, generated_at: DateTime<Utc>) -> RemediationDecision {
    if report.score >= MASTERY_THRESHOLD {
        return RemediationDecision::CloseOpen(report.drill_id.clone());
    }

    let metadata = RemediationMetadata {
        last_attempt_score: report.score,
        generated_at,
    };

    RemediationDecision::Emit(NewTask {
        title: format!("REMEDIATE: {} [Score: {}%]", report.topic, report.score),
        status: TaskStatus::Todo,
        origin: TaskOrigin::QuizFailure,
        domain: report.domain.clone(),
        drill_id: Some(report.drill_id.clone()),
        priority: priority_for(report.score),
        score: Some(report.score),
        track: Some(report.track),
        metadata: metadata.to_value(),
    })
}
