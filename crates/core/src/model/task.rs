use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::{DrillId, TaskId};
use crate::model::track::CertTrack;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TaskError {
    #[error("task title cannot be empty")]
    EmptyTitle,

    #[error("invalid task status: {0}")]
    InvalidStatus(String),

    #[error("invalid task origin: {0}")]
    InvalidOrigin(String),
}

//
// ─── STATUS / ORIGIN ───────────────────────────────────────────────────────────
//

/// Kanban lane a task sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Blocked,
    Completed,
}

impl TaskStatus {
    /// Lane order on the board.
    pub const LANES: [TaskStatus; 4] = [
        TaskStatus::Todo,
        TaskStatus::InProgress,
        TaskStatus::Blocked,
        TaskStatus::Completed,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Todo => "TODO",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Blocked => "BLOCKED",
            TaskStatus::Completed => "COMPLETED",
        }
    }

    #[must_use]
    pub fn lane_label(self) -> &'static str {
        match self {
            TaskStatus::Todo => "TODO",
            TaskStatus::InProgress => "In-progress",
            TaskStatus::Blocked => "Blocked",
            TaskStatus::Completed => "Complete",
        }
    }

    #[must_use]
    pub fn is_open(self) -> bool {
        self != TaskStatus::Completed
    }
}

impl FromStr for TaskStatus {
    type Err = TaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "TODO" => Ok(TaskStatus::Todo),
            "IN_PROGRESS" => Ok(TaskStatus::InProgress),
            "BLOCKED" => Ok(TaskStatus::Blocked),
            "COMPLETED" | "COMPLETE" | "DONE" => Ok(TaskStatus::Completed),
            _ => Err(TaskError::InvalidStatus(s.to_string())),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What produced a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskOrigin {
    QuizFailure,
    TerminalDiagnostic,
    Manual,
    DecayRecovery,
}

impl TaskOrigin {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TaskOrigin::QuizFailure => "QUIZ_FAILURE",
            TaskOrigin::TerminalDiagnostic => "TERMINAL_DIAGNOSTIC",
            TaskOrigin::Manual => "MANUAL",
            TaskOrigin::DecayRecovery => "DECAY_RECOVERY",
        }
    }
}

impl FromStr for TaskOrigin {
    type Err = TaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "QUIZ_FAILURE" => Ok(TaskOrigin::QuizFailure),
            "TERMINAL_DIAGNOSTIC" => Ok(TaskOrigin::TerminalDiagnostic),
            "MANUAL" => Ok(TaskOrigin::Manual),
            "DECAY_RECOVERY" => Ok(TaskOrigin::DecayRecovery),
            _ => Err(TaskError::InvalidOrigin(s.to_string())),
        }
    }
}

//
// ─── METADATA ──────────────────────────────────────────────────────────────────
//

/// Structured part of the otherwise opaque task metadata blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemediationMetadata {
    pub last_attempt_score: u8,
    pub generated_at: DateTime<Utc>,
}

impl RemediationMetadata {
    #[must_use]
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "lastAttemptScore": self.last_attempt_score,
            "generatedAt": self.generated_at.to_rfc3339(),
        })
    }
}

//
// ─── TASK ──────────────────────────────────────────────────────────────────────
//

/// Fields of a task that does not exist in the store yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub status: TaskStatus,
    pub origin: TaskOrigin,
    pub domain: String,
    pub drill_id: Option<DrillId>,
    pub priority: i32,
    pub score: Option<u8>,
    pub track: Option<CertTrack>,
    pub metadata: serde_json::Value,
}

impl NewTask {
    /// A user-entered board card.
    ///
    /// # Errors
    ///
    /// Returns `TaskError::EmptyTitle` for a blank title.
    pub fn manual(title: impl Into<String>) -> Result<Self, TaskError> {
        let title = title.into().trim().to_string();
        if title.is_empty() {
            return Err(TaskError::EmptyTitle);
        }
        Ok(Self {
            title,
            status: TaskStatus::Todo,
            origin: TaskOrigin::Manual,
            domain: String::new(),
            drill_id: None,
            priority: 0,
            score: None,
            track: None,
            metadata: serde_json::Value::Null,
        })
    }

    /// Assigns an id, producing the persisted shape.
    #[must_use]
    pub fn into_task(self, id: TaskId) -> RemediationTask {
        RemediationTask {
            id,
            title: self.title,
            status: self.status,
            origin: self.origin,
            domain: self.domain,
            drill_id: self.drill_id,
            priority: self.priority,
            score: self.score,
            track: self.track,
            metadata: self.metadata,
        }
    }
}

/// Persisted task record, in the shape board consumers expect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemediationTask {
    pub id: TaskId,
    pub title: String,
    pub status: TaskStatus,
    pub origin: TaskOrigin,
    pub domain: String,
    pub drill_id: Option<DrillId>,
    pub priority: i32,
    pub score: Option<u8>,
    #[serde(rename = "certID")]
    pub track: Option<CertTrack>,
    pub metadata: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parsing_accepts_lane_labels() {
        assert_eq!("in-progress".parse::<TaskStatus>().unwrap(), TaskStatus::InProgress);
        assert_eq!("Complete".parse::<TaskStatus>().unwrap(), TaskStatus::Completed);
        assert!("archived".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn origin_round_trips_through_str() {
        for origin in [
            TaskOrigin::QuizFailure,
            TaskOrigin::TerminalDiagnostic,
            TaskOrigin::Manual,
            TaskOrigin::DecayRecovery,
        ] {
            assert_eq!(origin.as_str().parse::<TaskOrigin>().unwrap(), origin);
        }
    }

    #[test]
    fn manual_task_requires_title() {
        assert_eq!(NewTask::manual("   ").unwrap_err(), TaskError::EmptyTitle);
        let task = NewTask::manual(" read NIST 800-53 ").unwrap();
        assert_eq!(task.title, "read NIST 800-53");
        assert_eq!(task.origin, TaskOrigin::Manual);
        assert_eq!(task.status, TaskStatus::Todo);
    }

    #[test]
    fn persisted_shape_uses_board_field_names() {
        let mut task = NewTask::manual("x").unwrap();
        task.track = Some(CertTrack::SecurityPlus);
        let task = task.into_task(TaskId::generate());
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["status"], "TODO");
        assert_eq!(json["origin"], "MANUAL");
        assert_eq!(json["certID"], CertTrack::SecurityPlus.cert_id());
        assert!(json.get("drillId").is_some());
    }
}
