use chrono::{DateTime, Utc};
use std::fmt;
use vault_core::model::{CertTrack, Drill, DrillId};
use vault_core::quiz::{QuizMode, QuizSession, QuizVerdict};
use vault_core::remediation::CompletionReport;

use crate::error::DrillError;
use crate::remediation_service::EmissionOutcome;

/// What happened when a drill attempt reached its terminal state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrillCompletion {
    pub score: u8,
    pub verdict: QuizVerdict,
    pub emission: EmissionOutcome,
}

/// One live attempt at a drill: the quiz state plus the context needed to
/// report it.
///
/// Dropping the session (or calling `DrillService::abort`) discards it without
/// any persisted side effect.
pub struct DrillSession {
    drill_id: DrillId,
    title: String,
    domain: String,
    track: CertTrack,
    quiz: QuizSession,
    started_at: DateTime<Utc>,
    completion: Option<DrillCompletion>,
}

impl DrillSession {
    pub(crate) fn new(
        drill: &Drill,
        track: CertTrack,
        quiz: QuizSession,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            drill_id: drill.id.clone(),
            title: drill.title.clone(),
            domain: drill.domain.clone(),
            track,
            quiz,
            started_at,
            completion: None,
        }
    }

    /// # Errors
    ///
    /// Returns `DrillError::Quiz` if the drill has no questions.
    pub(crate) fn from_drill(
        drill: &Drill,
        track: CertTrack,
        mode: QuizMode,
        started_at: DateTime<Utc>,
    ) -> Result<Self, DrillError> {
        let quiz = QuizSession::new(drill.questions.clone(), mode)?;
        Ok(Self::new(drill, track, quiz, started_at))
    }

    #[must_use]
    pub fn drill_id(&self) -> &DrillId {
        &self.drill_id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn track(&self) -> CertTrack {
        self.track
    }

    #[must_use]
    pub fn quiz(&self) -> &QuizSession {
        &self.quiz
    }

    pub(crate) fn quiz_mut(&mut self) -> &mut QuizSession {
        &mut self.quiz
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub(crate) fn set_started_at(&mut self, at: DateTime<Utc>) {
        self.started_at = at;
    }

    /// Result of the last completed attempt, if any.
    #[must_use]
    pub fn completion(&self) -> Option<&DrillCompletion> {
        self.completion.as_ref()
    }

    pub(crate) fn set_completion(&mut self, completion: Option<DrillCompletion>) {
        self.completion = completion;
    }

    pub(crate) fn report(&self, score: u8) -> CompletionReport {
        CompletionReport {
            drill_id: self.drill_id.clone(),
            topic: self.title.clone(),
            domain: self.domain.clone(),
            track: self.track,
            score,
        }
    }

    pub(crate) fn domain(&self) -> &str {
        &self.domain
    }
}

impl fmt::Debug for DrillSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DrillSession")
            .field("drill_id", &self.drill_id)
            .field("track", &self.track)
            .field("phase", &self.quiz.phase())
            .field("started_at", &self.started_at)
            .field("completion", &self.completion)
            .finish_non_exhaustive()
    }
}
