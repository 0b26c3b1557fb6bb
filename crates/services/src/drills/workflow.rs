use std::sync::Arc;
use std::time::Duration;

use rand::seq::SliceRandom;
use storage::repository::ActivityRepository;
use vault_core::model::{ActivityRecord, CertTrack, Drill};
use vault_core::quiz::{AUTO_ADVANCE_DELAY, QuizMode, QuizPhase, QuizSession, SelectOutcome};

use super::session::{DrillCompletion, DrillSession};
use crate::Clock;
use crate::error::DrillError;
use crate::remediation_service::RemediationEmitter;

/// Result of one user action on a drill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerResult {
    pub outcome: SelectOutcome,
    pub phase: QuizPhase,
    /// Set only on the action that completed the attempt.
    pub completion: Option<DrillCompletion>,
}

/// Orchestrates drill attempts: diagnostic auto-advance, activity telemetry and
/// remediation emission on completion.
#[derive(Clone)]
pub struct DrillService {
    clock: Clock,
    emitter: Arc<RemediationEmitter>,
    activities: Arc<dyn ActivityRepository>,
    auto_advance_delay: Duration,
    shuffle: bool,
}

impl DrillService {
    #[must_use]
    pub fn new(
        clock: Clock,
        emitter: Arc<RemediationEmitter>,
        activities: Arc<dyn ActivityRepository>,
    ) -> Self {
        Self {
            clock,
            emitter,
            activities,
            auto_advance_delay: AUTO_ADVANCE_DELAY,
            shuffle: false,
        }
    }

    #[must_use]
    pub fn with_auto_advance_delay(mut self, delay: Duration) -> Self {
        self.auto_advance_delay = delay;
        self
    }

    #[must_use]
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Start an attempt at `drill`.
    ///
    /// # Errors
    ///
    /// Returns `DrillError::Quiz` if the drill has no questions.
    pub fn start(
        &self,
        drill: &Drill,
        track: CertTrack,
        mode: QuizMode,
    ) -> Result<DrillSession, DrillError> {
        let started_at = self.clock.now();
        let session = if self.shuffle {
            let mut questions = drill.questions.clone();
            questions.shuffle(&mut rand::rng());
            DrillSession::new(drill, track, QuizSession::new(questions, mode)?, started_at)
        } else {
            DrillSession::from_drill(drill, track, mode, started_at)?
        };

        tracing::debug!(drill_id = %drill.id, ?mode, questions = drill.questions.len(), "drill started");
        Ok(session)
    }

    /// Select an answer for the current question.
    ///
    /// In diagnostic mode this waits out the auto-advance delay and advances.
    /// Dropping the returned future during that wait cancels the advance.
    ///
    /// # Errors
    ///
    /// Returns `DrillError::Quiz` if the automatic advance is rejected.
    pub async fn answer(
        &self,
        session: &mut DrillSession,
        option_id: &str,
    ) -> Result<AnswerResult, DrillError> {
        let outcome = session.quiz_mut().select_answer(option_id);

        if outcome != SelectOutcome::AutoAdvance {
            return Ok(AnswerResult {
                outcome,
                phase: session.quiz().phase(),
                completion: None,
            });
        }

        if !self.auto_advance_delay.is_zero() {
            tokio::time::sleep(self.auto_advance_delay).await;
        }
        let phase = session.quiz_mut().advance()?;
        let completion = self.finish_if_complete(session).await;

        Ok(AnswerResult {
            outcome,
            phase,
            completion,
        })
    }

    /// Move past a reviewed question (practice mode).
    ///
    /// # Errors
    ///
    /// Returns `DrillError::Quiz` if nothing was answered or the drill is over.
    pub async fn advance(&self, session: &mut DrillSession) -> Result<AnswerResult, DrillError> {
        let phase = session.quiz_mut().advance()?;
        let completion = self.finish_if_complete(session).await;
        Ok(AnswerResult {
            outcome: SelectOutcome::Ignored,
            phase,
            completion,
        })
    }

    /// Report a completed attempt if it has not been reported yet.
    ///
    /// Safe to call any number of times; the quiz latch makes only the first
    /// call after completion write anything.
    pub async fn finish_if_complete(&self, session: &mut DrillSession) -> Option<DrillCompletion> {
        let score = session.quiz_mut().take_completion()?;
        let verdict = session.quiz().verdict()?;

        self.record_activity(session, score).await;
        let emission = self.emitter.on_quiz_complete(&session.report(score)).await;

        tracing::info!(
            drill_id = %session.drill_id(),
            score,
            ?verdict,
            "drill completed"
        );

        let completion = DrillCompletion {
            score,
            verdict,
            emission,
        };
        session.set_completion(Some(completion.clone()));
        Some(completion)
    }

    /// Begin another attempt of a completed drill.
    ///
    /// # Errors
    ///
    /// Returns `DrillError::Quiz` unless the drill is complete.
    pub fn restart(&self, session: &mut DrillSession) -> Result<(), DrillError> {
        session.quiz_mut().restart()?;
        session.set_started_at(self.clock.now());
        session.set_completion(None);
        Ok(())
    }

    /// Discard an attempt without reporting anything.
    pub fn abort(&self, session: DrillSession) {
        tracing::debug!(
            drill_id = %session.drill_id(),
            answered = session.quiz().index(),
            "drill aborted"
        );
    }

    async fn record_activity(&self, session: &DrillSession, score: u8) {
        let now = self.clock.now();
        let duration_secs =
            u32::try_from(now.signed_duration_since(session.started_at()).num_seconds().max(0))
                .unwrap_or(u32::MAX);

        let record = match ActivityRecord::new(
            session.track(),
            session.drill_id().clone(),
            session.domain(),
            u32::from(score),
            duration_secs,
            now,
        ) {
            Ok(record) => record,
            Err(err) => {
                tracing::warn!(drill_id = %session.drill_id(), error = %err, "skipping activity record");
                return;
            }
        };

        if let Err(err) = self.activities.append_activity(&record).await {
            tracing::warn!(drill_id = %session.drill_id(), error = %err, "failed to record activity");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::repository::{InMemoryRepository, TaskRepository};
    use vault_core::model::{DrillId, Question, QuestionOption};
    use vault_core::quiz::{QuizError, QuizVerdict};
    use vault_core::time::fixed_clock;

    use crate::remediation_service::EmissionOutcome;

    fn drill(n: u32) -> Drill {
        Drill {
            id: DrillId::new("iam-core"),
            title: "IAM Core".into(),
            domain: "IAM".into(),
            questions: (1..=n)
                .map(|id| Question {
                    id,
                    text: format!("Q{id}"),
                    options: vec![
                        QuestionOption::Keyed {
                            id: "a".into(),
                            text: "right".into(),
                        },
                        QuestionOption::Keyed {
                            id: "b".into(),
                            text: "wrong".into(),
                        },
                    ],
                    correct_answer: "a".into(),
                    explanation: String::new(),
                })
                .collect(),
        }
    }

    fn service(repo: &InMemoryRepository) -> DrillService {
        let emitter = Arc::new(RemediationEmitter::new(fixed_clock(), Arc::new(repo.clone())));
        DrillService::new(fixed_clock(), emitter, Arc::new(repo.clone()))
            .with_auto_advance_delay(Duration::ZERO)
    }

    #[tokio::test]
    async fn diagnostic_drill_auto_advances_and_reports_once() {
        let repo = InMemoryRepository::new();
        let svc = service(&repo);
        let mut session = svc.start(&drill(5), CertTrack::Cissp, QuizMode::Diagnostic).unwrap();

        let mut completions = Vec::new();
        for answer in ["a", "b", "a", "b", "b"] {
            let res = svc.answer(&mut session, answer).await.unwrap();
            assert_eq!(res.outcome, SelectOutcome::AutoAdvance);
            completions.extend(res.completion);
        }

        assert_eq!(completions.len(), 1);
        assert_eq!(completions[0].score, 40);
        assert_eq!(completions[0].verdict, QuizVerdict::RemediationRequired);
        assert!(matches!(completions[0].emission, EmissionOutcome::Created(_)));

        for _ in 0..3 {
            assert!(svc.finish_if_complete(&mut session).await.is_none());
        }
        let tasks = repo.list_tasks().await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].priority, 10);

        let activity = repo.activities_for_track(CertTrack::Cissp).await.unwrap();
        assert_eq!(activity.len(), 1);
        assert_eq!(activity[0].score, 40);
    }

    #[tokio::test]
    async fn practice_drill_waits_for_explicit_advance() {
        let repo = InMemoryRepository::new();
        let svc = service(&repo);
        let mut session = svc.start(&drill(1), CertTrack::Cissp, QuizMode::Practice).unwrap();

        let res = svc.answer(&mut session, "a").await.unwrap();
        assert!(matches!(res.outcome, SelectOutcome::Review(ref f) if f.correct));
        assert_eq!(res.phase, QuizPhase::Reviewing { index: 0 });
        assert!(res.completion.is_none());

        let res = svc.advance(&mut session).await.unwrap();
        assert_eq!(res.phase, QuizPhase::Complete);
        let completion = res.completion.unwrap();
        assert_eq!(completion.score, 100);
        assert_eq!(completion.emission, EmissionOutcome::Closed(0));
        assert!(repo.list_tasks().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn restart_allows_a_second_report() {
        let repo = InMemoryRepository::new();
        let svc = service(&repo);
        let mut session = svc.start(&drill(1), CertTrack::Cissp, QuizMode::Diagnostic).unwrap();

        assert!(matches!(
            svc.restart(&mut session).unwrap_err(),
            DrillError::Quiz(QuizError::NotComplete)
        ));

        svc.answer(&mut session, "b").await.unwrap();
        svc.restart(&mut session).unwrap();
        assert!(session.completion().is_none());
        let res = svc.answer(&mut session, "a").await.unwrap();

        assert_eq!(res.completion.unwrap().emission, EmissionOutcome::Closed(1));
        assert_eq!(repo.activities_for_track(CertTrack::Cissp).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn aborted_drill_leaves_no_trace() {
        let repo = InMemoryRepository::new();
        let svc = service(&repo);
        let mut session = svc.start(&drill(3), CertTrack::Cissp, QuizMode::Diagnostic).unwrap();
        svc.answer(&mut session, "b").await.unwrap();
        svc.abort(session);

        assert!(repo.list_tasks().await.unwrap().is_empty());
        assert!(repo.activities_for_track(CertTrack::Cissp).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn shuffled_drill_keeps_every_question() {
        let repo = InMemoryRepository::new();
        let svc = service(&repo).with_shuffle(true);
        let session = svc.start(&drill(6), CertTrack::Cissp, QuizMode::Practice).unwrap();
        assert_eq!(session.quiz().question_count(), 6);
    }

    #[test]
    fn empty_drill_is_rejected() {
        let repo = InMemoryRepository::new();
        let err = service(&repo)
            .start(&drill(0), CertTrack::Cissp, QuizMode::Practice)
            .unwrap_err();
        assert!(matches!(err, DrillError::Quiz(QuizError::Empty)));
    }
}
