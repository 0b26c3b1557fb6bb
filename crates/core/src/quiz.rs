//! Quiz state machine for a single drill attempt.
//!
//! ```text
//! Answering(i) --select--> Reviewing(i)          (practice)
//! Answering(i) --select--> Answering(i), locked  (diagnostic, auto-advance pending)
//! locked/Reviewing(i) --advance--> Answering(i+1) | Complete
//! Complete --restart--> Answering(0)
//! ```
//!
//! The final score is computed once, on entering `Complete`, and can be taken
//! out of the session exactly once through the completion latch.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::model::Question;
use crate::remediation::MASTERY_THRESHOLD;

/// Delay between a diagnostic answer and the automatic advance.
pub const AUTO_ADVANCE_DELAY: Duration = Duration::from_millis(800);

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("a drill needs at least one question")]
    Empty,

    #[error("no answer selected for the current question")]
    NoSelection,

    #[error("quiz already completed")]
    Completed,

    #[error("quiz is not completed yet")]
    NotComplete,
}

//
// ─── MODES / PHASES ────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuizMode {
    /// Feedback and explanation after each answer, explicit advance.
    #[default]
    Practice,
    /// No feedback; advances on its own after [`AUTO_ADVANCE_DELAY`].
    Diagnostic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizPhase {
    Answering { index: usize },
    Reviewing { index: usize },
    Complete,
}

/// Shown after a practice-mode answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub correct: bool,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectOutcome {
    /// An answer was already locked in, or the quiz is over.
    Ignored,
    Review(Feedback),
    /// Diagnostic mode: the caller must call `advance` after the delay.
    AutoAdvance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizVerdict {
    Maintained,
    RemediationRequired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizProgress {
    /// 1-based position of the current question; equals `total` once complete.
    pub position: usize,
    pub total: usize,
    pub correct: usize,
    pub is_complete: bool,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone)]
pub struct QuizSession {
    questions: Vec<Question>,
    mode: QuizMode,
    index: usize,
    correct: usize,
    selected: Option<String>,
    last_correct: Option<bool>,
    final_score: Option<u8>,
    reported: bool,
}

impl QuizSession {
    /// # Errors
    ///
    /// Returns `QuizError::Empty` if `questions` is empty.
    pub fn new(questions: Vec<Question>, mode: QuizMode) -> Result<Self, QuizError> {
        if questions.is_empty() {
            return Err(QuizError::Empty);
        }
        Ok(Self {
            questions,
            mode,
            index: 0,
            correct: 0,
            selected: None,
            last_correct: None,
            final_score: None,
            reported: false,
        })
    }

    #[must_use]
    pub fn mode(&self) -> QuizMode {
        self.mode
    }

    #[must_use]
    pub fn phase(&self) -> QuizPhase {
        if self.final_score.is_some() {
            QuizPhase::Complete
        } else if self.selected.is_some() && self.mode == QuizMode::Practice {
            QuizPhase::Reviewing { index: self.index }
        } else {
            QuizPhase::Answering { index: self.index }
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.final_score.is_some()
    }

    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn correct_count(&self) -> usize {
        self.correct
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.index)
    }

    #[must_use]
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Diagnostic answer locked in and waiting for the timed advance.
    #[must_use]
    pub fn awaiting_auto_advance(&self) -> bool {
        self.mode == QuizMode::Diagnostic && self.selected.is_some() && !self.is_complete()
    }

    /// Correctness and explanation for the current answer. Never exposed in
    /// diagnostic mode.
    #[must_use]
    pub fn feedback(&self) -> Option<Feedback> {
        if self.mode == QuizMode::Diagnostic {
            return None;
        }
        let correct = self.last_correct?;
        let question = self.current_question()?;
        Some(Feedback {
            correct,
            explanation: question.explanation.clone(),
        })
    }

    #[must_use]
    pub fn progress(&self) -> QuizProgress {
        let total = self.questions.len();
        QuizProgress {
            position: (self.index + 1).min(total),
            total,
            correct: self.correct,
            is_complete: self.is_complete(),
        }
    }

    /// `round(100 * correct / total)`, available once complete.
    #[must_use]
    pub fn final_score_percent(&self) -> Option<u8> {
        self.final_score
    }

    #[must_use]
    pub fn verdict(&self) -> Option<QuizVerdict> {
        self.final_score.map(|score| {
            if score >= MASTERY_THRESHOLD {
                QuizVerdict::Maintained
            } else {
                QuizVerdict::RemediationRequired
            }
        })
    }

    /// Locks in an answer for the current question.
    ///
    /// A second call before `advance` is a no-op, as is any call once complete.
    pub fn select_answer(&mut self, option_id: &str) -> SelectOutcome {
        if self.selected.is_some() || self.is_complete() {
            return SelectOutcome::Ignored;
        }
        let Some(question) = self.questions.get(self.index) else {
            return SelectOutcome::Ignored;
        };

        let correct = question.is_correct(option_id);
        if correct {
            self.correct += 1;
        }
        self.selected = Some(option_id.to_string());
        self.last_correct = Some(correct);

        match self.mode {
            QuizMode::Practice => SelectOutcome::Review(Feedback {
                correct,
                explanation: question.explanation.clone(),
            }),
            QuizMode::Diagnostic => SelectOutcome::AutoAdvance,
        }
    }

    /// Moves past the answered question, entering `Complete` after the last one.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Completed` once complete and `QuizError::NoSelection`
    /// if the current question has not been answered.
    pub fn advance(&mut self) -> Result<QuizPhase, QuizError> {
        if self.is_complete() {
            return Err(QuizError::Completed);
        }
        if self.selected.is_none() {
            return Err(QuizError::NoSelection);
        }

        self.selected = None;
        self.last_correct = None;

        let next = self.index + 1;
        if next >= self.questions.len() {
            self.index = self.questions.len();
            self.final_score = Some(score_percent(self.correct, self.questions.len()));
        } else {
            self.index = next;
        }
        Ok(self.phase())
    }

    /// Takes the final score out of the completion latch.
    ///
    /// Returns `Some` exactly once per attempt; every later call (including
    /// repeated observations of the terminal state) returns `None`.
    pub fn take_completion(&mut self) -> Option<u8> {
        match self.final_score {
            Some(score) if !self.reported => {
                self.reported = true;
                Some(score)
            }
            _ => None,
        }
    }

    /// Runs `on_complete` with the final score if the latch is still open.
    ///
    /// Returns whether the callback ran.
    pub fn report_completion<F: FnOnce(u8)>(&mut self, on_complete: F) -> bool {
        match self.take_completion() {
            Some(score) => {
                on_complete(score);
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn has_reported(&self) -> bool {
        self.reported
    }

    /// Resets score, position and the completion latch for another attempt.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NotComplete` unless the quiz is complete.
    pub fn restart(&mut self) -> Result<(), QuizError> {
        if !self.is_complete() {
            return Err(QuizError::NotComplete);
        }
        self.index = 0;
        self.correct = 0;
        self.selected = None;
        self.last_correct = None;
        self.final_score = None;
        self.reported = false;
        Ok(())
    }
}

/// Integer round-half-up of `100 * correct / total`.
fn score_percent(correct: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let rounded = (200 * correct + total) / (2 * total);
    u8::try_from(rounded.min(100)).unwrap_or(100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QuestionOption;

    fn question(id: u32) -> Question {
        Question {
            id,
            text: format!("Q{id}"),
            options: vec![
                QuestionOption::Label("right".into()),
                QuestionOption::Label("wrong".into()),
            ],
            correct_answer: "right".into(),
            explanation: format!("because {id}"),
        }
    }

    fn questions(n: u32) -> Vec<Question> {
        (1..=n).map(question).collect()
    }

    fn answer_all(session: &mut QuizSession, answers: &[&str]) {
        for a in answers {
            session.select_answer(a);
            session.advance().unwrap();
        }
    }

    #[test]
    fn empty_drill_is_rejected() {
        assert_eq!(
            QuizSession::new(Vec::new(), QuizMode::Practice).unwrap_err(),
            QuizError::Empty
        );
    }

    #[test]
    fn single_correct_answer_scores_100() {
        let mut s = QuizSession::new(questions(1), QuizMode::Practice).unwrap();
        answer_all(&mut s, &["right"]);
        assert_eq!(s.phase(), QuizPhase::Complete);
        assert_eq!(s.final_score_percent(), Some(100));
        assert_eq!(s.verdict(), Some(QuizVerdict::Maintained));
    }

    #[test]
    fn two_of_five_scores_40() {
        let mut s = QuizSession::new(questions(5), QuizMode::Practice).unwrap();
        answer_all(&mut s, &["right", "wrong", "right", "wrong", "wrong"]);
        assert_eq!(s.final_score_percent(), Some(40));
        assert_eq!(s.verdict(), Some(QuizVerdict::RemediationRequired));
    }

    #[test]
    fn rounding_matches_half_up() {
        assert_eq!(score_percent(1, 3), 33);
        assert_eq!(score_percent(2, 3), 67);
        assert_eq!(score_percent(1, 8), 13);
        assert_eq!(score_percent(0, 4), 0);
    }

    #[test]
    fn second_selection_is_a_no_op() {
        let mut s = QuizSession::new(questions(2), QuizMode::Practice).unwrap();
        assert!(matches!(s.select_answer("wrong"), SelectOutcome::Review(f) if !f.correct));
        assert_eq!(s.select_answer("right"), SelectOutcome::Ignored);
        assert_eq!(s.correct_count(), 0);
        assert_eq!(s.selected(), Some("wrong"));
    }

    #[test]
    fn practice_mode_reviews_before_advancing() {
        let mut s = QuizSession::new(questions(2), QuizMode::Practice).unwrap();
        assert_eq!(s.phase(), QuizPhase::Answering { index: 0 });
        s.select_answer("right");
        assert_eq!(s.phase(), QuizPhase::Reviewing { index: 0 });
        let feedback = s.feedback().unwrap();
        assert!(feedback.correct);
        assert_eq!(feedback.explanation, "because 1");
        assert_eq!(s.advance().unwrap(), QuizPhase::Answering { index: 1 });
        assert!(s.selected().is_none());
    }

    #[test]
    fn diagnostic_mode_hides_feedback() {
        let mut s = QuizSession::new(questions(2), QuizMode::Diagnostic).unwrap();
        assert_eq!(s.select_answer("right"), SelectOutcome::AutoAdvance);
        assert!(s.awaiting_auto_advance());
        assert!(s.feedback().is_none());
        assert_eq!(s.phase(), QuizPhase::Answering { index: 0 });
        s.advance().unwrap();
        assert!(!s.awaiting_auto_advance());
    }

    #[test]
    fn advance_requires_an_answer() {
        let mut s = QuizSession::new(questions(1), QuizMode::Practice).unwrap();
        assert_eq!(s.advance().unwrap_err(), QuizError::NoSelection);
        answer_all(&mut s, &["right"]);
        assert_eq!(s.advance().unwrap_err(), QuizError::Completed);
        assert_eq!(s.select_answer("right"), SelectOutcome::Ignored);
    }

    #[test]
    fn completion_latch_fires_once() {
        let mut s = QuizSession::new(questions(1), QuizMode::Diagnostic).unwrap();
        assert!(s.take_completion().is_none());
        answer_all(&mut s, &["right"]);

        let mut calls = Vec::new();
        for _ in 0..5 {
            s.report_completion(|score| calls.push(score));
        }
        assert_eq!(calls, vec![100]);
        assert!(s.has_reported());
        assert!(s.take_completion().is_none());
    }

    #[test]
    fn restart_only_from_complete_and_rearms_latch() {
        let mut s = QuizSession::new(questions(2), QuizMode::Practice).unwrap();
        assert_eq!(s.restart().unwrap_err(), QuizError::NotComplete);
        answer_all(&mut s, &["right", "right"]);
        assert_eq!(s.take_completion(), Some(100));

        s.restart().unwrap();
        assert_eq!(s.phase(), QuizPhase::Answering { index: 0 });
        assert_eq!(s.correct_count(), 0);
        assert!(!s.has_reported());

        answer_all(&mut s, &["wrong", "right"]);
        assert_eq!(s.take_completion(), Some(50));
    }

    #[test]
    fn malformed_question_never_scores() {
        let mut q = question(1);
        q.correct_answer = "missing".into();
        let mut s = QuizSession::new(vec![q], QuizMode::Practice).unwrap();
        answer_all(&mut s, &["right"]);
        assert_eq!(s.final_score_percent(), Some(0));
    }

    #[test]
    fn progress_tracks_position() {
        let mut s = QuizSession::new(questions(3), QuizMode::Practice).unwrap();
        assert_eq!(s.progress().position, 1);
        answer_all(&mut s, &["right", "right", "right"]);
        let p = s.progress();
        assert_eq!((p.position, p.total, p.correct, p.is_complete), (3, 3, 3, true));
    }
}
