use thiserror::Error;

use crate::model::{
    ActivityError, DomainScoreError, ModuleError, QuestionError, TaskError, TrackError,
};
use crate::quiz::QuizError;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Activity(#[from] ActivityError),
    #[error(transparent)]
    DomainScore(#[from] DomainScoreError),
    #[error(transparent)]
    Module(#[from] ModuleError),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Task(#[from] TaskError),
    #[error(transparent)]
    Track(#[from] TrackError),
}
