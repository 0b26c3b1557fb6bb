mod activity;
mod domain;
mod ids;
mod module;
mod question;
mod task;
mod track;

pub use activity::{ActivityError, ActivityRecord};
pub use domain::{DomainScore, DomainScoreError, aggregate_domain_scores};
pub use ids::{ActivityId, DrillId, ModuleId, ParseIdError, TaskId};
pub use module::{
    CORRUPT_CONFIG_TEXT, ConfigFault, ModuleDrill, ModuleError, ModuleGroup, ModuleKind, NewModule,
    StudyModule, UNMAPPED_GROUP, group_by_domain,
};
pub use question::{Drill, Question, QuestionError, QuestionOption};
pub use task::{
    NewTask, RemediationMetadata, RemediationTask, TaskError, TaskOrigin, TaskStatus,
};
pub use track::{BlueprintDomain, CertTrack, TrackError, normalize_domain};
