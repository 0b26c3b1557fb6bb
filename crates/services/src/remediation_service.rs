use std::sync::Arc;

use storage::repository::TaskRepository;
use vault_core::model::{TaskId, TaskStatus};
use vault_core::remediation::{CompletionReport, RemediationDecision, decide};
use vault_core::time::Clock;

/// What the emitter did with a completion report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmissionOutcome {
    /// Below mastery: a new task was written.
    Created(TaskId),
    /// Mastery: this many open tasks for the drill were completed.
    Closed(usize),
    /// The store rejected the write. Already logged.
    Failed,
}

/// Turns finished drills into task board writes.
///
/// This is a best-effort path: store errors are logged and swallowed so that a
/// failed write never blocks the user from continuing or restarting.
#[derive(Clone)]
pub struct RemediationEmitter {
    clock: Clock,
    tasks: Arc<dyn TaskRepository>,
}

impl RemediationEmitter {
    #[must_use]
    pub fn new(clock: Clock, tasks: Arc<dyn TaskRepository>) -> Self {
        Self { clock, tasks }
    }

    pub async fn on_quiz_complete(&self, report: &CompletionReport) -> EmissionOutcome {
        match decide(report, self.clock.now()) {
            RemediationDecision::Emit(task) => match self.tasks.create_task(task).await {
                Ok(created) => {
                    tracing::info!(
                        task_id = %created.id,
                        drill_id = %report.drill_id,
                        score = report.score,
                        priority = created.priority,
                        "remediation task emitted"
                    );
                    EmissionOutcome::Created(created.id)
                }
                Err(err) => {
                    tracing::warn!(
                        drill_id = %report.drill_id,
                        score = report.score,
                        error = %err,
                        "failed to emit remediation task"
                    );
                    EmissionOutcome::Failed
                }
            },
            RemediationDecision::CloseOpen(drill_id) => {
                let open = match self.tasks.open_tasks_for_drill(&drill_id).await {
                    Ok(open) => open,
                    Err(err) => {
                        tracing::warn!(%drill_id, error = %err, "failed to load open remediation tasks");
                        return EmissionOutcome::Failed;
                    }
                };

                let mut closed = 0;
                for task in open {
                    match self.tasks.update_status(task.id, TaskStatus::Completed).await {
                        Ok(_) => closed += 1,
                        Err(err) => {
                            tracing::warn!(task_id = %task.id, error = %err, "failed to close remediation task");
                        }
                    }
                }
                tracing::info!(%drill_id, score = report.score, closed, "mastery reached");
                EmissionOutcome::Closed(closed)
            }
        }
    }
}
