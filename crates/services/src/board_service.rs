use std::sync::Arc;

use storage::repository::{TaskEvent, TaskRepository};
use tokio::sync::broadcast::{self, error::RecvError};
use vault_core::model::{DrillId, NewTask, RemediationTask, TaskId, TaskStatus};

use crate::error::BoardError;

//
// ─── BOARD SNAPSHOT ────────────────────────────────────────────────────────────
//

/// One Kanban column.
#[derive(Debug, Clone, PartialEq)]
pub struct Lane {
    pub status: TaskStatus,
    pub label: &'static str,
    /// Highest priority first.
    pub tasks: Vec<RemediationTask>,
}

/// Local copy of the task store, kept current by applying change events.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Board {
    tasks: Vec<RemediationTask>,
}

impl Board {
    #[must_use]
    pub fn from_tasks(tasks: Vec<RemediationTask>) -> Self {
        Self { tasks }
    }

    #[must_use]
    pub fn tasks(&self) -> &[RemediationTask] {
        &self.tasks
    }

    #[must_use]
    pub fn get(&self, id: TaskId) -> Option<&RemediationTask> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Applies one change. Replaying an event is harmless.
    pub fn apply(&mut self, event: TaskEvent) {
        match event {
            TaskEvent::Created(task) | TaskEvent::Updated(task) => {
                match self.tasks.iter_mut().find(|t| t.id == task.id) {
                    Some(existing) => *existing = task,
                    None => self.tasks.push(task),
                }
            }
            TaskEvent::Deleted(id) => self.tasks.retain(|t| t.id != id),
        }
    }

    /// The four lanes in board order.
    #[must_use]
    pub fn lanes(&self) -> Vec<Lane> {
        TaskStatus::LANES
            .iter()
            .map(|&status| {
                let mut tasks: Vec<RemediationTask> = self
                    .tasks
                    .iter()
                    .filter(|t| t.status == status)
                    .cloned()
                    .collect();
                tasks.sort_by(|a, b| b.priority.cmp(&a.priority));
                Lane {
                    status,
                    label: status.lane_label(),
                    tasks,
                }
            })
            .collect()
    }
}

//
// ─── LIVE FEED ─────────────────────────────────────────────────────────────────
//

/// A board that follows the store.
pub struct TaskFeed {
    receiver: broadcast::Receiver<TaskEvent>,
    board: Board,
    tasks: Arc<dyn TaskRepository>,
}

impl TaskFeed {
    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Waits for the next change and returns the updated board.
    ///
    /// A receiver that fell behind reloads the full task list instead of
    /// replaying. Returns `None` once the store is gone.
    pub async fn next(&mut self) -> Option<&Board> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => {
                    self.board.apply(event);
                    return Some(&self.board);
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "task feed lagged; resyncing");
                    match self.tasks.list_tasks().await {
                        Ok(tasks) => {
                            self.board = Board::from_tasks(tasks);
                            return Some(&self.board);
                        }
                        Err(err) => {
                            tracing::warn!(error = %err, "task feed resync failed");
                        }
                    }
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Kanban operations over the task store.
#[derive(Clone)]
pub struct BoardService {
    tasks: Arc<dyn TaskRepository>,
}

impl BoardService {
    #[must_use]
    pub fn new(tasks: Arc<dyn TaskRepository>) -> Self {
        Self { tasks }
    }

    /// # Errors
    ///
    /// Returns `BoardError::Storage` if the tasks cannot be loaded.
    pub async fn lanes(&self) -> Result<Vec<Lane>, BoardError> {
        let tasks = self.tasks.list_tasks().await?;
        Ok(Board::from_tasks(tasks).lanes())
    }

    /// Add a user-entered task to the TODO lane.
    ///
    /// # Errors
    ///
    /// Returns `BoardError::Task` for a blank title and `BoardError::Storage`
    /// if the write fails.
    pub async fn add_manual(&self, title: &str) -> Result<RemediationTask, BoardError> {
        let task = self.tasks.create_task(NewTask::manual(title)?).await?;
        tracing::info!(task_id = %task.id, "manual task added");
        Ok(task)
    }

    /// # Errors
    ///
    /// Returns `BoardError::Storage` (`NotFound` for an unknown id).
    pub async fn move_task(
        &self,
        id: TaskId,
        status: TaskStatus,
    ) -> Result<RemediationTask, BoardError> {
        let task = self.tasks.update_status(id, status).await?;
        tracing::debug!(task_id = %id, status = status.as_str(), "task moved");
        Ok(task)
    }

    /// # Errors
    ///
    /// Returns `BoardError::Storage` (`NotFound` for an unknown id).
    pub async fn delete(&self, id: TaskId) -> Result<(), BoardError> {
        self.tasks.delete_task(id).await?;
        tracing::debug!(task_id = %id, "task deleted");
        Ok(())
    }

    /// Remove every completed task.
    ///
    /// # Errors
    ///
    /// Returns `BoardError::Storage` if the delete fails.
    pub async fn purge_completed(&self) -> Result<u64, BoardError> {
        let removed = self.tasks.purge_completed().await?;
        tracing::info!(removed, "completed tasks purged");
        Ok(removed)
    }

    /// Drill to re-run for a task, if it came from a failed drill.
    ///
    /// # Errors
    ///
    /// Returns `BoardError::Storage` if the task cannot be loaded.
    pub async fn remediation_target(&self, id: TaskId) -> Result<Option<DrillId>, BoardError> {
        Ok(self.tasks.get_task(id).await?.and_then(|t| t.drill_id))
    }

    /// Start following the board.
    ///
    /// # Errors
    ///
    /// Returns `BoardError::Storage` if the initial load fails.
    pub async fn subscribe(&self) -> Result<TaskFeed, BoardError> {
        // Subscribe before loading so nothing written in between is missed.
        let receiver = self.tasks.subscribe();
        let tasks = self.tasks.list_tasks().await?;
        Ok(TaskFeed {
            receiver,
            board: Board::from_tasks(tasks),
            tasks: Arc::clone(&self.tasks),
        })
    }
}
