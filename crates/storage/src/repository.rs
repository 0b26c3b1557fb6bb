use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::broadcast;
use vault_core::model::{
    ActivityId, ActivityRecord, CertTrack, DrillId, ModuleId, NewModule, NewTask,
    RemediationTask, StudyModule, TaskId, TaskStatus,
};

/// Capacity of the task change feed before slow subscribers start lagging.
pub const TASK_FEED_CAPACITY: usize = 256;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── CHANGE FEED ───────────────────────────────────────────────────────────────
//

/// A single change to the task store, as seen by board subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskEvent {
    Created(RemediationTask),
    Updated(RemediationTask),
    Deleted(TaskId),
}

/// Fan-out of task changes to every live subscriber.
#[derive(Clone)]
pub struct TaskEvents {
    sender: broadcast::Sender<TaskEvent>,
}

impl TaskEvents {
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(TASK_FEED_CAPACITY);
        Self { sender }
    }

    /// Publishes an event. Having no subscribers is not an error.
    pub fn publish(&self, event: TaskEvent) {
        let _ = self.sender.send(event);
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.sender.subscribe()
    }
}

impl Default for TaskEvents {
    fn default() -> Self {
        Self::new()
    }
}

//
// ─── CONTRACTS ─────────────────────────────────────────────────────────────────
//

/// Repository contract for remediation tasks.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Persist a new task and return it with its assigned id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the task cannot be stored.
    async fn create_task(&self, task: NewTask) -> Result<RemediationTask, StorageError>;

    /// Fetch a task by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for backend failures.
    async fn get_task(&self, id: TaskId) -> Result<Option<RemediationTask>, StorageError>;

    /// All tasks in creation order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for backend failures.
    async fn list_tasks(&self) -> Result<Vec<RemediationTask>, StorageError>;

    /// Tasks tagged with `drill_id` whose status is not `COMPLETED`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for backend failures.
    async fn open_tasks_for_drill(
        &self,
        drill_id: &DrillId,
    ) -> Result<Vec<RemediationTask>, StorageError>;

    /// Move a task to another lane.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the task does not exist.
    async fn update_status(
        &self,
        id: TaskId,
        status: TaskStatus,
    ) -> Result<RemediationTask, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the task does not exist.
    async fn delete_task(&self, id: TaskId) -> Result<(), StorageError>;

    /// Delete every completed task, returning how many were removed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for backend failures.
    async fn purge_completed(&self) -> Result<u64, StorageError>;

    /// Live feed of changes made through this repository.
    fn subscribe(&self) -> broadcast::Receiver<TaskEvent>;
}

/// Repository contract for drill telemetry.
#[async_trait]
pub trait ActivityRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn append_activity(&self, activity: &ActivityRecord) -> Result<ActivityId, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` for backend failures.
    async fn activities_for_track(
        &self,
        track: CertTrack,
    ) -> Result<Vec<ActivityRecord>, StorageError>;
}

/// Repository contract for the study-module vault.
#[async_trait]
pub trait ModuleRepository: Send + Sync {
    /// Persist a new module and return it with its assigned id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the module cannot be stored.
    async fn create_module(&self, module: NewModule) -> Result<StudyModule, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` for backend failures.
    async fn get_module(&self, id: ModuleId) -> Result<Option<StudyModule>, StorageError>;

    /// Modules of one track, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for backend failures.
    async fn modules_for_track(&self, track: CertTrack) -> Result<Vec<StudyModule>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the module does not exist.
    async fn delete_module(&self, id: ModuleId) -> Result<(), StorageError>;
}

//
// ─── IN-MEMORY ─────────────────────────────────────────────────────────────────
//

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    tasks: Arc<Mutex<Vec<RemediationTask>>>,
    activities: Arc<Mutex<Vec<ActivityRecord>>>,
    modules: Arc<Mutex<Vec<StudyModule>>>,
    events: TaskEvents,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait]
impl TaskRepository for InMemoryRepository {
    async fn create_task(&self, task: NewTask) -> Result<RemediationTask, StorageError> {
        let task = task.into_task(TaskId::generate());
        {
            let mut guard = self.tasks.lock().map_err(poisoned)?;
            guard.push(task.clone());
        }
        self.events.publish(TaskEvent::Created(task.clone()));
        Ok(task)
    }

    async fn get_task(&self, id: TaskId) -> Result<Option<RemediationTask>, StorageError> {
        let guard = self.tasks.lock().map_err(poisoned)?;
        Ok(guard.iter().find(|t| t.id == id).cloned())
    }

    async fn list_tasks(&self) -> Result<Vec<RemediationTask>, StorageError> {
        let guard = self.tasks.lock().map_err(poisoned)?;
        Ok(guard.clone())
    }

    async fn open_tasks_for_drill(
        &self,
        drill_id: &DrillId,
    ) -> Result<Vec<RemediationTask>, StorageError> {
        let guard = self.tasks.lock().map_err(poisoned)?;
        Ok(guard
            .iter()
            .filter(|t| t.drill_id.as_ref() == Some(drill_id) && t.status.is_open())
            .cloned()
            .collect())
    }

    async fn update_status(
        &self,
        id: TaskId,
        status: TaskStatus,
    ) -> Result<RemediationTask, StorageError> {
        let updated = {
            let mut guard = self.tasks.lock().map_err(poisoned)?;
            let task = guard
                .iter_mut()
                .find(|t| t.id == id)
                .ok_or(StorageError::NotFound)?;
            task.status = status;
            task.clone()
        };
        self.events.publish(TaskEvent::Updated(updated.clone()));
        Ok(updated)
    }

    async fn delete_task(&self, id: TaskId) -> Result<(), StorageError> {
        {
            let mut guard = self.tasks.lock().map_err(poisoned)?;
            let before = guard.len();
            guard.retain(|t| t.id != id);
            if guard.len() == before {
                return Err(StorageError::NotFound);
            }
        }
        self.events.publish(TaskEvent::Deleted(id));
        Ok(())
    }

    async fn purge_completed(&self) -> Result<u64, StorageError> {
        let removed: Vec<TaskId> = {
            let mut guard = self.tasks.lock().map_err(poisoned)?;
            let removed = guard
                .iter()
                .filter(|t| t.status == TaskStatus::Completed)
                .map(|t| t.id)
                .collect();
            guard.retain(|t| t.status != TaskStatus::Completed);
            removed
        };
        for id in &removed {
            self.events.publish(TaskEvent::Deleted(*id));
        }
        Ok(removed.len() as u64)
    }

    fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.events.subscribe()
    }
}

#[async_trait]
impl ActivityRepository for InMemoryRepository {
    async fn append_activity(&self, activity: &ActivityRecord) -> Result<ActivityId, StorageError> {
        let mut guard = self.activities.lock().map_err(poisoned)?;
        let id = ActivityId::new(guard.len() as u64 + 1);
        guard.push(activity.clone().with_id(id));
        Ok(id)
    }

    async fn activities_for_track(
        &self,
        track: CertTrack,
    ) -> Result<Vec<ActivityRecord>, StorageError> {
        let guard = self.activities.lock().map_err(poisoned)?;
        Ok(guard.iter().filter(|a| a.track == track).cloned().collect())
    }
}

#[async_trait]
impl ModuleRepository for InMemoryRepository {
    async fn create_module(&self, module: NewModule) -> Result<StudyModule, StorageError> {
        let mut guard = self.modules.lock().map_err(poisoned)?;
        let next = guard.last().map_or(1, |m| m.id.value() + 1);
        let module = module.into_module(ModuleId::new(next));
        guard.push(module.clone());
        Ok(module)
    }

    async fn get_module(&self, id: ModuleId) -> Result<Option<StudyModule>, StorageError> {
        let guard = self.modules.lock().map_err(poisoned)?;
        Ok(guard.iter().find(|m| m.id == id).cloned())
    }

    async fn modules_for_track(&self, track: CertTrack) -> Result<Vec<StudyModule>, StorageError> {
        let guard = self.modules.lock().map_err(poisoned)?;
        Ok(guard.iter().filter(|m| m.track == track).cloned().collect())
    }

    async fn delete_module(&self, id: ModuleId) -> Result<(), StorageError> {
        let mut guard = self.modules.lock().map_err(poisoned)?;
        let before = guard.len();
        guard.retain(|m| m.id != id);
        if guard.len() == before {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub tasks: Arc<dyn TaskRepository>,
    pub activities: Arc<dyn ActivityRepository>,
    pub modules: Arc<dyn ModuleRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let tasks: Arc<dyn TaskRepository> = Arc::new(repo.clone());
        let activities: Arc<dyn ActivityRepository> = Arc::new(repo.clone());
        let modules: Arc<dyn ModuleRepository> = Arc::new(repo);
        Self {
            tasks,
            activities,
            modules,
        }
    }
}
