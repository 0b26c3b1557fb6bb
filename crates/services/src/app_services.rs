use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::board_service::BoardService;
use crate::dashboard_service::DashboardService;
use crate::drills::DrillService;
use crate::error::AppServicesError;
use crate::module_service::ModuleService;
use crate::remediation_service::RemediationEmitter;

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    storage: Storage,
    emitter: Arc<RemediationEmitter>,
    drills: Arc<DrillService>,
    dashboard: Arc<DashboardService>,
    board: Arc<BoardService>,
    modules: Arc<ModuleService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(storage, clock))
    }

    /// Build services over a throwaway in-memory store.
    #[must_use]
    pub fn in_memory(clock: Clock) -> Self {
        Self::from_storage(Storage::in_memory(), clock)
    }

    #[must_use]
    pub fn from_storage(storage: Storage, clock: Clock) -> Self {
        let emitter = Arc::new(RemediationEmitter::new(clock, Arc::clone(&storage.tasks)));
        let drills = Arc::new(DrillService::new(
            clock,
            Arc::clone(&emitter),
            Arc::clone(&storage.activities),
        ));
        let dashboard = Arc::new(DashboardService::new(clock, Arc::clone(&storage.activities)));
        let board = Arc::new(BoardService::new(Arc::clone(&storage.tasks)));
        let modules = Arc::new(ModuleService::new(Arc::clone(&storage.modules)));

        Self {
            storage,
            emitter,
            drills,
            dashboard,
            board,
            modules,
        }
    }

    /// Replace the drill runner, e.g. to change the auto-advance delay.
    #[must_use]
    pub fn with_drills(mut self, configure: impl FnOnce(DrillService) -> DrillService) -> Self {
        self.drills = Arc::new(configure((*self.drills).clone()));
        self
    }

    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    #[must_use]
    pub fn emitter(&self) -> Arc<RemediationEmitter> {
        Arc::clone(&self.emitter)
    }

    #[must_use]
    pub fn drills(&self) -> Arc<DrillService> {
        Arc::clone(&self.drills)
    }

    #[must_use]
    pub fn dashboard(&self) -> Arc<DashboardService> {
        Arc::clone(&self.dashboard)
    }

    #[must_use]
    pub fn board(&self) -> Arc<BoardService> {
        Arc::clone(&self.board)
    }

    #[must_use]
    pub fn modules(&self) -> Arc<ModuleService> {
        Arc::clone(&self.modules)
    }
}
