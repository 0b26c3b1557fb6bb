use std::sync::Arc;

use storage::repository::{ModuleRepository, StorageError};
use vault_core::model::{
    CertTrack, ConfigFault, ModuleDrill, ModuleGroup, ModuleId, NewModule, StudyModule,
    group_by_domain,
};

use crate::error::VaultError;

/// The study-module vault: ingestion, domain listing and quiz loading.
#[derive(Clone)]
pub struct ModuleService {
    modules: Arc<dyn ModuleRepository>,
}

impl ModuleService {
    #[must_use]
    pub fn new(modules: Arc<dyn ModuleRepository>) -> Self {
        Self { modules }
    }

    /// Stores a module as given. Quiz configs are not parsed until played.
    ///
    /// # Errors
    ///
    /// Returns `VaultError::Storage` if the module cannot be stored.
    pub async fn ingest(&self, module: NewModule) -> Result<StudyModule, VaultError> {
        let module = self.modules.create_module(module).await?;
        tracing::info!(
            module_id = %module.id,
            track = %module.track,
            kind = %module.kind,
            domain = %module.domain,
            "module ingested"
        );
        Ok(module)
    }

    /// The track's modules grouped by blueprint domain.
    ///
    /// # Errors
    ///
    /// Returns `VaultError::Storage` for backend failures.
    pub async fn list_modules(&self, track: CertTrack) -> Result<Vec<ModuleGroup>, VaultError> {
        let modules = self.modules.modules_for_track(track).await?;
        Ok(group_by_domain(track, modules))
    }

    /// # Errors
    ///
    /// Returns `VaultError::UnknownModule` if no module has this id.
    pub async fn get(&self, id: ModuleId) -> Result<StudyModule, VaultError> {
        self.modules
            .get_module(id)
            .await?
            .ok_or(VaultError::UnknownModule(id))
    }

    /// Loads the drill behind a quiz module.
    ///
    /// A corrupt config still yields a playable placeholder; the fault is
    /// logged and returned alongside it.
    ///
    /// # Errors
    ///
    /// Returns `VaultError::UnknownModule` for a missing module and
    /// `VaultError::Module` if it is not a quiz.
    pub async fn drill_for_module(
        &self,
        id: ModuleId,
    ) -> Result<(StudyModule, ModuleDrill), VaultError> {
        let module = self.get(id).await?;
        let loaded = module.quiz_drill()?;
        match &loaded.fault {
            Some(ConfigFault::Corrupt(reason)) => {
                tracing::warn!(module_id = %id, %reason, "quiz config corrupt; serving placeholder");
            }
            Some(ConfigFault::Missing) => {
                tracing::warn!(module_id = %id, "quiz module has no config");
            }
            None => {}
        }
        Ok((module, loaded))
    }

    /// # Errors
    ///
    /// Returns `VaultError::UnknownModule` if no module has this id.
    pub async fn delete(&self, id: ModuleId) -> Result<(), VaultError> {
        match self.modules.delete_module(id).await {
            Err(StorageError::NotFound) => Err(VaultError::UnknownModule(id)),
            other => Ok(other?),
        }
    }
}
