use vault_core::model::{CertTrack, ModuleId, NewModule, StudyModule};

use super::{
    SqliteRepository,
    mapping::{map_module_row, module_id_to_i64},
};
use crate::repository::{ModuleRepository, StorageError};

const MODULE_COLUMNS: &str = "id, cert_id, title, domain, kind, description, config, asset_path";

fn conn(e: sqlx::Error) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait::async_trait]
impl ModuleRepository for SqliteRepository {
    async fn create_module(&self, module: NewModule) -> Result<StudyModule, StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO study_modules (
                    cert_id, title, domain, kind, description, config, asset_path
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
        )
        .bind(module.track.cert_id())
        .bind(module.title.clone())
        .bind(module.domain.clone())
        .bind(module.kind.as_str())
        .bind(module.description.clone())
        .bind(module.config.clone())
        .bind(module.asset_path.clone())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        let id = u64::try_from(res.last_insert_rowid())
            .map_err(|_| StorageError::Serialization("module id sign overflow".into()))?;
        Ok(module.into_module(ModuleId::new(id)))
    }

    async fn get_module(&self, id: ModuleId) -> Result<Option<StudyModule>, StorageError> {
        let row = sqlx::query(&format!(
            "SELECT {MODULE_COLUMNS} FROM study_modules WHERE id = ?1"
        ))
        .bind(module_id_to_i64(id)?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;
        row.as_ref().map(map_module_row).transpose()
    }

    async fn modules_for_track(&self, track: CertTrack) -> Result<Vec<StudyModule>, StorageError> {
        let rows = sqlx::query(&format!(
            "SELECT {MODULE_COLUMNS} FROM study_modules WHERE cert_id = ?1 ORDER BY id ASC"
        ))
        .bind(track.cert_id())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_module_row(&row)?);
        }
        Ok(out)
    }

    async fn delete_module(&self, id: ModuleId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM study_modules WHERE id = ?1")
            .bind(module_id_to_i64(id)?)
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
