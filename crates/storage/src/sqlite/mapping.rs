use sqlx::Row;
use vault_core::model::{
    ActivityId, ActivityRecord, CertTrack, DrillId, ModuleId, ModuleKind, RemediationTask,
    StudyModule, TaskId, TaskOrigin, TaskStatus,
};

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn score_from_i64(field: &'static str, v: i64) -> Result<u8, StorageError> {
    u8::try_from(v)
        .ok()
        .filter(|s| *s <= 100)
        .ok_or_else(|| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn task_id_to_text(id: TaskId) -> String {
    id.value().to_string()
}

pub(crate) fn task_id_from_text(raw: &str) -> Result<TaskId, StorageError> {
    raw.parse::<TaskId>().map_err(ser)
}

pub(crate) fn map_task_row(row: &sqlx::sqlite::SqliteRow) -> Result<RemediationTask, StorageError> {
    let status: String = row.try_get("status").map_err(ser)?;
    let origin: String = row.try_get("origin").map_err(ser)?;
    let priority: i64 = row.try_get("priority").map_err(ser)?;
    let metadata: String = row.try_get("metadata").map_err(ser)?;

    Ok(RemediationTask {
        id: task_id_from_text(&row.try_get::<String, _>("id").map_err(ser)?)?,
        title: row.try_get("title").map_err(ser)?,
        status: status.parse::<TaskStatus>().map_err(ser)?,
        origin: origin.parse::<TaskOrigin>().map_err(ser)?,
        domain: row.try_get("domain").map_err(ser)?,
        drill_id: row
            .try_get::<Option<String>, _>("drill_id")
            .map_err(ser)?
            .map(DrillId::new),
        priority: i32::try_from(priority)
            .map_err(|_| StorageError::Serialization(format!("invalid priority: {priority}")))?,
        score: row
            .try_get::<Option<i64>, _>("score")
            .map_err(ser)?
            .map(|s| score_from_i64("score", s))
            .transpose()?,
        track: row
            .try_get::<Option<String>, _>("cert_id")
            .map_err(ser)?
            .map(|c| CertTrack::from_cert_id(&c).map_err(ser))
            .transpose()?,
        metadata: serde_json::from_str(&metadata).map_err(ser)?,
    })
}

pub(crate) fn map_activity_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<ActivityRecord, StorageError> {
    let id: i64 = row.try_get("id").map_err(ser)?;
    let cert_id: String = row.try_get("cert_id").map_err(ser)?;
    let duration: i64 = row.try_get("duration_secs").map_err(ser)?;

    Ok(ActivityRecord {
        id: Some(ActivityId::new(u64::try_from(id).map_err(|_| {
            StorageError::Serialization(format!("invalid activity id: {id}"))
        })?)),
        track: CertTrack::from_cert_id(&cert_id).map_err(ser)?,
        drill_id: DrillId::new(row.try_get::<String, _>("drill_id").map_err(ser)?),
        domain: row.try_get("domain").map_err(ser)?,
        score: score_from_i64("score", row.try_get("score").map_err(ser)?)?,
        duration_secs: u32::try_from(duration).map_err(|_| {
            StorageError::Serialization(format!("invalid duration_secs: {duration}"))
        })?,
        recorded_at: row.try_get("recorded_at").map_err(ser)?,
    })
}

pub(crate) fn module_id_to_i64(id: ModuleId) -> Result<i64, StorageError> {
    i64::try_from(id.value())
        .map_err(|_| StorageError::Serialization(format!("invalid module id: {id}")))
}

pub(crate) fn map_module_row(row: &sqlx::sqlite::SqliteRow) -> Result<StudyModule, StorageError> {
    let id: i64 = row.try_get("id").map_err(ser)?;
    let cert_id: String = row.try_get("cert_id").map_err(ser)?;
    let kind: String = row.try_get("kind").map_err(ser)?;

    Ok(StudyModule {
        id: ModuleId::new(
            u64::try_from(id)
                .map_err(|_| StorageError::Serialization(format!("invalid module id: {id}")))?,
        ),
        track: CertTrack::from_cert_id(&cert_id).map_err(ser)?,
        title: row.try_get("title").map_err(ser)?,
        domain: row.try_get("domain").map_err(ser)?,
        kind: kind.parse::<ModuleKind>().map_err(ser)?,
        description: row.try_get("description").map_err(ser)?,
        config: row.try_get("config").map_err(ser)?,
        asset_path: row.try_get("asset_path").map_err(ser)?,
    })
}
