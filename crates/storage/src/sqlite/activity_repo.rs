use vault_core::model::{ActivityId, ActivityRecord, CertTrack};

use super::{SqliteRepository, mapping::map_activity_row};
use crate::repository::{ActivityRepository, StorageError};

#[async_trait::async_trait]
impl ActivityRepository for SqliteRepository {
    async fn append_activity(&self, activity: &ActivityRecord) -> Result<ActivityId, StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO user_activity (
                    cert_id, drill_id, domain, score, duration_secs, recorded_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )
        .bind(activity.track.cert_id())
        .bind(activity.drill_id.as_str())
        .bind(activity.domain.clone())
        .bind(i64::from(activity.score))
        .bind(i64::from(activity.duration_secs))
        .bind(activity.recorded_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let id = u64::try_from(res.last_insert_rowid())
            .map_err(|_| StorageError::Serialization("activity id sign overflow".into()))?;
        Ok(ActivityId::new(id))
    }

    async fn activities_for_track(
        &self,
        track: CertTrack,
    ) -> Result<Vec<ActivityRecord>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, cert_id, drill_id, domain, score, duration_secs, recorded_at
                FROM user_activity
                WHERE cert_id = ?1
                ORDER BY recorded_at ASC, id ASC
            ",
        )
        .bind(track.cert_id())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_activity_row(&row)?);
        }
        Ok(out)
    }
}
