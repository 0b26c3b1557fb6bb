use tokio::sync::broadcast;
use vault_core::model::{DrillId, NewTask, RemediationTask, TaskId, TaskStatus};

use super::{
    SqliteRepository,
    mapping::{map_task_row, ser, task_id_from_text, task_id_to_text},
};
use crate::repository::{StorageError, TaskEvent, TaskRepository};

const TASK_COLUMNS: &str =
    "id, title, status, origin, domain, drill_id, priority, score, cert_id, metadata";

fn conn(e: sqlx::Error) -> StorageError {
    StorageError::Connection(e.to_string())
}

impl SqliteRepository {
    async fn fetch_task(&self, id: TaskId) -> Result<Option<RemediationTask>, StorageError> {
        let row = sqlx::query(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"))
            .bind(task_id_to_text(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;
        row.as_ref().map(map_task_row).transpose()
    }
}

#[async_trait::async_trait]
impl TaskRepository for SqliteRepository {
    async fn create_task(&self, task: NewTask) -> Result<RemediationTask, StorageError> {
        let task = task.into_task(TaskId::generate());
        let metadata = serde_json::to_string(&task.metadata).map_err(ser)?;

        sqlx::query(
            r"
                INSERT INTO tasks (
                    id, title, status, origin, domain, drill_id,
                    priority, score, cert_id, metadata
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ",
        )
        .bind(task_id_to_text(task.id))
        .bind(task.title.clone())
        .bind(task.status.as_str())
        .bind(task.origin.as_str())
        .bind(task.domain.clone())
        .bind(task.drill_id.as_ref().map(|d| d.as_str().to_owned()))
        .bind(i64::from(task.priority))
        .bind(task.score.map(i64::from))
        .bind(task.track.map(|t| t.cert_id()))
        .bind(metadata)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => StorageError::Conflict,
            other => conn(other),
        })?;

        self.events.publish(TaskEvent::Created(task.clone()));
        Ok(task)
    }

    async fn get_task(&self, id: TaskId) -> Result<Option<RemediationTask>, StorageError> {
        self.fetch_task(id).await
    }

    async fn list_tasks(&self) -> Result<Vec<RemediationTask>, StorageError> {
        let rows = sqlx::query(&format!("SELECT {TASK_COLUMNS} FROM tasks ORDER BY seq ASC"))
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_task_row(&row)?);
        }
        Ok(out)
    }

    async fn open_tasks_for_drill(
        &self,
        drill_id: &DrillId,
    ) -> Result<Vec<RemediationTask>, StorageError> {
        let rows = sqlx::query(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks
             WHERE drill_id = ?1 AND status <> 'COMPLETED'
             ORDER BY seq ASC"
        ))
        .bind(drill_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_task_row(&row)?);
        }
        Ok(out)
    }

    async fn update_status(
        &self,
        id: TaskId,
        status: TaskStatus,
    ) -> Result<RemediationTask, StorageError> {
        let res = sqlx::query("UPDATE tasks SET status = ?1 WHERE id = ?2")
            .bind(status.as_str())
            .bind(task_id_to_text(id))
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        let task = self.fetch_task(id).await?.ok_or(StorageError::NotFound)?;
        self.events.publish(TaskEvent::Updated(task.clone()));
        Ok(task)
    }

    async fn delete_task(&self, id: TaskId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM tasks WHERE id = ?1")
            .bind(task_id_to_text(id))
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        self.events.publish(TaskEvent::Deleted(id));
        Ok(())
    }

    async fn purge_completed(&self) -> Result<u64, StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        let ids: Vec<String> =
            sqlx::query_scalar("SELECT id FROM tasks WHERE status = 'COMPLETED'")
                .fetch_all(&mut *tx)
                .await
                .map_err(conn)?;

        let res = sqlx::query("DELETE FROM tasks WHERE status = 'COMPLETED'")
            .execute(&mut *tx)
            .await
            .map_err(conn)?;

        tx.commit().await.map_err(conn)?;

        for raw in &ids {
            self.events.publish(TaskEvent::Deleted(task_id_from_text(raw)?));
        }
        Ok(res.rows_affected())
    }

    fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.events.subscribe()
    }
}
