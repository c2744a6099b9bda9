use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use tracing::warn;
use ts_rs::TS;
use uuid::Uuid;

/// One completed form fill. `data` holds a JSON object mapping field id to
/// the normalized submitted value; rows are never updated after creation.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct FormSubmission {
    pub id: Uuid,
    pub form_id: Uuid,
    pub data: String,
    pub submitted_at: DateTime<Utc>,
}

impl FormSubmission {
    /// Parse the stored data JSON. Malformed stored JSON degrades to null so
    /// listing stays available.
    pub fn parsed_data(&self) -> Value {
        match serde_json::from_str(&self.data) {
            Ok(data) => data,
            Err(error) => {
                warn!(
                    submission_id = %self.id,
                    %error,
                    "ignoring malformed submission data"
                );
                Value::Null
            }
        }
    }
}

/// Submission as exposed over the API, with data parsed.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct SubmissionResponse {
    pub id: Uuid,
    pub form_id: Uuid,
    pub data: Value,
    pub submitted_at: DateTime<Utc>,
}

impl From<FormSubmission> for SubmissionResponse {
    fn from(submission: FormSubmission) -> Self {
        let data = submission.parsed_data();
        Self {
            id: submission.id,
            form_id: submission.form_id,
            data,
            submitted_at: submission.submitted_at,
        }
    }
}

const SUBMISSION_COLUMNS: &str = "id, form_id, data, submitted_at";

impl FormSubmission {
    pub async fn create<'e, E>(
        executor: E,
        id: Uuid,
        form_id: Uuid,
        data: &str,
    ) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, FormSubmission>(&format!(
            "INSERT INTO form_submissions (id, form_id, data) VALUES ($1, $2, $3)
             RETURNING {SUBMISSION_COLUMNS}"
        ))
        .bind(id)
        .bind(form_id)
        .bind(data)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_form_id(
        pool: &SqlitePool,
        form_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, FormSubmission>(&format!(
            "SELECT {SUBMISSION_COLUMNS} FROM form_submissions
             WHERE form_id = $1
             ORDER BY submitted_at DESC
             LIMIT $2 OFFSET $3"
        ))
        .bind(form_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    pub async fn count_by_form_id(pool: &SqlitePool, form_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM form_submissions WHERE form_id = $1")
            .bind(form_id)
            .fetch_one(pool)
            .await
    }
}
