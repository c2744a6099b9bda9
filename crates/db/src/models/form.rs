use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

use super::form_field::{CreateFormField, FieldResponse};

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[sqlx(type_name = "form_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FormStatus {
    #[default]
    Draft,
    Published,
}

/// A form. `slug` and `published_at` are both null while the form is a
/// draft and both set once it is published.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Form {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: FormStatus,
    pub slug: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Form plus per-form counts, used by the list endpoint.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct FormSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    #[ts(flatten)]
    pub form: Form,
    pub field_count: i64,
    pub submission_count: i64,
}

impl std::ops::Deref for FormSummary {
    type Target = Form;
    fn deref(&self) -> &Self::Target {
        &self.form
    }
}

/// Form plus its fields in display order.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct FormWithFields {
    #[serde(flatten)]
    #[ts(flatten)]
    pub form: Form,
    pub fields: Vec<FieldResponse>,
}

impl std::ops::Deref for FormWithFields {
    type Target = Form;
    fn deref(&self) -> &Self::Target {
        &self.form
    }
}

/// Request body for creating a form together with its initial fields.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateForm {
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Vec<CreateFormField>,
}

/// Request body for replacing a draft form's metadata and field set.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct UpdateForm {
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Vec<CreateFormField>,
}

const FORM_COLUMNS: &str =
    "id, title, description, status, slug, published_at, created_at, updated_at";

impl Form {
    pub async fn create<'e, E>(
        executor: E,
        id: Uuid,
        title: &str,
        description: Option<&str>,
    ) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Form>(&format!(
            "INSERT INTO forms (id, title, description) VALUES ($1, $2, $3)
             RETURNING {FORM_COLUMNS}"
        ))
        .bind(id)
        .bind(title)
        .bind(description)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Form>(&format!("SELECT {FORM_COLUMNS} FROM forms WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Look up a published form by its public slug.
    pub async fn find_by_slug(pool: &SqlitePool, slug: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Form>(&format!(
            "SELECT {FORM_COLUMNS} FROM forms WHERE slug = $1 AND status = 'published'"
        ))
        .bind(slug)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_all_summaries(
        pool: &SqlitePool,
        status: Option<FormStatus>,
    ) -> Result<Vec<FormSummary>, sqlx::Error> {
        let base = format!(
            "SELECT {FORM_COLUMNS},
               (SELECT COUNT(*) FROM form_fields ff WHERE ff.form_id = forms.id) AS field_count,
               (SELECT COUNT(*) FROM form_submissions fs WHERE fs.form_id = forms.id) AS submission_count
             FROM forms"
        );
        match status {
            Some(status) => {
                sqlx::query_as::<_, FormSummary>(&format!(
                    "{base} WHERE status = $1 ORDER BY created_at DESC"
                ))
                .bind(status)
                .fetch_all(pool)
                .await
            }
            None => {
                sqlx::query_as::<_, FormSummary>(&format!("{base} ORDER BY created_at DESC"))
                    .fetch_all(pool)
                    .await
            }
        }
    }

    pub async fn update_metadata<'e, E>(
        executor: E,
        id: Uuid,
        title: &str,
        description: Option<&str>,
    ) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Form>(&format!(
            "UPDATE forms
             SET title = $2, description = $3, updated_at = datetime('now', 'subsec')
             WHERE id = $1
             RETURNING {FORM_COLUMNS}"
        ))
        .bind(id)
        .bind(title)
        .bind(description)
        .fetch_one(executor)
        .await
    }

    /// Conditional draft -> published transition. Returns the number of rows
    /// updated; zero means the form was no longer a draft, so at most one
    /// concurrent publish can win.
    pub async fn mark_published(
        pool: &SqlitePool,
        id: Uuid,
        slug: &str,
        published_at: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE forms
             SET status = 'published', slug = $2, published_at = $3,
                 updated_at = datetime('now', 'subsec')
             WHERE id = $1 AND status = 'draft'",
        )
        .bind(id)
        .bind(slug)
        .bind(published_at)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete<'e, E>(executor: E, id: Uuid) -> Result<u64, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM forms WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DBService;

    #[tokio::test]
    async fn test_create_and_find_roundtrip() {
        let db = DBService::new_in_memory().await.unwrap();
        let id = Uuid::new_v4();

        let created = Form::create(&db.pool, id, "Feedback", Some("A survey"))
            .await
            .unwrap();
        assert_eq!(created.id, id);
        assert_eq!(created.status, FormStatus::Draft);
        assert!(created.slug.is_none());
        assert!(created.published_at.is_none());

        let found = Form::find_by_id(&db.pool, id).await.unwrap().unwrap();
        assert_eq!(found.title, "Feedback");
        assert_eq!(found.description.as_deref(), Some("A survey"));
    }

    #[tokio::test]
    async fn test_mark_published_is_conditional() {
        let db = DBService::new_in_memory().await.unwrap();
        let id = Uuid::new_v4();
        Form::create(&db.pool, id, "Feedback", None).await.unwrap();

        let slug = id.to_string();
        let first = Form::mark_published(&db.pool, id, &slug, Utc::now())
            .await
            .unwrap();
        assert_eq!(first, 1);

        // Second attempt no longer matches `status = 'draft'`.
        let second = Form::mark_published(&db.pool, id, &slug, Utc::now())
            .await
            .unwrap();
        assert_eq!(second, 0);
    }

    #[tokio::test]
    async fn test_find_by_slug_requires_published() {
        let db = DBService::new_in_memory().await.unwrap();
        let id = Uuid::new_v4();
        Form::create(&db.pool, id, "Feedback", None).await.unwrap();

        assert!(
            Form::find_by_slug(&db.pool, &id.to_string())
                .await
                .unwrap()
                .is_none()
        );

        Form::mark_published(&db.pool, id, &id.to_string(), Utc::now())
            .await
            .unwrap();

        let found = Form::find_by_slug(&db.pool, &id.to_string())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, id);
        assert_eq!(found.status, FormStatus::Published);
    }
}
