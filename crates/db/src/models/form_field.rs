use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use tracing::warn;
use ts_rs::TS;
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display,
)]
#[sqlx(type_name = "field_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FieldType {
    Text,
    Textarea,
    Date,
    Radio,
    Checkbox,
}

impl FieldType {
    /// Placeholder text only makes sense for free-input fields.
    pub fn supports_placeholder(&self) -> bool {
        matches!(self, FieldType::Text | FieldType::Textarea | FieldType::Date)
    }

    /// Choice fields carry an options list; all others must not.
    pub fn supports_options(&self) -> bool {
        matches!(self, FieldType::Radio | FieldType::Checkbox)
    }
}

/// One selectable choice of a radio or checkbox field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct FieldOption {
    pub label: String,
    pub value: String,
}

/// A field definition. `options` holds a JSON-serialized `Vec<FieldOption>`
/// for choice fields and is null otherwise.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct FormField {
    pub id: Uuid,
    pub form_id: Uuid,
    pub field_type: FieldType,
    pub label: String,
    pub placeholder: Option<String>,
    pub required: bool,
    pub options: Option<String>,
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FormField {
    /// Parse the stored options JSON. Malformed stored JSON degrades to an
    /// empty list so read paths stay available.
    pub fn parsed_options(&self) -> Vec<FieldOption> {
        let Some(raw) = self.options.as_deref() else {
            return Vec::new();
        };
        match serde_json::from_str(raw) {
            Ok(options) => options,
            Err(error) => {
                warn!(
                    field_id = %self.id,
                    %error,
                    "ignoring malformed field options"
                );
                Vec::new()
            }
        }
    }
}

/// Field definition as exposed over the API, with options parsed.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct FieldResponse {
    pub id: Uuid,
    pub form_id: Uuid,
    pub field_type: FieldType,
    pub label: String,
    pub placeholder: Option<String>,
    pub required: bool,
    pub options: Option<Vec<FieldOption>>,
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<FormField> for FieldResponse {
    fn from(field: FormField) -> Self {
        let options = field
            .field_type
            .supports_options()
            .then(|| field.parsed_options());
        Self {
            id: field.id,
            form_id: field.form_id,
            field_type: field.field_type,
            label: field.label,
            placeholder: field.placeholder,
            required: field.required,
            options,
            position: field.position,
            created_at: field.created_at,
            updated_at: field.updated_at,
        }
    }
}

/// Request body for adding a field (also the per-field shape inside form
/// create/replace requests).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateFormField {
    pub field_type: FieldType,
    pub label: String,
    pub placeholder: Option<String>,
    #[serde(default)]
    pub required: bool,
    pub options: Option<Vec<FieldOption>>,
    pub position: Option<i32>,
}

/// Request body for replacing a field's definition.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct UpdateFormField {
    pub field_type: FieldType,
    pub label: String,
    pub placeholder: Option<String>,
    #[serde(default)]
    pub required: bool,
    pub options: Option<Vec<FieldOption>>,
    pub position: Option<i32>,
}

const FIELD_COLUMNS: &str = "id, form_id, field_type, label, placeholder, required, options, \
                             position, created_at, updated_at";

impl FormField {
    #[allow(clippy::too_many_arguments)]
    pub async fn create<'e, E>(
        executor: E,
        id: Uuid,
        form_id: Uuid,
        field_type: FieldType,
        label: &str,
        placeholder: Option<&str>,
        required: bool,
        options: Option<&str>,
        position: i32,
    ) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, FormField>(&format!(
            "INSERT INTO form_fields (id, form_id, field_type, label, placeholder, required, options, position)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {FIELD_COLUMNS}"
        ))
        .bind(id)
        .bind(form_id)
        .bind(field_type)
        .bind(label)
        .bind(placeholder)
        .bind(required)
        .bind(options)
        .bind(position)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, FormField>(&format!(
            "SELECT {FIELD_COLUMNS} FROM form_fields WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// A form's fields in display (and validation) order.
    pub async fn find_by_form_id(
        pool: &SqlitePool,
        form_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, FormField>(&format!(
            "SELECT {FIELD_COLUMNS} FROM form_fields
             WHERE form_id = $1
             ORDER BY position ASC, created_at ASC"
        ))
        .bind(form_id)
        .fetch_all(pool)
        .await
    }

    pub async fn count_by_form_id(pool: &SqlitePool, form_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM form_fields WHERE form_id = $1")
            .bind(form_id)
            .fetch_one(pool)
            .await
    }

    /// Next free position at the end of the form.
    pub async fn next_position(pool: &SqlitePool, form_id: Uuid) -> Result<i32, sqlx::Error> {
        sqlx::query_scalar::<_, i32>(
            "SELECT COALESCE(MAX(position), 0) + 1 FROM form_fields WHERE form_id = $1",
        )
        .bind(form_id)
        .fetch_one(pool)
        .await
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn update<'e, E>(
        executor: E,
        id: Uuid,
        field_type: FieldType,
        label: &str,
        placeholder: Option<&str>,
        required: bool,
        options: Option<&str>,
        position: i32,
    ) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, FormField>(&format!(
            "UPDATE form_fields
             SET field_type = $2, label = $3, placeholder = $4, required = $5,
                 options = $6, position = $7, updated_at = datetime('now', 'subsec')
             WHERE id = $1
             RETURNING {FIELD_COLUMNS}"
        ))
        .bind(id)
        .bind(field_type)
        .bind(label)
        .bind(placeholder)
        .bind(required)
        .bind(options)
        .bind(position)
        .fetch_one(executor)
        .await
    }

    pub async fn delete<'e, E>(executor: E, id: Uuid) -> Result<u64, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM form_fields WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete_by_form_id<'e, E>(executor: E, form_id: Uuid) -> Result<u64, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM form_fields WHERE form_id = $1")
            .bind(form_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
