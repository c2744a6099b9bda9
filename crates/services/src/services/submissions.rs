//! Submission validation and storage. A raw payload maps field ids to
//! arbitrary JSON values; fields are validated in display order and the
//! first failure rejects the whole submission.

use db::models::{
    form::{Form, FormStatus},
    form_field::FormField,
    form_submission::{FormSubmission, SubmissionResponse},
};
use serde_json::{Map, Value};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;
use utils::response::Paginated;
use uuid::Uuid;

use super::field_types;

pub const DEFAULT_PER_PAGE: i64 = 20;
pub const MAX_PER_PAGE: i64 = 100;

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("form not found")]
    NotFound,
    #[error("cannot submit to unpublished form")]
    NotPublished,
    #[error("{field_label} {message}")]
    Invalid {
        field_id: Uuid,
        field_label: String,
        message: String,
    },
    #[error("failed to serialize submission data: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub struct SubmissionService;

impl SubmissionService {
    /// Validate and store one submission. Deliberately not idempotent:
    /// every accepted payload creates a new row.
    pub async fn create(
        pool: &SqlitePool,
        form_id: Uuid,
        payload: &Map<String, Value>,
    ) -> Result<FormSubmission, SubmissionError> {
        let form = Form::find_by_id(pool, form_id)
            .await?
            .ok_or(SubmissionError::NotFound)?;
        if form.status != FormStatus::Published {
            return Err(SubmissionError::NotPublished);
        }

        let fields = FormField::find_by_form_id(pool, form_id).await?;

        let mut data = Map::with_capacity(fields.len());
        for field in &fields {
            let raw = payload.get(&field.id.to_string());
            match field_types::validate_value(field, raw) {
                Ok(value) => {
                    data.insert(field.id.to_string(), value);
                }
                Err(message) => {
                    return Err(SubmissionError::Invalid {
                        field_id: field.id,
                        field_label: field.label.clone(),
                        message,
                    });
                }
            }
        }

        let serialized = serde_json::to_string(&Value::Object(data))?;
        let submission = FormSubmission::create(pool, Uuid::new_v4(), form_id, &serialized).await?;

        info!(form_id = %form_id, submission_id = %submission.id, "submission stored");

        Ok(submission)
    }

    pub async fn list(
        pool: &SqlitePool,
        form_id: Uuid,
        page: Option<i64>,
        per_page: Option<i64>,
    ) -> Result<Paginated<SubmissionResponse>, SubmissionError> {
        Form::find_by_id(pool, form_id)
            .await?
            .ok_or(SubmissionError::NotFound)?;

        let page = page.unwrap_or(1).max(1);
        let per_page = per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE);
        let offset = (page - 1) * per_page;

        let total = FormSubmission::count_by_form_id(pool, form_id).await?;
        let items = FormSubmission::find_by_form_id(pool, form_id, per_page, offset).await?;

        Ok(Paginated::new(
            items.into_iter().map(SubmissionResponse::from).collect(),
            total,
            page,
            per_page,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use db::{DBService, models::form_field::FieldType};
    use serde_json::json;

    use crate::services::publication::PublicationService;

    struct FieldSpec {
        field_type: FieldType,
        label: &'static str,
        required: bool,
        options: Option<&'static str>,
    }

    async fn published_form(db: &DBService, specs: &[FieldSpec]) -> (Form, Vec<FormField>) {
        let form = Form::create(&db.pool, Uuid::new_v4(), "Survey", None)
            .await
            .unwrap();
        let mut fields = Vec::new();
        for (index, spec) in specs.iter().enumerate() {
            let field = FormField::create(
                &db.pool,
                Uuid::new_v4(),
                form.id,
                spec.field_type,
                spec.label,
                None,
                spec.required,
                spec.options,
                index as i32 + 1,
            )
            .await
            .unwrap();
            fields.push(field);
        }
        let form = PublicationService::publish(&db.pool, form.id).await.unwrap();
        (form, fields)
    }

    fn payload(entries: &[(Uuid, Value)]) -> Map<String, Value> {
        entries
            .iter()
            .map(|(id, value)| (id.to_string(), value.clone()))
            .collect()
    }

    const COLORS: &str = r#"[{"label":"Red","value":"red"},{"label":"Blue","value":"blue"}]"#;

    #[tokio::test]
    async fn test_missing_required_field_rejected_and_nothing_stored() {
        let db = DBService::new_in_memory().await.unwrap();
        let (form, fields) = published_form(
            &db,
            &[FieldSpec {
                field_type: FieldType::Text,
                label: "Name",
                required: true,
                options: None,
            }],
        )
        .await;

        let result = SubmissionService::create(&db.pool, form.id, &Map::new()).await;
        match result {
            Err(SubmissionError::Invalid { field_id, field_label, message }) => {
                assert_eq!(field_id, fields[0].id);
                assert_eq!(field_label, "Name");
                assert_eq!(message, "is required");
            }
            other => panic!("expected validation error, got {other:?}"),
        }

        assert_eq!(
            FormSubmission::count_by_form_id(&db.pool, form.id).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_accepted_values_stored_verbatim() {
        let db = DBService::new_in_memory().await.unwrap();
        let (form, fields) = published_form(
            &db,
            &[
                FieldSpec {
                    field_type: FieldType::Text,
                    label: "Name",
                    required: true,
                    options: None,
                },
                FieldSpec {
                    field_type: FieldType::Checkbox,
                    label: "Colors",
                    required: false,
                    options: Some(COLORS),
                },
                FieldSpec {
                    field_type: FieldType::Date,
                    label: "Date",
                    required: false,
                    options: None,
                },
            ],
        )
        .await;

        let submission = SubmissionService::create(
            &db.pool,
            form.id,
            &payload(&[
                (fields[0].id, json!("Alice")),
                (fields[1].id, json!(["blue", "red"])),
            ]),
        )
        .await
        .unwrap();

        let listed = SubmissionService::list(&db.pool, form.id, None, None)
            .await
            .unwrap();
        assert_eq!(listed.total, 1);
        assert_eq!(listed.items[0].id, submission.id);

        let data = &listed.items[0].data;
        assert_eq!(data[fields[0].id.to_string()], json!("Alice"));
        // Selection order is preserved.
        assert_eq!(data[fields[1].id.to_string()], json!(["blue", "red"]));
        // Absent optional values are normalized to null.
        assert_eq!(data[fields[2].id.to_string()], Value::Null);
    }

    #[tokio::test]
    async fn test_unknown_option_rejected_despite_other_valid_fields() {
        let db = DBService::new_in_memory().await.unwrap();
        let (form, fields) = published_form(
            &db,
            &[
                FieldSpec {
                    field_type: FieldType::Text,
                    label: "Name",
                    required: true,
                    options: None,
                },
                FieldSpec {
                    field_type: FieldType::Radio,
                    label: "Color",
                    required: false,
                    options: Some(COLORS),
                },
            ],
        )
        .await;

        let result = SubmissionService::create(
            &db.pool,
            form.id,
            &payload(&[
                (fields[0].id, json!("Alice")),
                (fields[1].id, json!("green")),
            ]),
        )
        .await;

        match result {
            Err(SubmissionError::Invalid { field_label, .. }) => {
                assert_eq!(field_label, "Color");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        assert_eq!(
            FormSubmission::count_by_form_id(&db.pool, form.id).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_submitting_to_draft_is_forbidden() {
        let db = DBService::new_in_memory().await.unwrap();
        let form = Form::create(&db.pool, Uuid::new_v4(), "Draft", None)
            .await
            .unwrap();

        let result = SubmissionService::create(&db.pool, form.id, &Map::new()).await;
        assert!(matches!(result, Err(SubmissionError::NotPublished)));
    }

    #[tokio::test]
    async fn test_resubmitting_identical_data_creates_second_row() {
        let db = DBService::new_in_memory().await.unwrap();
        let (form, fields) = published_form(
            &db,
            &[FieldSpec {
                field_type: FieldType::Text,
                label: "Name",
                required: true,
                options: None,
            }],
        )
        .await;

        let body = payload(&[(fields[0].id, json!("Alice"))]);
        let first = SubmissionService::create(&db.pool, form.id, &body).await.unwrap();
        let second = SubmissionService::create(&db.pool, form.id, &body).await.unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(
            FormSubmission::count_by_form_id(&db.pool, form.id).await.unwrap(),
            2
        );
    }
}
