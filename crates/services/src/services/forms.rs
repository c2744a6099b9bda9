//! Form CRUD policy: metadata validation, draft-only mutation guards, and
//! the transactional create/replace/copy operations.

use db::models::{
    form::{CreateForm, Form, FormStatus, FormSummary, FormWithFields, UpdateForm},
    form_field::{CreateFormField, FieldResponse, FormField},
};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use super::field_types::{self, NormalizedDefinition};

pub const MAX_TITLE_LEN: usize = 255;
pub const MAX_DESCRIPTION_LEN: usize = 1000;

#[derive(Debug, Error)]
pub enum FormServiceError {
    #[error("form not found")]
    NotFound,
    #[error("published forms cannot be modified")]
    PublishedImmutable,
    #[error("{0}")]
    Validation(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub struct FormService;

impl FormService {
    pub async fn create(pool: &SqlitePool, data: &CreateForm) -> Result<FormWithFields, FormServiceError> {
        let (title, description) = validate_metadata(&data.title, data.description.as_deref())?;
        let definitions = validated_definitions(&data.fields)?;

        let mut tx = pool.begin().await?;
        let form = Form::create(&mut *tx, Uuid::new_v4(), &title, description.as_deref()).await?;
        let fields = insert_fields(&mut tx, form.id, &data.fields, &definitions).await?;
        tx.commit().await?;

        info!(form_id = %form.id, field_count = fields.len(), "form created");

        Ok(FormWithFields { form, fields })
    }

    pub async fn get_with_fields(
        pool: &SqlitePool,
        form_id: Uuid,
    ) -> Result<FormWithFields, FormServiceError> {
        let form = Form::find_by_id(pool, form_id)
            .await?
            .ok_or(FormServiceError::NotFound)?;
        let fields = FormField::find_by_form_id(pool, form_id).await?;
        Ok(FormWithFields {
            form,
            fields: fields.into_iter().map(FieldResponse::from).collect(),
        })
    }

    pub async fn list(
        pool: &SqlitePool,
        status: Option<FormStatus>,
    ) -> Result<Vec<FormSummary>, FormServiceError> {
        Ok(Form::find_all_summaries(pool, status).await?)
    }

    /// Replace a draft form's metadata and entire field set.
    pub async fn update(
        pool: &SqlitePool,
        form_id: Uuid,
        data: &UpdateForm,
    ) -> Result<FormWithFields, FormServiceError> {
        let form = Form::find_by_id(pool, form_id)
            .await?
            .ok_or(FormServiceError::NotFound)?;
        if form.status == FormStatus::Published {
            return Err(FormServiceError::PublishedImmutable);
        }

        let (title, description) = validate_metadata(&data.title, data.description.as_deref())?;
        let definitions = validated_definitions(&data.fields)?;

        let mut tx = pool.begin().await?;
        let form = Form::update_metadata(&mut *tx, form_id, &title, description.as_deref()).await?;
        FormField::delete_by_form_id(&mut *tx, form_id).await?;
        let fields = insert_fields(&mut tx, form_id, &data.fields, &definitions).await?;
        tx.commit().await?;

        Ok(FormWithFields { form, fields })
    }

    pub async fn delete(pool: &SqlitePool, form_id: Uuid) -> Result<(), FormServiceError> {
        let form = Form::find_by_id(pool, form_id)
            .await?
            .ok_or(FormServiceError::NotFound)?;
        if form.status == FormStatus::Published {
            return Err(FormServiceError::PublishedImmutable);
        }

        Form::delete(pool, form_id).await?;
        info!(form_id = %form_id, "form deleted");
        Ok(())
    }

    /// Clone a form (any status) into a new draft with fresh ids.
    pub async fn copy(pool: &SqlitePool, form_id: Uuid) -> Result<FormWithFields, FormServiceError> {
        let source = Form::find_by_id(pool, form_id)
            .await?
            .ok_or(FormServiceError::NotFound)?;
        let source_fields = FormField::find_by_form_id(pool, form_id).await?;

        let mut title = format!("{} (Copy)", source.title);
        if title.chars().count() > MAX_TITLE_LEN {
            title = title.chars().take(MAX_TITLE_LEN).collect();
        }

        let mut tx = pool.begin().await?;
        let form = Form::create(
            &mut *tx,
            Uuid::new_v4(),
            &title,
            source.description.as_deref(),
        )
        .await?;
        let mut fields = Vec::with_capacity(source_fields.len());
        for field in &source_fields {
            let created = FormField::create(
                &mut *tx,
                Uuid::new_v4(),
                form.id,
                field.field_type,
                &field.label,
                field.placeholder.as_deref(),
                field.required,
                field.options.as_deref(),
                field.position,
            )
            .await?;
            fields.push(FieldResponse::from(created));
        }
        tx.commit().await?;

        info!(source_id = %form_id, form_id = %form.id, "form copied");

        Ok(FormWithFields { form, fields })
    }

    /// Public fetch of a published form by slug.
    pub async fn get_shared(pool: &SqlitePool, slug: &str) -> Result<FormWithFields, FormServiceError> {
        let form = Form::find_by_slug(pool, slug)
            .await?
            .ok_or(FormServiceError::NotFound)?;
        let fields = FormField::find_by_form_id(pool, form.id).await?;
        Ok(FormWithFields {
            form,
            fields: fields.into_iter().map(FieldResponse::from).collect(),
        })
    }
}

fn validate_metadata(
    title: &str,
    description: Option<&str>,
) -> Result<(String, Option<String>), FormServiceError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(FormServiceError::Validation(
            "title must not be empty".to_string(),
        ));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(FormServiceError::Validation(format!(
            "title must be at most {MAX_TITLE_LEN} characters"
        )));
    }
    if let Some(description) = description
        && description.chars().count() > MAX_DESCRIPTION_LEN
    {
        return Err(FormServiceError::Validation(format!(
            "description must be at most {MAX_DESCRIPTION_LEN} characters"
        )));
    }
    Ok((title.to_string(), description.map(String::from)))
}

/// Validate every field definition before any row is written, so a bad field
/// rejects the whole request.
fn validated_definitions(
    fields: &[CreateFormField],
) -> Result<Vec<NormalizedDefinition>, FormServiceError> {
    fields
        .iter()
        .map(|field| {
            if let Some(position) = field.position
                && position < 1
            {
                return Err(FormServiceError::Validation(format!(
                    "field \"{}\": position must be a positive integer",
                    field.label
                )));
            }
            field_types::normalize_definition(
                field.field_type,
                &field.label,
                field.placeholder.as_deref(),
                field.options.as_deref(),
            )
            .map_err(|e| FormServiceError::Validation(format!("field \"{}\": {e}", field.label)))
        })
        .collect()
}

async fn insert_fields(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    form_id: Uuid,
    inputs: &[CreateFormField],
    definitions: &[NormalizedDefinition],
) -> Result<Vec<FieldResponse>, FormServiceError> {
    let mut fields = Vec::with_capacity(inputs.len());
    for (index, (input, definition)) in inputs.iter().zip(definitions).enumerate() {
        let position = input.position.unwrap_or(index as i32 + 1);
        let created = FormField::create(
            &mut **tx,
            Uuid::new_v4(),
            form_id,
            input.field_type,
            &definition.label,
            definition.placeholder.as_deref(),
            input.required,
            definition.options.as_deref(),
            position,
        )
        .await?;
        fields.push(FieldResponse::from(created));
    }
    Ok(fields)
}
