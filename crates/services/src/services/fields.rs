//! Per-field operations on a draft form: add, replace, remove. All of them
//! re-read the owning form and refuse to touch a published one.

use db::models::{
    form::{Form, FormStatus},
    form_field::{CreateFormField, FieldResponse, FormField, UpdateFormField},
};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use super::field_types;

#[derive(Debug, Error)]
pub enum FieldServiceError {
    #[error("form not found")]
    FormNotFound,
    #[error("field not found")]
    FieldNotFound,
    #[error("published forms cannot be modified")]
    PublishedImmutable,
    #[error("{0}")]
    Validation(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub struct FieldService;

impl FieldService {
    pub async fn list(
        pool: &SqlitePool,
        form_id: Uuid,
    ) -> Result<Vec<FieldResponse>, FieldServiceError> {
        Form::find_by_id(pool, form_id)
            .await?
            .ok_or(FieldServiceError::FormNotFound)?;
        let fields = FormField::find_by_form_id(pool, form_id).await?;
        Ok(fields.into_iter().map(FieldResponse::from).collect())
    }

    pub async fn add(
        pool: &SqlitePool,
        form_id: Uuid,
        data: &CreateFormField,
    ) -> Result<FieldResponse, FieldServiceError> {
        let form = load_draft(pool, form_id).await?;

        let definition = field_types::normalize_definition(
            data.field_type,
            &data.label,
            data.placeholder.as_deref(),
            data.options.as_deref(),
        )
        .map_err(|e| FieldServiceError::Validation(e.to_string()))?;

        let position = match data.position {
            Some(position) if position < 1 => {
                return Err(FieldServiceError::Validation(
                    "position must be a positive integer".to_string(),
                ));
            }
            Some(position) => position,
            None => FormField::next_position(pool, form.id).await?,
        };

        let field = FormField::create(
            pool,
            Uuid::new_v4(),
            form.id,
            data.field_type,
            &definition.label,
            definition.placeholder.as_deref(),
            data.required,
            definition.options.as_deref(),
            position,
        )
        .await?;

        info!(form_id = %form.id, field_id = %field.id, "field added");

        Ok(FieldResponse::from(field))
    }

    /// Replace a field's definition. Changing `field_type` clears the
    /// properties the new type does not carry.
    pub async fn update(
        pool: &SqlitePool,
        form_id: Uuid,
        field_id: Uuid,
        data: &UpdateFormField,
    ) -> Result<FieldResponse, FieldServiceError> {
        load_draft(pool, form_id).await?;

        let existing = FormField::find_by_id(pool, field_id)
            .await?
            .filter(|f| f.form_id == form_id)
            .ok_or(FieldServiceError::FieldNotFound)?;

        let definition = field_types::normalize_definition(
            data.field_type,
            &data.label,
            data.placeholder.as_deref(),
            data.options.as_deref(),
        )
        .map_err(|e| FieldServiceError::Validation(e.to_string()))?;

        let position = match data.position {
            Some(position) if position < 1 => {
                return Err(FieldServiceError::Validation(
                    "position must be a positive integer".to_string(),
                ));
            }
            Some(position) => position,
            None => existing.position,
        };

        let field = FormField::update(
            pool,
            field_id,
            data.field_type,
            &definition.label,
            definition.placeholder.as_deref(),
            data.required,
            definition.options.as_deref(),
            position,
        )
        .await?;

        Ok(FieldResponse::from(field))
    }

    pub async fn delete(
        pool: &SqlitePool,
        form_id: Uuid,
        field_id: Uuid,
    ) -> Result<(), FieldServiceError> {
        load_draft(pool, form_id).await?;

        let existing = FormField::find_by_id(pool, field_id)
            .await?
            .filter(|f| f.form_id == form_id)
            .ok_or(FieldServiceError::FieldNotFound)?;

        FormField::delete(pool, existing.id).await?;
        info!(form_id = %form_id, field_id = %field_id, "field deleted");
        Ok(())
    }
}

/// Fresh status read backing every mutation guard.
async fn load_draft(pool: &SqlitePool, form_id: Uuid) -> Result<Form, FieldServiceError> {
    let form = Form::find_by_id(pool, form_id)
        .await?
        .ok_or(FieldServiceError::FormNotFound)?;
    if form.status == FormStatus::Published {
        return Err(FieldServiceError::PublishedImmutable);
    }
    Ok(form)
}
