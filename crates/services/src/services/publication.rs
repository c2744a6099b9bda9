//! Form lifecycle state machine: draft is the initial state, published the
//! terminal one. Publishing freezes the form's fields and makes it publicly
//! reachable under its slug.

use chrono::Utc;
use db::models::{
    form::{Form, FormStatus},
    form_field::FormField,
};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum PublicationError {
    #[error("form not found")]
    NotFound,
    #[error("form is already published")]
    AlreadyPublished,
    #[error("add at least one field before publishing")]
    NoFields,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub struct PublicationService;

impl PublicationService {
    /// Public slug for a form. Derived from the form's own id, so it is
    /// deterministic and collision-free.
    pub fn slug_from_id(form_id: Uuid) -> String {
        form_id.to_string()
    }

    /// Execute the draft -> published transition.
    ///
    /// Preconditions are checked in order against a fresh read: the form
    /// exists, is still a draft, and has at least one field. The transition
    /// itself is a conditional update, so when two publishes race the loser
    /// observes zero affected rows and reports `AlreadyPublished`.
    pub async fn publish(pool: &SqlitePool, form_id: Uuid) -> Result<Form, PublicationError> {
        let form = Form::find_by_id(pool, form_id)
            .await?
            .ok_or(PublicationError::NotFound)?;
        if form.status == FormStatus::Published {
            return Err(PublicationError::AlreadyPublished);
        }

        let field_count = FormField::count_by_form_id(pool, form_id).await?;
        if field_count == 0 {
            return Err(PublicationError::NoFields);
        }

        let slug = Self::slug_from_id(form_id);
        let updated = Form::mark_published(pool, form_id, &slug, Utc::now()).await?;
        if updated == 0 {
            return Err(PublicationError::AlreadyPublished);
        }

        info!(form_id = %form_id, slug = %slug, "form published");

        Form::find_by_id(pool, form_id)
            .await?
            .ok_or(PublicationError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use db::{
        DBService,
        models::{form::FormStatus, form_field::FieldType},
    };

    async fn draft_with_field(db: &DBService) -> Form {
        let form = Form::create(&db.pool, Uuid::new_v4(), "Feedback", None)
            .await
            .unwrap();
        FormField::create(
            &db.pool,
            Uuid::new_v4(),
            form.id,
            FieldType::Text,
            "Name",
            None,
            true,
            None,
            1,
        )
        .await
        .unwrap();
        form
    }

    #[tokio::test]
    async fn test_publish_sets_slug_and_timestamp() {
        let db = DBService::new_in_memory().await.unwrap();
        let form = draft_with_field(&db).await;

        let published = PublicationService::publish(&db.pool, form.id).await.unwrap();
        assert_eq!(published.status, FormStatus::Published);
        assert_eq!(published.slug.as_deref(), Some(form.id.to_string().as_str()));
        assert!(published.published_at.is_some());
    }

    #[tokio::test]
    async fn test_second_publish_rejected_and_state_unchanged() {
        let db = DBService::new_in_memory().await.unwrap();
        let form = draft_with_field(&db).await;

        let first = PublicationService::publish(&db.pool, form.id).await.unwrap();

        let second = PublicationService::publish(&db.pool, form.id).await;
        assert!(matches!(second, Err(PublicationError::AlreadyPublished)));

        let current = Form::find_by_id(&db.pool, form.id).await.unwrap().unwrap();
        assert_eq!(current.slug, first.slug);
        assert_eq!(current.published_at, first.published_at);
    }

    #[tokio::test]
    async fn test_publish_requires_at_least_one_field() {
        let db = DBService::new_in_memory().await.unwrap();
        let form = Form::create(&db.pool, Uuid::new_v4(), "Empty", None)
            .await
            .unwrap();

        let result = PublicationService::publish(&db.pool, form.id).await;
        assert!(matches!(result, Err(PublicationError::NoFields)));

        let current = Form::find_by_id(&db.pool, form.id).await.unwrap().unwrap();
        assert_eq!(current.status, FormStatus::Draft);
        assert!(current.slug.is_none());
    }

    #[tokio::test]
    async fn test_publish_missing_form_is_not_found() {
        let db = DBService::new_in_memory().await.unwrap();
        let result = PublicationService::publish(&db.pool, Uuid::new_v4()).await;
        assert!(matches!(result, Err(PublicationError::NotFound)));
    }

    #[test]
    fn test_slug_derivation_is_stable() {
        let id = Uuid::new_v4();
        let slug = PublicationService::slug_from_id(id);
        assert_eq!(slug, PublicationService::slug_from_id(id));
        // The slug round-trips to the id it was derived from.
        assert_eq!(slug.parse::<Uuid>().unwrap(), id);
    }
}
