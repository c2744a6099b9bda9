pub mod form;
pub mod form_field;
pub mod form_submission;
