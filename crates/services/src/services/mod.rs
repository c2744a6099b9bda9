pub mod field_types;
pub mod fields;
pub mod forms;
pub mod publication;
pub mod submissions;
