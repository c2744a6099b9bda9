//! Per-type behavior contract for form fields: definition rules applied when
//! a field is created or edited, and value validation applied when a form is
//! filled in. Rendering and validation share these rules, so they live in one
//! place.

use std::collections::HashSet;

use chrono::NaiveDate;
use db::models::form_field::{FieldOption, FieldType, FormField};
use serde_json::Value;
use thiserror::Error;

pub const MAX_LABEL_LEN: usize = 255;
pub const MAX_PLACEHOLDER_LEN: usize = 500;
pub const MAX_OPTION_LEN: usize = 255;
pub const MAX_TEXT_LEN: usize = 1000;
pub const MAX_TEXTAREA_LEN: usize = 10000;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DefinitionError {
    #[error("label must not be empty")]
    EmptyLabel,
    #[error("label must be at most {max} characters", max = MAX_LABEL_LEN)]
    LabelTooLong,
    #[error("placeholder must be at most {max} characters", max = MAX_PLACEHOLDER_LEN)]
    PlaceholderTooLong,
    #[error("{0} fields require at least one option")]
    MissingOptions(FieldType),
    #[error("option labels and values must be non-empty and at most {max} characters", max = MAX_OPTION_LEN)]
    InvalidOption,
    #[error("duplicate option value: {0}")]
    DuplicateOptionValue(String),
    #[error("position must be a positive integer")]
    InvalidPosition,
}

/// A field definition after validation and type-specific cleanup, ready to
/// be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedDefinition {
    pub label: String,
    pub placeholder: Option<String>,
    pub options: Option<String>,
}

/// Validate a field definition against the rules of `field_type` and clear
/// the properties that type does not carry. Switching a field's type thereby
/// resets placeholder/options while label, required and position pass
/// through untouched.
pub fn normalize_definition(
    field_type: FieldType,
    label: &str,
    placeholder: Option<&str>,
    options: Option<&[FieldOption]>,
) -> Result<NormalizedDefinition, DefinitionError> {
    let label = label.trim();
    if label.is_empty() {
        return Err(DefinitionError::EmptyLabel);
    }
    if label.chars().count() > MAX_LABEL_LEN {
        return Err(DefinitionError::LabelTooLong);
    }

    let placeholder = if field_type.supports_placeholder() {
        match placeholder.map(str::trim).filter(|p| !p.is_empty()) {
            Some(p) if p.chars().count() > MAX_PLACEHOLDER_LEN => {
                return Err(DefinitionError::PlaceholderTooLong);
            }
            other => other.map(String::from),
        }
    } else {
        None
    };

    let options = if field_type.supports_options() {
        let options = options.unwrap_or_default();
        if options.is_empty() {
            return Err(DefinitionError::MissingOptions(field_type));
        }
        let mut seen = HashSet::new();
        for option in options {
            let valid = |s: &str| !s.is_empty() && s.chars().count() <= MAX_OPTION_LEN;
            if !valid(&option.label) || !valid(&option.value) {
                return Err(DefinitionError::InvalidOption);
            }
            if !seen.insert(option.value.as_str()) {
                return Err(DefinitionError::DuplicateOptionValue(option.value.clone()));
            }
        }
        // Serialization of a Vec<FieldOption> cannot fail.
        Some(serde_json::to_string(options).unwrap_or_default())
    } else {
        None
    };

    Ok(NormalizedDefinition {
        label: label.to_string(),
        placeholder,
        options,
    })
}

/// Validate one submitted value against its field definition and normalize
/// it for storage. Error messages are predicates ("is required", "must be
/// ...") so callers can prefix the field label.
pub fn validate_value(field: &FormField, value: Option<&Value>) -> Result<Value, String> {
    let Some(value) = value.filter(|v| !is_empty(v)) else {
        return if field.required {
            Err("is required".to_string())
        } else {
            Ok(Value::Null)
        };
    };

    match field.field_type {
        FieldType::Text => validate_text(value, MAX_TEXT_LEN),
        FieldType::Textarea => validate_text(value, MAX_TEXTAREA_LEN),
        FieldType::Date => validate_date(value),
        FieldType::Radio => validate_radio(field, value),
        FieldType::Checkbox => validate_checkbox(field, value),
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn validate_text(value: &Value, max_len: usize) -> Result<Value, String> {
    match value {
        Value::String(s) if s.chars().count() <= max_len => Ok(value.clone()),
        Value::String(_) => Err(format!("must be at most {max_len} characters")),
        _ => Err("must be a string".to_string()),
    }
}

fn validate_date(value: &Value) -> Result<Value, String> {
    match value {
        Value::String(s) if NaiveDate::parse_from_str(s, DATE_FORMAT).is_ok() => Ok(value.clone()),
        Value::String(_) => Err("must be a valid date in YYYY-MM-DD format".to_string()),
        _ => Err("must be a string".to_string()),
    }
}

fn validate_radio(field: &FormField, value: &Value) -> Result<Value, String> {
    let options = field.parsed_options();
    match value {
        Value::String(s) if options.iter().any(|o| o.value == *s) => Ok(value.clone()),
        Value::String(_) => Err("must be one of the allowed options".to_string()),
        _ => Err("must be a string".to_string()),
    }
}

fn validate_checkbox(field: &FormField, value: &Value) -> Result<Value, String> {
    let options = field.parsed_options();
    let Value::Array(items) = value else {
        return Err("must be a list of selected options".to_string());
    };
    for item in items {
        match item {
            Value::String(s) if options.iter().any(|o| o.value == *s) => {}
            Value::String(_) => return Err("contains a value that is not an allowed option".to_string()),
            _ => return Err("must be a list of selected options".to_string()),
        }
    }
    Ok(value.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;

    fn field(field_type: FieldType, required: bool, options: Option<&str>) -> FormField {
        FormField {
            id: Uuid::new_v4(),
            form_id: Uuid::new_v4(),
            field_type,
            label: "Field".to_string(),
            placeholder: None,
            required,
            options: options.map(String::from),
            position: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    const COLORS: &str = r#"[{"label":"Red","value":"red"},{"label":"Blue","value":"blue"}]"#;

    #[test]
    fn test_required_handling() {
        let required = field(FieldType::Text, true, None);
        assert_eq!(validate_value(&required, None), Err("is required".to_string()));
        assert_eq!(
            validate_value(&required, Some(&json!(""))),
            Err("is required".to_string())
        );
        assert_eq!(
            validate_value(&required, Some(&Value::Null)),
            Err("is required".to_string())
        );

        let optional = field(FieldType::Text, false, None);
        assert_eq!(validate_value(&optional, None), Ok(Value::Null));
        assert_eq!(validate_value(&optional, Some(&json!(""))), Ok(Value::Null));
    }

    #[test]
    fn test_text_length_limits() {
        let text = field(FieldType::Text, false, None);
        assert!(validate_value(&text, Some(&json!("hello"))).is_ok());
        assert!(validate_value(&text, Some(&json!("x".repeat(1000)))).is_ok());
        assert!(validate_value(&text, Some(&json!("x".repeat(1001)))).is_err());
        assert!(validate_value(&text, Some(&json!(42))).is_err());

        let textarea = field(FieldType::Textarea, false, None);
        assert!(validate_value(&textarea, Some(&json!("x".repeat(10000)))).is_ok());
        assert!(validate_value(&textarea, Some(&json!("x".repeat(10001)))).is_err());
    }

    #[test]
    fn test_date_parsing() {
        let date = field(FieldType::Date, false, None);
        assert!(validate_value(&date, Some(&json!("2026-08-06"))).is_ok());
        assert!(validate_value(&date, Some(&json!("2026-02-30"))).is_err());
        assert!(validate_value(&date, Some(&json!("06/08/2026"))).is_err());
        assert!(validate_value(&date, Some(&json!("not a date"))).is_err());
    }

    #[test]
    fn test_radio_option_membership() {
        let radio = field(FieldType::Radio, false, Some(COLORS));
        assert!(validate_value(&radio, Some(&json!("red"))).is_ok());
        assert!(validate_value(&radio, Some(&json!("green"))).is_err());
        assert!(validate_value(&radio, Some(&json!(["red"]))).is_err());
    }

    #[test]
    fn test_checkbox_membership_and_shape() {
        let checkbox = field(FieldType::Checkbox, false, Some(COLORS));
        assert_eq!(
            validate_value(&checkbox, Some(&json!(["blue", "red"]))),
            Ok(json!(["blue", "red"]))
        );
        assert!(validate_value(&checkbox, Some(&json!(["red", "green"]))).is_err());
        assert!(validate_value(&checkbox, Some(&json!("red"))).is_err());
        assert!(validate_value(&checkbox, Some(&json!([1]))).is_err());

        let required = field(FieldType::Checkbox, true, Some(COLORS));
        assert_eq!(
            validate_value(&required, Some(&json!([]))),
            Err("is required".to_string())
        );
    }

    #[test]
    fn test_definition_requires_options_for_choice_fields() {
        let err = normalize_definition(FieldType::Radio, "Color", None, None);
        assert_eq!(err, Err(DefinitionError::MissingOptions(FieldType::Radio)));

        let err = normalize_definition(FieldType::Checkbox, "Color", None, Some(&[]));
        assert_eq!(err, Err(DefinitionError::MissingOptions(FieldType::Checkbox)));
    }

    #[test]
    fn test_definition_rejects_duplicate_option_values() {
        let options = vec![
            FieldOption { label: "Red".into(), value: "red".into() },
            FieldOption { label: "Also red".into(), value: "red".into() },
        ];
        assert_eq!(
            normalize_definition(FieldType::Radio, "Color", None, Some(&options)),
            Err(DefinitionError::DuplicateOptionValue("red".to_string()))
        );
    }

    #[test]
    fn test_type_switch_clears_inapplicable_props() {
        let options = vec![FieldOption { label: "Red".into(), value: "red".into() }];

        // Choice field: placeholder dropped, options kept.
        let def = normalize_definition(FieldType::Radio, "Color", Some("pick one"), Some(&options))
            .unwrap();
        assert!(def.placeholder.is_none());
        assert!(def.options.is_some());

        // Free-input field: options dropped, placeholder kept.
        let def = normalize_definition(FieldType::Text, "Color", Some("pick one"), Some(&options))
            .unwrap();
        assert_eq!(def.placeholder.as_deref(), Some("pick one"));
        assert!(def.options.is_none());
    }

    #[test]
    fn test_definition_label_rules() {
        assert_eq!(
            normalize_definition(FieldType::Text, "   ", None, None),
            Err(DefinitionError::EmptyLabel)
        );
        assert_eq!(
            normalize_definition(FieldType::Text, &"x".repeat(256), None, None),
            Err(DefinitionError::LabelTooLong)
        );
    }
}
