//! Request body validation.
//!
//! Payloads derive [`validator::Validate`]; failures are flattened into a
//! list of [`FieldError`]s so a client gets every problem with its payload
//! in one response instead of one at a time.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

/// A single field-level validation failure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldError {
    /// Name of the offending body field.
    pub param: String,
    /// Human-readable message.
    pub msg: String,
}

impl FieldError {
    pub fn new(param: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            param: param.into(),
            msg: msg.into(),
        }
    }
}

/// Flatten `validator` output into field errors, ordered by field name.
pub fn field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut fields: Vec<FieldError> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            let param = field.to_string();
            errs.iter().map(move |e| {
                let msg = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string());
                FieldError::new(param.clone(), msg)
            })
        })
        .collect();

    fields.sort_by(|a, b| a.param.cmp(&b.param));
    fields
}

fn check<T: Validate>(payload: &T) -> Result<(), Vec<FieldError>> {
    payload.validate().map_err(|e| field_errors(&e))
}

/// Body of a post or a comment. Whitespace counts as text.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct TextInput {
    #[validate(
        required(message = "Text is required"),
        length(min = 1, message = "Text is required")
    )]
    pub text: Option<String>,
}

impl TextInput {
    /// Validate and hand back the text.
    pub fn into_text(self) -> Result<String, Vec<FieldError>> {
        check(&self)?;
        Ok(self.text.unwrap_or_default())
    }
}

impl From<&str> for TextInput {
    fn from(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
        }
    }
}

impl From<String> for TextInput {
    fn from(text: String) -> Self {
        Self { text: Some(text) }
    }
}

/// A user registration payload.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct RegistrationInput {
    #[validate(
        required(message = "Name is required"),
        length(min = 1, message = "Name is required")
    )]
    pub name: Option<String>,

    #[validate(
        required(message = "Please include a valid email"),
        email(message = "Please include a valid email")
    )]
    pub email: Option<String>,

    pub avatar: Option<String>,
}

impl RegistrationInput {
    pub fn check(&self) -> Result<(), Vec<FieldError>> {
        check(self)
    }
}
