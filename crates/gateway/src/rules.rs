//! Declarative checkout rules.
//!
//! Each gateway publishes the constraints its checkout payload must
//! satisfy as a plain data table, so callers can validate buyer-submitted
//! payment data and render field-level messages without knowing anything
//! about the provider.

use serde::Serialize;

/// Constraint kinds a checkout field can carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// Any non-empty string.
    Text,

    /// A string of ASCII digits with a length in `min..=max`.
    Digits { min: usize, max: usize },

    /// One of an enumerated set of values.
    OneOf(&'static [&'static str]),
}

/// A single declarative rule for a checkout payload field.
#[derive(Debug, Clone)]
pub struct CheckoutRule {
    /// Payload field name.
    pub field: &'static str,

    /// Whether the field must be present.
    pub required: bool,

    /// The constraint applied when the field is present.
    pub kind: FieldKind,

    /// Human-readable message returned when the rule fails.
    pub message: &'static str,
}

impl CheckoutRule {
    /// A required field with the given constraint.
    pub fn required(field: &'static str, kind: FieldKind, message: &'static str) -> Self {
        Self {
            field,
            required: true,
            kind,
            message,
        }
    }
}

/// A field-level validation failure with its human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Validates a checkout payload against a gateway's rules.
///
/// Collects every failing field rather than stopping at the first, so the
/// buyer sees all problems at once.
pub fn validate(rules: &[CheckoutRule], payload: &serde_json::Value) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();

    for rule in rules {
        let value = payload.get(rule.field).and_then(|v| v.as_str());

        let ok = match value {
            None | Some("") => !rule.required,
            Some(s) => match &rule.kind {
                FieldKind::Text => true,
                FieldKind::Digits { min, max } => {
                    let len = s.len();
                    len >= *min && len <= *max && s.bytes().all(|b| b.is_ascii_digit())
                }
                FieldKind::OneOf(allowed) => allowed.contains(&s),
            },
        };

        if !ok {
            errors.push(FieldError {
                field: rule.field.to_string(),
                message: rule.message.to_string(),
            });
        }
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
