//! Declarative form validation.
//!
//! Each form declares a schema of per-field rules. Validation evaluates every
//! rule and collects the failures into a `field -> [messages]` map, so a
//! single response can report all problems at once instead of bailing on the
//! first bad field.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::errors::Error;

/// A single validation rule applied to one form field.
#[derive(Debug, Clone)]
pub enum Rule {
    /// Field must be present and non-empty
    Required,
    /// Field must look like an email address
    Email,
    /// Field length must fall within the inclusive range
    Length { min: usize, max: usize },
    /// Field must equal another field (e.g. password confirmation)
    Matches { other: &'static str, message: &'static str },
}

/// Rules for one named field.
#[derive(Debug, Clone)]
struct FieldRules {
    name: &'static str,
    rules: Vec<Rule>,
}

/// Validation schema for a whole form.
#[derive(Debug, Clone, Default)]
pub struct FormSchema {
    fields: Vec<FieldRules>,
}

impl FormSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: &'static str, rules: Vec<Rule>) -> Self {
        self.fields.push(FieldRules { name, rules });
        self
    }

    /// Evaluate every rule against the submitted values.
    ///
    /// Missing fields are treated as empty strings. Rules other than
    /// `Required` are skipped for empty values so a blank field reports one
    /// error, not three.
    pub fn validate(&self, values: &BTreeMap<&str, &str>) -> ValidationErrors {
        let mut errors = ValidationErrors::default();

        for field in &self.fields {
            let value = values.get(field.name).copied().unwrap_or("");

            for rule in &field.rules {
                match rule {
                    Rule::Required => {
                        if value.trim().is_empty() {
                            errors.add(field.name, "This field is required.");
                        }
                    }
                    Rule::Email => {
                        if !value.is_empty() && !looks_like_email(value) {
                            errors.add(field.name, "Invalid email address.");
                        }
                    }
                    Rule::Length { min, max } => {
                        let len = value.chars().count();
                        if !value.is_empty() && (len < *min || len > *max) {
                            errors.add(field.name, &format!("Field must be between {min} and {max} characters long."));
                        }
                    }
                    Rule::Matches { other, message } => {
                        let other_value = values.get(other).copied().unwrap_or("");
                        if value != other_value {
                            errors.add(field.name, message);
                        }
                    }
                }
            }
        }

        errors
    }
}

/// Minimal email shape check: one `@` with a non-empty local part and a
/// dotted domain. Deliverability is not this layer's problem.
fn looks_like_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    }
}

/// Accumulated validation failures, keyed by field name.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn add(&mut self, field: &str, message: &str) {
        self.0.entry(field.to_string()).or_default().push(message.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn messages_for(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(|v| v.as_slice())
    }

    /// Convert into a service error, or Ok if nothing failed.
    pub fn into_result(self) -> Result<(), Error> {
        if self.is_empty() { Ok(()) } else { Err(Error::Validation { errors: self }) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values<'a>(pairs: &[(&'a str, &'a str)]) -> BTreeMap<&'a str, &'a str> {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_required_fields() {
        let schema = FormSchema::new()
            .field("username", vec![Rule::Required])
            .field("email", vec![Rule::Required]);

        let errors = schema.validate(&values(&[("username", "alice")]));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.messages_for("email"), Some(&["This field is required.".to_string()][..]));
        assert!(errors.messages_for("username").is_none());
    }

    #[test]
    fn test_email_rule() {
        let schema = FormSchema::new().field("email", vec![Rule::Required, Rule::Email]);

        for bad in ["plainaddress", "@example.com", "user@", "user@nodot", "user@.com"] {
            let errors = schema.validate(&values(&[("email", bad)]));
            assert!(!errors.is_empty(), "expected {bad} to fail");
        }

        let errors = schema.validate(&values(&[("email", "alice@example.com")]));
        assert!(errors.is_empty());
    }

    #[test]
    fn test_length_rule_skipped_when_empty() {
        let schema = FormSchema::new().field("password", vec![Rule::Required, Rule::Length { min: 8, max: 64 }]);

        // An empty password reports only the required failure
        let errors = schema.validate(&values(&[("password", "")]));
        assert_eq!(errors.messages_for("password").map(|m| m.len()), Some(1));

        let errors = schema.validate(&values(&[("password", "short")]));
        assert_eq!(
            errors.messages_for("password"),
            Some(&["Field must be between 8 and 64 characters long.".to_string()][..])
        );
    }

    #[test]
    fn test_matches_rule() {
        let schema = FormSchema::new().field(
            "confirm_password",
            vec![Rule::Matches {
                other: "password",
                message: "Field must be equal to password.",
            }],
        );

        let errors = schema.validate(&values(&[("password", "hunter22"), ("confirm_password", "hunter23")]));
        assert_eq!(
            errors.messages_for("confirm_password"),
            Some(&["Field must be equal to password.".to_string()][..])
        );

        let errors = schema.validate(&values(&[("password", "hunter22"), ("confirm_password", "hunter22")]));
        assert!(errors.is_empty());
    }

    #[test]
    fn test_multiple_fields_collected() {
        let schema = FormSchema::new()
            .field("firstname", vec![Rule::Required])
            .field("lastname", vec![Rule::Required])
            .field("email", vec![Rule::Required, Rule::Email]);

        let errors = schema.validate(&values(&[("email", "not-an-email")]));
        assert_eq!(errors.len(), 3);
    }
}
