//! Form validation
//!
//! A `Validator` accumulates field-level and request-level errors for a
//! submitted form. It carries no knowledge of HTTP, forms or storage, so
//! each form type can own one by composition. The predicates are free
//! functions so forms can combine them however they need.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;

lazy_static! {
    /// Pattern for validating the shape of email addresses (WHATWG-derived).
    pub static ref EMAIL_RX: Regex = Regex::new(
        "^[a-zA-Z0-9.!#$%&'*+\\/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    )
    .expect("email pattern must compile");
}

/// Accumulated validation errors for a submitted form
#[derive(Debug, Clone, Default, Serialize)]
pub struct Validator {
    /// Errors not attributable to a single field, in insertion order
    pub non_field_errors: Vec<String>,
    /// One message per field; the first registered error wins
    pub field_errors: HashMap<String, String>,
}

impl Validator {
    /// True if no field errors and no non-field errors have been registered
    pub fn is_valid(&self) -> bool {
        self.field_errors.is_empty() && self.non_field_errors.is_empty()
    }

    /// Add an error message that is not specific to any field
    pub fn add_non_field_error(&mut self, message: &str) {
        self.non_field_errors.push(message.to_string());
    }

    /// Add an error message for a specific form field.
    ///
    /// If an error already exists for the field it is kept; later errors
    /// for the same field are silently discarded.
    pub fn add_field_error(&mut self, key: &str, message: &str) {
        self.field_errors
            .entry(key.to_string())
            .or_insert_with(|| message.to_string());
    }

    /// Register `message` under `key` if the check failed
    pub fn check_field(&mut self, ok: bool, key: &str, message: &str) {
        if !ok {
            self.add_field_error(key, message);
        }
    }
}

/// True if the value is not empty after trimming whitespace
pub fn not_blank(value: &str) -> bool {
    !value.trim().is_empty()
}

/// True if the value contains at least `n` characters (Unicode code points)
pub fn min_chars(value: &str, n: usize) -> bool {
    value.chars().count() >= n
}

/// True if the value contains no more than `n` characters (Unicode code points)
pub fn max_chars(value: &str, n: usize) -> bool {
    value.chars().count() <= n
}

/// True if the value matches one of the permitted values
pub fn permitted_value<T: PartialEq>(value: &T, permitted: &[T]) -> bool {
    permitted.contains(value)
}

/// True if the value matches the provided regular expression
pub fn matches(value: &str, rx: &Regex) -> bool {
    rx.is_match(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_new_validator_is_valid() {
        let v = Validator::default();
        assert!(v.is_valid());
    }

    #[test]
    fn test_field_error_flips_validity() {
        let mut v = Validator::default();
        v.check_field(false, "title", "This field cannot be blank");
        assert!(!v.is_valid());
    }

    #[test]
    fn test_non_field_error_flips_validity() {
        let mut v = Validator::default();
        v.add_non_field_error("Email or password is incorrect");
        assert!(!v.is_valid());
    }

    #[test]
    fn test_first_field_error_wins() {
        let mut v = Validator::default();
        v.check_field(false, "password", "This field cannot be blank");
        v.check_field(false, "password", "This field must be at least 8 characters long");
        assert_eq!(
            v.field_errors.get("password").map(String::as_str),
            Some("This field cannot be blank")
        );
        assert_eq!(v.field_errors.len(), 1);
    }

    #[test]
    fn test_passing_check_registers_nothing() {
        let mut v = Validator::default();
        v.check_field(true, "title", "unused");
        assert!(v.is_valid());
        assert!(v.field_errors.is_empty());
    }

    #[test]
    fn test_non_field_errors_keep_insertion_order() {
        let mut v = Validator::default();
        v.add_non_field_error("first");
        v.add_non_field_error("second");
        assert_eq!(v.non_field_errors, vec!["first", "second"]);
    }

    #[test]
    fn test_not_blank() {
        assert!(not_blank("hello"));
        assert!(!not_blank(""));
        assert!(!not_blank("   \t\n"));
    }

    #[test]
    fn test_char_counts_use_code_points() {
        // 4 code points, 12 bytes
        assert!(min_chars("日本語だ", 4));
        assert!(!min_chars("日本語だ", 5));
        assert!(max_chars("日本語だ", 4));
        assert!(!max_chars("日本語だ", 3));
    }

    #[test]
    fn test_permitted_value() {
        assert!(permitted_value(&7, &[1, 7, 365]));
        assert!(!permitted_value(&2, &[1, 7, 365]));
        assert!(permitted_value(&"a", &["a", "b"]));
    }

    #[test]
    fn test_email_pattern() {
        assert!(matches("alice@example.com", &EMAIL_RX));
        assert!(matches("a.b+c@sub.example.co.uk", &EMAIL_RX));
        assert!(!matches("not-an-email", &EMAIL_RX));
        assert!(!matches("@example.com", &EMAIL_RX));
        assert!(!matches("alice@", &EMAIL_RX));
    }
}
