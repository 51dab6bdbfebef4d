//! Submitted form types
//!
//! Each form owns a [`Validator`] by composition and re-serializes with
//! its errors so the page can be re-rendered with values and messages
//! intact. Secrets are never serialized back out.

use crate::validator::{self, Validator, EMAIL_RX};
use serde::{Deserialize, Serialize};

fn default_expires() -> i32 {
    365
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnippetCreateForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default = "default_expires")]
    pub expires: i32,
    #[serde(skip_deserializing)]
    pub validator: Validator,
}

impl Default for SnippetCreateForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            content: String::new(),
            expires: default_expires(),
            validator: Validator::default(),
        }
    }
}

impl SnippetCreateForm {
    pub fn validate(&mut self) -> bool {
        self.validator.check_field(
            validator::not_blank(&self.title),
            "title",
            "This field cannot be blank",
        );
        self.validator.check_field(
            validator::max_chars(&self.title, 100),
            "title",
            "This field cannot be more than 100 characters long",
        );
        self.validator.check_field(
            validator::not_blank(&self.content),
            "content",
            "This field cannot be blank",
        );
        self.validator.check_field(
            validator::permitted_value(&self.expires, &[1, 7, 365]),
            "expires",
            "This field must equal 1, 7 or 365",
        );
        self.validator.is_valid()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing)]
    pub password: String,
    #[serde(skip_deserializing)]
    pub validator: Validator,
}

impl SignupForm {
    pub fn validate(&mut self) -> bool {
        self.validator.check_field(
            validator::not_blank(&self.name),
            "name",
            "This field cannot be blank",
        );
        self.validator.check_field(
            validator::not_blank(&self.email),
            "email",
            "This field cannot be blank",
        );
        self.validator.check_field(
            validator::matches(&self.email, &EMAIL_RX),
            "email",
            "This field must be a valid email address",
        );
        self.validator.check_field(
            validator::not_blank(&self.password),
            "password",
            "This field cannot be blank",
        );
        self.validator.check_field(
            validator::min_chars(&self.password, 8),
            "password",
            "This field must be at least 8 characters long",
        );
        self.validator.is_valid()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing)]
    pub password: String,
    #[serde(skip_deserializing)]
    pub validator: Validator,
}

impl LoginForm {
    pub fn validate(&mut self) -> bool {
        self.validator.check_field(
            validator::not_blank(&self.email),
            "email",
            "This field cannot be blank",
        );
        self.validator.check_field(
            validator::matches(&self.email, &EMAIL_RX),
            "email",
            "This field must be a valid email address",
        );
        self.validator.check_field(
            validator::not_blank(&self.password),
            "password",
            "This field cannot be blank",
        );
        self.validator.is_valid()
    }
}
