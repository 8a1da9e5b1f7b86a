use std::borrow::Cow;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_aux::field_attributes::deserialize_string_from_number;
use validator::{Validate, ValidateEmail, ValidateLength, ValidationError, ValidationErrors};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    #[serde(deserialize_with = "deserialize_string_from_number")]
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl UserIdentity {
    /// Name to greet the user with.
    pub fn display_name(&self) -> &str {
        if self.username.is_empty() {
            &self.email
        } else {
            &self.username
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoginCredentials {
    pub email: String,
    pub password: SecretString,
}

impl LoginCredentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: SecretString::from(password.into()),
        }
    }

    pub(crate) fn to_body(&self) -> serde_json::Value {
        serde_json::json!({
            "email": self.email,
            "password": self.password.expose_secret(),
        })
    }
}

impl Validate for LoginCredentials {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        validate_email(&self.email, &mut errors);

        if !self
            .password
            .expose_secret()
            .validate_length(Some(1), None, None)
        {
            errors.add(
                "password",
                ValidationError::new("password_length")
                    .with_message(Cow::from("Password is required")),
            );
        }

        if !errors.errors().is_empty() {
            return Err(errors);
        }

        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct RegisterCredentials {
    pub username: String,
    pub email: String,
    pub password: SecretString,
}

impl RegisterCredentials {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: SecretString::from(password.into()),
        }
    }

    pub(crate) fn to_body(&self) -> serde_json::Value {
        serde_json::json!({
            "username": self.username,
            "email": self.email,
            "password": self.password.expose_secret(),
        })
    }
}

impl Validate for RegisterCredentials {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        validate_email(&self.email, &mut errors);

        if !self.username.trim().validate_length(Some(3), Some(32), None) {
            errors.add(
                "username",
                ValidationError::new("username_length")
                    .with_message(Cow::from("Username length must be between 3 and 32")),
            );
        }

        if !self
            .password
            .expose_secret()
            .validate_length(Some(6), Some(72), None)
        {
            errors.add(
                "password",
                ValidationError::new("password_length")
                    .with_message(Cow::from("Password length must be between 6 and 72")),
            );
        }

        if !errors.errors().is_empty() {
            return Err(errors);
        }

        Ok(())
    }
}

fn validate_email(email: &str, errors: &mut ValidationErrors) {
    if !email.validate_email() {
        errors.add(
            "email",
            ValidationError::new("email_email").with_message(Cow::from("Incorrect email format")),
        );
    }
    if !email.validate_length(Some(1), Some(100), None) {
        errors.add(
            "email",
            ValidationError::new("email_length")
                .with_message(Cow::from("Email length must be between 1 and 100")),
        );
    }
}

#[derive(Deserialize, Debug)]
pub struct AuthData {
    pub user: Option<UserIdentity>,
    pub token: Option<String>,
    pub session: Option<AuthTokens>,
}

impl AuthData {
    pub fn access_token(&self) -> Option<&str> {
        self.token
            .as_deref()
            .or_else(|| self.session.as_ref().map(|s| s.access_token.as_str()))
            .filter(|t| !t.is_empty())
    }
}

#[derive(Deserialize, Debug)]
pub struct AuthTokens {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_at: Option<i64>,
}
