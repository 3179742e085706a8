//! Client-side form validation
//!
//! Failures here are `validation` errors: shown next to the form, never sent
//! to the backend.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Field name → first error message for that field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    fields: BTreeMap<String, String>,
}

impl ValidationErrors {
    /// Record an error; the first message per field wins.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, message) in &self.fields {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

macro_rules! pattern {
    ($name:ident, $re:expr) => {
        static $name: LazyLock<Regex> =
            LazyLock::new(|| Regex::new($re).expect("field pattern is a valid regex"));
    };
}

pattern!(EMAIL, r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$");
pattern!(PHONE, r"^91[0-9]{10}$");
pattern!(PAN_CARD, r"^[A-Z]{5}[0-9]{4}[A-Z]$");
pattern!(
    GST_NUMBER,
    r"^(0[1-9]|[1-2][0-9]|3[0-8]|97)([a-zA-Z]{5}[0-9]{4}[a-zA-Z][1-9a-zA-Z][Zz1-9A-Ja-j][0-9a-zA-Z])+$"
);
pattern!(PASSWORD_CHARSET, r"^[A-Za-z0-9#@$!%*?&_]{8,15}$");
pattern!(CODE, r"^.{1,20}$");
pattern!(VEHICLE_NO, r"^[A-Za-z]{2}[0-9]{1,2}[A-Za-z]{1,3}[0-9]{1,4}$");
pattern!(ADDRESS, r"^.{1,255}$");
pattern!(NAME, r"^[A-Za-z\s'-]{1,50}$");
pattern!(AMOUNT, r"^[0-9]{1,10}(\.[0-9]{1,4})?$");
pattern!(ALPHANUMERIC, r"^[a-zA-Z0-9]+$");
pattern!(DETAILS, r"^.{1,150}$");
pattern!(PHONE_WITHOUT_PREFIX, r"^[6-9][0-9]{9}$");
pattern!(LONG_TEXT, r"^.{0,500}$");
pattern!(LICENSE, r"^[A-Za-z]{2}-[0-9]{2}-[0-9]{4}-[0-9]{7}$");
pattern!(USERNAME, r"^[a-zA-Z0-9_]+$");

/// Input patterns shared by the console's forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pattern {
    Email,
    Phone,
    PanCard,
    GstNumber,
    /// 8-15 chars with a letter, a digit and one of `@$!%*?&_`.
    Password,
    Code,
    VehicleNo,
    Address,
    Name,
    Amount,
    /// Letters and digits, at least one of each.
    InvoiceNo,
    Details,
    PhoneWithoutPrefix,
    LongText,
    License,
}

impl Pattern {
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Pattern::Email => EMAIL.is_match(value),
            Pattern::Phone => PHONE.is_match(value),
            Pattern::PanCard => PAN_CARD.is_match(value),
            Pattern::GstNumber => GST_NUMBER.is_match(value),
            Pattern::Password => {
                PASSWORD_CHARSET.is_match(value)
                    && value.chars().any(|c| c.is_ascii_alphabetic())
                    && value.chars().any(|c| c.is_ascii_digit())
                    && value.chars().any(|c| "@$!%*?&_".contains(c))
            }
            Pattern::Code => CODE.is_match(value),
            Pattern::VehicleNo => VEHICLE_NO.is_match(value),
            Pattern::Address => ADDRESS.is_match(value),
            Pattern::Name => NAME.is_match(value),
            Pattern::Amount => AMOUNT.is_match(value),
            Pattern::InvoiceNo => {
                ALPHANUMERIC.is_match(value)
                    && value.chars().any(|c| c.is_ascii_digit())
                    && value.chars().any(|c| c.is_ascii_alphabetic())
            }
            Pattern::Details => DETAILS.is_match(value),
            Pattern::PhoneWithoutPrefix => PHONE_WITHOUT_PREFIX.is_match(value),
            Pattern::LongText => LONG_TEXT.is_match(value),
            Pattern::License => LICENSE.is_match(value),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        check_email(&mut errors, &self.email);
        if self.password.is_empty() {
            errors.add("password", "Password is required");
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl SignUpForm {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let username = self.username.trim();
        let len = username.chars().count();
        if len < 3 {
            errors.add("username", "Username must be at least 3 characters");
        } else if len > 20 {
            errors.add("username", "Username must be less than 20 characters");
        } else if !USERNAME.is_match(username) {
            errors.add(
                "username",
                "Username can only contain letters, numbers, and underscores",
            );
        }

        check_email(&mut errors, &self.email);

        if self.password.chars().count() < 8 {
            errors.add("password", "Password must be at least 8 characters");
        } else if !(self.password.chars().any(|c| c.is_lowercase())
            && self.password.chars().any(|c| c.is_uppercase())
            && self.password.chars().any(|c| c.is_ascii_digit()))
        {
            errors.add(
                "password",
                "Password must contain at least one uppercase letter, one lowercase letter, and one number",
            );
        }

        if self.confirm_password.is_empty() {
            errors.add("confirmPassword", "Please confirm your password");
        } else if self.confirm_password != self.password {
            errors.add("confirmPassword", "Passwords don't match");
        }

        errors.into_result()
    }
}

fn check_email(errors: &mut ValidationErrors, email: &str) {
    let email = email.trim();
    if email.is_empty() {
        errors.add("email", "Email is required");
    } else if !Pattern::Email.matches(email) {
        errors.add("email", "Please enter a valid email address");
    }
}
