//! Registration profile and local validation.
//!
//! Validation runs on the client before anything touches the network, and
//! reports failures field-by-field so the form can highlight the offending
//! input. The backend applies the same rules again; its answers map onto the
//! same [`FieldError`] shape.

use serde::{Deserialize, Serialize};

use ledgerdesk_core::FieldError;

/// A new-account request as submitted by the registration form.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterProfile {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
}

impl RegisterProfile {
    /// Validate the profile locally.
    ///
    /// Collects every violation instead of stopping at the first, so the
    /// form can mark all offending fields in one pass.
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        let username = self.username.trim();
        if username.len() < 3 || username.len() > 20 {
            errors.push(FieldError::new(
                "username",
                "username must be between 3 and 20 characters",
            ));
        }

        if !plausible_email(self.email.trim()) {
            errors.push(FieldError::new("email", "enter a valid email address"));
        }

        if self.first_name.trim().len() < 2 {
            errors.push(FieldError::new(
                "firstName",
                "first name must be at least 2 characters",
            ));
        }
        if self.last_name.trim().len() < 2 {
            errors.push(FieldError::new(
                "lastName",
                "last name must be at least 2 characters",
            ));
        }

        if let Some(weakness) = password_weakness(&self.password) {
            errors.push(FieldError::new("password", weakness));
        }
        if self.confirm_password != self.password {
            errors.push(FieldError::new("confirmPassword", "passwords do not match"));
        }

        if let Some(phone) = self.phone_number.as_deref() {
            if !phone.trim().is_empty() && !plausible_phone(phone) {
                errors.push(FieldError::new("phoneNumber", "enter a valid phone number"));
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

impl core::fmt::Debug for RegisterProfile {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RegisterProfile")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("confirm_password", &"<redacted>")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("phone_number", &self.phone_number)
            .field("company_name", &self.company_name)
            .finish()
    }
}

/// Minimal structural check: `local@domain` with a dotted domain.
fn plausible_email(s: &str) -> bool {
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

/// Returns a message describing why the password is too weak, if it is.
fn password_weakness(password: &str) -> Option<&'static str> {
    if password.len() < 8 {
        return Some("password must be at least 8 characters");
    }
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !(has_upper && has_lower && has_digit) {
        return Some("password must contain an uppercase letter, a lowercase letter and a digit");
    }
    None
}

/// At least 10 significant characters from the phone alphabet.
fn plausible_phone(s: &str) -> bool {
    let significant: usize = s
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '(' | ')'))
        .count();
    significant >= 10
        && s.chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_whitespace() || matches!(c, '+' | '-' | '(' | ')'))
}
