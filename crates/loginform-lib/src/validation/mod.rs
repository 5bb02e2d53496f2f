// ============================
// crates/loginform-lib/src/validation/mod.rs
// ============================
//! Form validation module.
//!
//! Everything here is pure: the controller calls these before any remote
//! call is made, and the page uses them for live field feedback.

use loginform_common::{LoginCredentials, PasswordStrength, SignupForm};
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

/// Minimum password length accepted at signup
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Special characters that count towards strength and are allowed in passwords
pub const PASSWORD_SPECIALS: &str = "@$!%*?&";

/// Whitespace as the browser sees it: includes U+FEFF, excludes U+0085
const WHITESPACE_CLASS: &str =
    r"\t\n\x0B\x0C\r \x{A0}\x{1680}\x{2000}-\x{200A}\x{2028}\x{2029}\x{202F}\x{205F}\x{3000}\x{FEFF}";

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    let part = format!("[^{WHITESPACE_CLASS}@]+");
    Regex::new(&format!(r"^{part}@{part}\.{part}$")).expect("email regex is valid")
});
static PASSWORD_CHARSET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9@$!%*?&]+$").expect("password regex is valid"));

/// Possible validation errors, in the order signup checks them.
///
/// The `Display` text is the message shown to the user.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please fill in all fields.")]
    MissingFields,

    #[error("Please enter a valid email address.")]
    InvalidEmail,

    #[error("Password must be at least 8 characters with uppercase, lowercase, and number.")]
    WeakPassword,

    #[error("Passwords do not match.")]
    PasswordMismatch,

    #[error("Please agree to the terms and conditions.")]
    TermsNotAccepted,
}

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Visual state of an input after live validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldState {
    Neutral,
    Invalid,
}

/// Whether `c` counts as whitespace in form input
pub fn is_input_whitespace(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\u{0B}' | '\u{0C}' | '\r' | ' '
            | '\u{A0}'
            | '\u{1680}'
            | '\u{2000}'..='\u{200A}'
            | '\u{2028}'
            | '\u{2029}'
            | '\u{202F}'
            | '\u{205F}'
            | '\u{3000}'
            | '\u{FEFF}'
    )
}

/// Strip leading and trailing input whitespace from a text field
pub fn trim_input(value: &str) -> &str {
    value.trim_matches(is_input_whitespace)
}

/// Check an email address: one `@`, no whitespace, a dot somewhere after the `@`
pub fn validate_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

/// Check a signup password.
///
/// At least [`MIN_PASSWORD_LENGTH`] characters, one lowercase, one uppercase
/// and one digit, using only letters, digits and [`PASSWORD_SPECIALS`].
pub fn validate_password(password: &str) -> bool {
    password.len() >= MIN_PASSWORD_LENGTH
        && PASSWORD_CHARSET_REGEX.is_match(password)
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
}

/// Score a password for the strength indicator
pub fn password_strength(password: &str) -> PasswordStrength {
    // length is counted in UTF-16 units, the same unit the page counts in
    let checks = [
        password.encode_utf16().count() >= MIN_PASSWORD_LENGTH,
        password.chars().any(|c| c.is_ascii_lowercase()),
        password.chars().any(|c| c.is_ascii_uppercase()),
        password.chars().any(|c| c.is_ascii_digit()),
        password.chars().any(|c| PASSWORD_SPECIALS.contains(c)),
    ];
    let score = checks.iter().filter(|ok| **ok).count();

    match score {
        0 | 1 => PasswordStrength::Weak,
        2 => PasswordStrength::Medium,
        3 => PasswordStrength::Strong,
        _ => PasswordStrength::VeryStrong,
    }
}

/// Validate the login form. The email is expected to be trimmed already.
pub fn validate_login(credentials: &LoginCredentials) -> ValidationResult<()> {
    if credentials.email.is_empty() || credentials.password.is_empty() {
        return Err(ValidationError::MissingFields);
    }

    if !validate_email(&credentials.email) {
        return Err(ValidationError::InvalidEmail);
    }

    Ok(())
}

/// Validate the signup form; the first failing check wins
pub fn validate_signup(form: &SignupForm) -> ValidationResult<()> {
    if form.name.is_empty()
        || form.email.is_empty()
        || form.password.is_empty()
        || form.confirm_password.is_empty()
    {
        return Err(ValidationError::MissingFields);
    }

    if !validate_email(&form.email) {
        return Err(ValidationError::InvalidEmail);
    }

    if !validate_password(&form.password) {
        return Err(ValidationError::WeakPassword);
    }

    if form.password != form.confirm_password {
        return Err(ValidationError::PasswordMismatch);
    }

    if !form.agree_terms {
        return Err(ValidationError::TermsNotAccepted);
    }

    Ok(())
}

/// Feedback for an email input when it loses focus
pub fn email_field_state(value: &str) -> FieldState {
    if !value.is_empty() && !validate_email(value) {
        FieldState::Invalid
    } else {
        FieldState::Neutral
    }
}

/// Feedback for the confirm-password input while typing
pub fn confirm_field_state(password: &str, confirm: &str) -> FieldState {
    if !confirm.is_empty() && confirm != password {
        FieldState::Invalid
    } else {
        FieldState::Neutral
    }
}
