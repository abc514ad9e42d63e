use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Username cannot be empty")]
    EmptyUsername,

    #[error("Username must start with a lowercase letter")]
    UsernameStart,

    #[error("Username may only contain lowercase letters, digits, '_' or '-'")]
    UsernameChars,

    #[error("Password cannot be empty")]
    EmptyPassword,

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Unknown timezone '{0}'")]
    UnknownTimezone(String),
}

/// `^[a-z][a-z0-9_-]*$`
pub fn validate_username(name: &str) -> Result<(), ValidationError> {
    let mut chars = name.chars();
    match chars.next() {
        None => return Err(ValidationError::EmptyUsername),
        Some(c) if !c.is_ascii_lowercase() => return Err(ValidationError::UsernameStart),
        Some(_) => {}
    }

    if chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-') {
        Ok(())
    } else {
        Err(ValidationError::UsernameChars)
    }
}

pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        Err(ValidationError::EmptyPassword)
    } else {
        Ok(())
    }
}

/// Both entries must be non-empty and identical.
pub fn check_password_pair(password: &str, confirmation: &str) -> Result<(), ValidationError> {
    validate_password(password)?;
    if password != confirmation {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(())
}

pub fn validate_timezone(tz: &str, known: &[String]) -> Result<(), ValidationError> {
    if known.iter().any(|k| k == tz) {
        Ok(())
    } else {
        Err(ValidationError::UnknownTimezone(tz.to_string()))
    }
}
