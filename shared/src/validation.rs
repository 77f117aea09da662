use crate::models::Address;

pub const MAX_TITLE_LENGTH: usize = 100;
pub const MAX_NAME_LENGTH: usize = 40;
pub const MAX_ADDRESS_LENGTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Title must not be empty")]
    EmptyTitle,
    #[error("Title exceeds maximum length of {MAX_TITLE_LENGTH}")]
    TitleTooLong,
    #[error("Candidate name must not be empty")]
    EmptyName,
    #[error("Candidate name exceeds maximum length of {MAX_NAME_LENGTH}")]
    NameTooLong,
    #[error("Address must not be empty")]
    EmptyAddress,
    #[error("Address exceeds maximum length of {MAX_ADDRESS_LENGTH}")]
    AddressTooLong,
    #[error("Address must not contain whitespace: {0:?}")]
    MalformedAddress(String),
}

/// Returns the trimmed title.
pub fn validate_title(title: &str) -> Result<&str, ValidationError> {
    let title = title.trim();
    if title.is_empty() { return Err(ValidationError::EmptyTitle); }
    if title.chars().count() > MAX_TITLE_LENGTH { return Err(ValidationError::TitleTooLong); }
    Ok(title)
}

/// Returns the trimmed candidate name.
pub fn validate_candidate_name(name: &str) -> Result<&str, ValidationError> {
    let name = name.trim();
    if name.is_empty() { return Err(ValidationError::EmptyName); }
    if name.chars().count() > MAX_NAME_LENGTH { return Err(ValidationError::NameTooLong); }
    Ok(name)
}

pub fn validate_address(raw: &str) -> Result<Address, ValidationError> {
    if raw.is_empty() { return Err(ValidationError::EmptyAddress); }
    if raw.len() > MAX_ADDRESS_LENGTH { return Err(ValidationError::AddressTooLong); }
    if raw.chars().any(char::is_whitespace) {
        return Err(ValidationError::MalformedAddress(raw.to_string()));
    }
    Ok(Address::new_unchecked(raw))
}
