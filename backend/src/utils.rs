use crate::error::ApiError;
use shared::{Address, EventId, RegistryError};

pub fn parse_event_id(id: &str) -> Result<EventId, ApiError> {
    id.parse::<EventId>().map_err(|_| ApiError::InvalidId(id.to_string()))
}

pub fn parse_account(raw: &str) -> Result<Address, ApiError> {
    Address::parse(raw).map_err(|e| ApiError::Registry(RegistryError::Invalid(e)))
}
