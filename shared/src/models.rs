use serde::{Serialize, Deserialize};
use std::borrow::Borrow;
use std::fmt;
use time::OffsetDateTime;

use crate::validation::{validate_address, ValidationError};

pub type EventId = u64;

/// Opaque account or candidate identifier, compared exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        validate_address(raw)
    }

    pub(crate) fn new_unchecked(raw: &str) -> Self {
        Self(raw.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Address {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub address: Address,
    pub name: String,
    pub vote_count: u64,
}

/// Point-in-time view of a voting event. Winner fields stay empty until the
/// event is ended, and remain empty for an event ended with no candidates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VotingEvent {
    pub id: EventId,
    pub title: String,
    pub end_timestamp: i64,
    pub ended: bool,
    pub winner_address: Option<Address>,
    pub winner_vote_count: u64,
    pub candidate_count: usize,
    pub total_votes: u64,
}

/// Whom a ballot is charged to: the claimed account and the fingerprint of
/// the client it arrived from. Either one voting twice in an event is a
/// double vote.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Voter {
    pub account: Address,
    pub fingerprint: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub title: String,
    pub end_timestamp: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventResponse {
    pub event_id: EventId,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RegisterCandidateRequest {
    pub address: String,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VoteReceipt {
    pub event_id: EventId,
    pub candidate_address: Address,
    pub voter: Address,
    pub cast_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VoterStatus {
    pub event_id: EventId,
    pub account: Address,
    pub has_voted: bool,
}
