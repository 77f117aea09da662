use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use thiserror::Error;
use time::OffsetDateTime;

use crate::error::{Error, ErrorCode};
use crate::models::{Address, Candidate, EventId, Voter, VotingEvent};
use crate::validation::{validate_candidate_name, validate_title, ValidationError};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Voting event {0} not found")] EventNotFound(EventId),
    #[error("Candidate {address} is not registered for event {event_id}")]
    CandidateNotFound { event_id: EventId, address: String },
    #[error("Candidate {address} is already registered for event {event_id}")]
    DuplicateCandidate { event_id: EventId, address: Address },
    #[error("Account {account} has already voted in event {event_id}")]
    AlreadyVoted { event_id: EventId, account: Address },
    #[error("A ballot from this client was already cast in event {0}")] DuplicateBallotSource(EventId),
    #[error("Voting event {0} has already ended")] EventEnded(EventId),
    #[error("Voting period for event {0} has expired")] VotingExpired(EventId),
    #[error("End time {end_timestamp} is not after current time {now}")]
    EndTimeNotInFuture { end_timestamp: i64, now: i64 },
    #[error(transparent)] Invalid(#[from] ValidationError),
    #[error("Registry lock poisoned")] LockPoisoned,
}

impl RegistryError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::EventNotFound(_) | Self::CandidateNotFound { .. } => ErrorCode::NotFound,
            Self::DuplicateCandidate { .. }
            | Self::AlreadyVoted { .. }
            | Self::DuplicateBallotSource(_) => ErrorCode::Conflict,
            Self::EventEnded(_) | Self::VotingExpired(_) => ErrorCode::InvalidState,
            Self::EndTimeNotInFuture { .. } | Self::Invalid(_) => ErrorCode::InvalidArgument,
            Self::LockPoisoned => ErrorCode::SystemError,
        }
    }
}

impl From<RegistryError> for Error {
    fn from(err: RegistryError) -> Self {
        Error::new(err.code(), err.to_string())
    }
}

pub type RegistryResult<T> = std::result::Result<T, RegistryError>;

#[derive(Debug)]
struct EventRecord {
    id: EventId,
    title: String,
    end_timestamp: i64,
    ended: bool,
    winner: Option<(Address, u64)>,
    candidates: Vec<Candidate>,
    positions: HashMap<Address, usize>,
    voters: HashSet<Address>,
    ballot_sources: HashSet<String>,
}

impl EventRecord {
    fn new(id: EventId, title: String, end_timestamp: i64) -> Self {
        Self {
            id,
            title,
            end_timestamp,
            ended: false,
            winner: None,
            candidates: Vec::new(),
            positions: HashMap::new(),
            voters: HashSet::new(),
            ballot_sources: HashSet::new(),
        }
    }

    fn ensure_open(&self) -> RegistryResult<()> {
        if self.ended {
            return Err(RegistryError::EventEnded(self.id));
        }
        Ok(())
    }

    fn total_votes(&self) -> u64 {
        self.candidates.iter().map(|c| c.vote_count).sum()
    }

    /// Highest tally wins; among equal tallies the earliest registration wins.
    fn leading_candidate(&self) -> Option<&Candidate> {
        self.candidates.iter().fold(None, |best: Option<&Candidate>, c| match best {
            Some(b) if b.vote_count >= c.vote_count => Some(b),
            _ => Some(c),
        })
    }

    fn snapshot(&self) -> VotingEvent {
        let (winner_address, winner_vote_count) = match &self.winner {
            Some((address, votes)) => (Some(address.clone()), *votes),
            None => (None, 0),
        };
        VotingEvent {
            id: self.id,
            title: self.title.clone(),
            end_timestamp: self.end_timestamp,
            ended: self.ended,
            winner_address,
            winner_vote_count,
            candidate_count: self.candidates.len(),
            total_votes: self.total_votes(),
        }
    }
}

/// In-memory store of voting events.
///
/// The event list is behind a `RwLock` that is only written when an event is
/// created. Each event has its own `Mutex`, so registration appends and the
/// voter check-and-tally in [`VotingRegistry::vote`] happen under one guard.
#[derive(Debug, Default)]
pub struct VotingRegistry {
    events: RwLock<Vec<Arc<Mutex<EventRecord>>>>,
}

impl VotingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn event(&self, event_id: EventId) -> RegistryResult<Arc<Mutex<EventRecord>>> {
        let events = self.events.read().map_err(|_| RegistryError::LockPoisoned)?;
        event_id
            .checked_sub(1)
            .and_then(|idx| usize::try_from(idx).ok())
            .and_then(|idx| events.get(idx))
            .cloned()
            .ok_or(RegistryError::EventNotFound(event_id))
    }

    fn lock(record: &Mutex<EventRecord>) -> RegistryResult<MutexGuard<'_, EventRecord>> {
        record.lock().map_err(|_| RegistryError::LockPoisoned)
    }

    pub fn create_voting_event(
        &self,
        title: &str,
        end_timestamp: i64,
        now: OffsetDateTime,
    ) -> RegistryResult<EventId> {
        let title = validate_title(title)?;
        let now = now.unix_timestamp();
        if end_timestamp <= now {
            return Err(RegistryError::EndTimeNotInFuture { end_timestamp, now });
        }

        let mut events = self.events.write().map_err(|_| RegistryError::LockPoisoned)?;
        let id = events.len() as EventId + 1;
        events.push(Arc::new(Mutex::new(EventRecord::new(id, title.to_string(), end_timestamp))));
        Ok(id)
    }

    pub fn register_candidate(&self, event_id: EventId, address: &str, name: &str) -> RegistryResult<()> {
        let address = Address::parse(address)?;
        let name = validate_candidate_name(name)?;

        let record = self.event(event_id)?;
        let mut event = Self::lock(&record)?;
        event.ensure_open()?;
        if event.positions.contains_key(&address) {
            return Err(RegistryError::DuplicateCandidate { event_id, address });
        }

        let position = event.candidates.len();
        event.positions.insert(address.clone(), position);
        event.candidates.push(Candidate {
            address,
            name: name.to_string(),
            vote_count: 0,
        });
        Ok(())
    }

    /// Records one vote from `voter`. The eligibility checks and the tally
    /// update share the event guard, so a second concurrent call from the
    /// same account or client observes the first one's voter record.
    pub fn vote(
        &self,
        event_id: EventId,
        voter: &Voter,
        candidate: &str,
        now: OffsetDateTime,
    ) -> RegistryResult<()> {
        let record = self.event(event_id)?;
        let mut event = Self::lock(&record)?;
        event.ensure_open()?;
        if now.unix_timestamp() >= event.end_timestamp {
            return Err(RegistryError::VotingExpired(event_id));
        }

        let position = *event.positions.get(candidate).ok_or_else(|| {
            RegistryError::CandidateNotFound { event_id, address: candidate.to_string() }
        })?;
        if event.voters.contains(&voter.account) {
            return Err(RegistryError::AlreadyVoted { event_id, account: voter.account.clone() });
        }
        if event.ballot_sources.contains(&voter.fingerprint) {
            return Err(RegistryError::DuplicateBallotSource(event_id));
        }

        event.voters.insert(voter.account.clone());
        event.ballot_sources.insert(voter.fingerprint.clone());
        event.candidates[position].vote_count += 1;
        Ok(())
    }

    /// Ends the event and fixes its winner. Returns the final snapshot.
    pub fn end_voting(&self, event_id: EventId) -> RegistryResult<VotingEvent> {
        let record = self.event(event_id)?;
        let mut event = Self::lock(&record)?;
        event.ensure_open()?;

        let winner = event
            .leading_candidate()
            .map(|c| (c.address.clone(), c.vote_count));
        event.winner = winner;
        event.ended = true;
        Ok(event.snapshot())
    }

    pub fn get_voting_event(&self, event_id: EventId) -> RegistryResult<VotingEvent> {
        let record = self.event(event_id)?;
        let event = Self::lock(&record)?;
        Ok(event.snapshot())
    }

    pub fn get_candidates(&self, event_id: EventId) -> RegistryResult<Vec<Candidate>> {
        let record = self.event(event_id)?;
        let event = Self::lock(&record)?;
        Ok(event.candidates.clone())
    }

    pub fn has_voted(&self, event_id: EventId, account: &Address) -> RegistryResult<bool> {
        let record = self.event(event_id)?;
        let event = Self::lock(&record)?;
        Ok(event.voters.contains(account))
    }

    pub fn list_voting_events(&self) -> RegistryResult<Vec<VotingEvent>> {
        let records: Vec<_> = self.events.read()
            .map_err(|_| RegistryError::LockPoisoned)?
            .iter()
            .cloned()
            .collect();

        records.iter()
            .map(|record| Self::lock(record).map(|event| event.snapshot()))
            .collect()
    }

    pub fn event_count(&self) -> RegistryResult<usize> {
        Ok(self.events.read().map_err(|_| RegistryError::LockPoisoned)?.len())
    }
}
