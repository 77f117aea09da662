use std::collections::HashMap;
use std::sync::Mutex;
use rocket::{State, get, post, http::Status, response::status::Created, serde::json::Json};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{debug, error, info, instrument, warn};
use shared::{models::*, user_info::UserInfo, VotingRegistry};
use crate::{
    config::ServiceConfig,
    error::ApiError,
    rate_limiter::RateLimiter,
    utils::{parse_account, parse_event_id},
};

pub struct AppState {
    pub registry: VotingRegistry,
    pub mutation_limiter: RateLimiter,
    /// First client fingerprint seen for each account. Another client
    /// presenting the same account is refused.
    account_bindings: Mutex<HashMap<Address, String>>,
}

impl AppState {
    pub fn new(config: &ServiceConfig) -> Self {
        Self {
            registry: VotingRegistry::new(),
            mutation_limiter: RateLimiter::new(
                config.max_mutations_per_window,
                config.rate_limit_window_minutes,
            ),
            account_bindings: Mutex::new(HashMap::new()),
        }
    }

    /// Resolves the caller for a mutation, checks the account is bound to this
    /// client, and charges the client's rate limit.
    fn authorize(&self, user_info: &UserInfo) -> Result<Voter, ApiError> {
        let voter = user_info.voter().ok_or_else(|| {
            debug!(ip = %user_info.ip, "Rejected mutation without account");
            ApiError::MissingAccount
        })?;

        let key = format!("mutate:{}", voter.fingerprint);
        self.mutation_limiter.check_rate_limit(&key, OffsetDateTime::now_utc())?;

        let mut bindings = self.account_bindings.lock().map_err(|e| {
            error!("Failed to acquire account binding lock: {}", e);
            ApiError::Internal("account bindings unavailable".into())
        })?;
        let bound = bindings
            .entry(voter.account.clone())
            .or_insert_with(|| voter.fingerprint.clone());
        if *bound != voter.fingerprint {
            warn!(account = %voter.account, "Account presented by a different client");
            return Err(ApiError::AccountBoundElsewhere(voter.account.to_string()));
        }
        Ok(voter)
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub events: usize,
}

#[get("/health")]
pub async fn health(state: &State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    Ok(Json(HealthResponse {
        status: "ok".into(),
        events: state.registry.event_count()?,
    }))
}

#[rocket::options("/<_..>")]
pub async fn all_options() -> Status {
    Status::Ok
}

#[instrument(skip(state, request, user_info), fields(request_id = %user_info.request_id, fingerprint = %user_info.user_fingerprint))]
#[post("/events", format = "json", data = "<request>")]
pub async fn create_event(
    state: &State<AppState>,
    request: Json<CreateEventRequest>,
    user_info: UserInfo,
) -> Result<Created<Json<CreateEventResponse>>, ApiError> {
    let creator = state.authorize(&user_info)?.account;
    let request = request.into_inner();

    let event_id = state.registry.create_voting_event(
        &request.title,
        request.end_timestamp,
        OffsetDateTime::now_utc(),
    )?;

    info!(event_id, creator = %creator, "Voting event created");
    Ok(Created::new(format!("/api/events/{}", event_id)).body(Json(CreateEventResponse { event_id })))
}

#[get("/events")]
pub async fn list_events(state: &State<AppState>) -> Result<Json<Vec<VotingEvent>>, ApiError> {
    Ok(Json(state.registry.list_voting_events()?))
}

#[get("/events/<id>")]
pub async fn get_event(state: &State<AppState>, id: &str) -> Result<Json<VotingEvent>, ApiError> {
    let event_id = parse_event_id(id)?;
    Ok(Json(state.registry.get_voting_event(event_id)?))
}

#[get("/events/<id>/candidates")]
pub async fn get_candidates(state: &State<AppState>, id: &str) -> Result<Json<Vec<Candidate>>, ApiError> {
    let event_id = parse_event_id(id)?;
    Ok(Json(state.registry.get_candidates(event_id)?))
}

#[instrument(skip(state, request, user_info), fields(request_id = %user_info.request_id, fingerprint = %user_info.user_fingerprint))]
#[post("/events/<id>/candidates", format = "json", data = "<request>")]
pub async fn register_candidate(
    state: &State<AppState>,
    id: &str,
    request: Json<RegisterCandidateRequest>,
    user_info: UserInfo,
) -> Result<Created<Json<Candidate>>, ApiError> {
    let event_id = parse_event_id(id)?;
    state.authorize(&user_info)?;
    let request = request.into_inner();

    state.registry.register_candidate(event_id, &request.address, &request.name)?;

    info!(event_id, candidate = %request.address, "Candidate registered");
    let location = format!("/api/events/{}/candidates", event_id);
    Ok(Created::new(location).body(Json(Candidate {
        address: parse_account(&request.address)?,
        name: request.name.trim().to_string(),
        vote_count: 0,
    })))
}

#[instrument(skip(state, request, user_info), fields(request_id = %user_info.request_id, fingerprint = %user_info.user_fingerprint))]
#[post("/events/<id>/votes", format = "json", data = "<request>")]
pub async fn cast_vote(
    state: &State<AppState>,
    id: &str,
    request: Json<VoteRequest>,
    user_info: UserInfo,
) -> Result<Json<VoteReceipt>, ApiError> {
    let event_id = parse_event_id(id)?;
    let voter = state.authorize(&user_info)?;
    let request = request.into_inner();
    let now = OffsetDateTime::now_utc();

    state.registry.vote(event_id, &voter, &request.address, now)?;

    debug!(event_id, voter = %voter.account, candidate = %request.address, "Vote recorded");
    Ok(Json(VoteReceipt {
        event_id,
        candidate_address: parse_account(&request.address)?,
        voter: voter.account,
        cast_at: now,
    }))
}

#[instrument(skip(state, user_info), fields(request_id = %user_info.request_id, fingerprint = %user_info.user_fingerprint))]
#[post("/events/<id>/end")]
pub async fn end_voting(
    state: &State<AppState>,
    id: &str,
    user_info: UserInfo,
) -> Result<Json<VotingEvent>, ApiError> {
    let event_id = parse_event_id(id)?;
    state.authorize(&user_info)?;

    let event = state.registry.end_voting(event_id)?;

    match &event.winner_address {
        Some(winner) => info!(event_id, %winner, votes = event.winner_vote_count, "Voting ended"),
        None => info!(event_id, "Voting ended with no candidates"),
    }
    Ok(Json(event))
}

#[get("/events/<id>/voters/<account>")]
pub async fn voter_status(
    state: &State<AppState>,
    id: &str,
    account: &str,
) -> Result<Json<VoterStatus>, ApiError> {
    let event_id = parse_event_id(id)?;
    let account = parse_account(account)?;
    let has_voted = state.registry.has_voted(event_id, &account)?;
    Ok(Json(VoterStatus { event_id, account, has_voted }))
}
