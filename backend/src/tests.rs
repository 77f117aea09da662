#[cfg(test)]
mod tests {
    use rocket::http::{ContentType, Header, Status};
    use rocket::local::blocking::{Client, LocalResponse};
    use serde_json::{json, Value};
    use time::{Duration, OffsetDateTime};
    use shared::{Candidate, CreateEventResponse, VoteReceipt, VoterStatus, VotingEvent};
    use crate::{app, config::ServiceConfig, rate_limiter::RateLimiter, routes::HealthResponse};

    fn client_with(config: ServiceConfig) -> Client {
        let figment = rocket::Config::figment().merge(("log_level", "off"));
        Client::tracked(app::build(figment, config)).unwrap()
    }

    fn client() -> Client {
        client_with(ServiceConfig { max_mutations_per_window: 0, ..ServiceConfig::default() })
    }

    fn as_account(account: &str) -> Header<'static> {
        Header::new("X-Account", account.to_string())
    }

    /// Stable client address per account, so each test account is its own client.
    fn ip_of(account: &str) -> String {
        let n = account.bytes().fold(7u32, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u32));
        format!("10.{}.{}.{}", (n >> 16) & 0xff, (n >> 8) & 0xff, n & 0xff)
    }

    fn in_one_hour() -> i64 {
        (OffsetDateTime::now_utc() + Duration::hours(1)).unix_timestamp()
    }

    fn send<'c>(client: &'c Client, uri: String, account: &str, ip: &str, body: Value) -> LocalResponse<'c> {
        client.post(uri)
            .header(ContentType::JSON)
            .header(as_account(account))
            .header(Header::new("X-Real-IP", ip.to_string()))
            .body(body.to_string())
            .dispatch()
    }

    fn post<'c>(client: &'c Client, uri: String, account: &str, body: Value) -> LocalResponse<'c> {
        send(client, uri, account, &ip_of(account), body)
    }

    fn end<'c>(client: &'c Client, id: u64) -> LocalResponse<'c> {
        client.post(format!("/api/events/{id}/end"))
            .header(as_account("0xCreator"))
            .header(Header::new("X-Real-IP", ip_of("0xCreator")))
            .dispatch()
    }

    fn error_code(response: LocalResponse<'_>) -> String {
        let body: Value = response.into_json().unwrap();
        body["code"].as_str().unwrap().to_string()
    }

    fn create_event(client: &Client, title: &str) -> u64 {
        let response = post(client, "/api/events".into(), "0xCreator", json!({
            "title": title,
            "endTimestamp": in_one_hour(),
        }));
        assert_eq!(response.status(), Status::Created);
        response.into_json::<CreateEventResponse>().unwrap().event_id
    }

    fn register(client: &Client, id: u64, address: &str, name: &str) -> Status {
        post(client, format!("/api/events/{id}/candidates"), "0xCreator", json!({
            "address": address,
            "name": name,
        }))
        .status()
    }

    fn vote<'c>(client: &'c Client, id: u64, voter: &str, candidate: &str) -> LocalResponse<'c> {
        post(client, format!("/api/events/{id}/votes"), voter, json!({ "address": candidate }))
    }

    #[test]
    fn test_council_vote_over_http() {
        let client = client();
        let id = create_event(&client, "Council Vote");
        assert_eq!(id, 1);
        assert_eq!(register(&client, id, "0xAA", "Alice"), Status::Created);
        assert_eq!(register(&client, id, "0xBB", "Bob"), Status::Created);

        let receipt: VoteReceipt = vote(&client, id, "0xX", "0xAA").into_json().unwrap();
        assert_eq!(receipt.event_id, id);
        assert_eq!(receipt.candidate_address.as_str(), "0xAA");
        assert_eq!(receipt.voter.as_str(), "0xX");

        let second = vote(&client, id, "0xX", "0xBB");
        assert_eq!(second.status(), Status::Conflict);
        assert_eq!(error_code(second), "conflict");

        assert_eq!(end(&client, id).status(), Status::Ok);

        let event: VotingEvent = client.get(format!("/api/events/{id}")).dispatch().into_json().unwrap();
        assert!(event.ended);
        assert_eq!(event.winner_address.as_ref().map(|a| a.as_str()), Some("0xAA"));
        assert_eq!(event.winner_vote_count, 1);

        let candidates: Vec<Candidate> = client.get(format!("/api/events/{id}/candidates")).dispatch().into_json().unwrap();
        let tallies: Vec<_> = candidates.iter().map(|c| (c.name.as_str(), c.vote_count)).collect();
        assert_eq!(tallies, [("Alice", 1), ("Bob", 0)]);
    }

    #[test]
    fn test_mutations_require_account() {
        let client = client();
        let response = client.post("/api/events")
            .header(ContentType::JSON)
            .body(json!({ "title": "No Account", "endTimestamp": in_one_hour() }).to_string())
            .dispatch();
        assert_eq!(response.status(), Status::Unauthorized);
        assert_eq!(error_code(response), "unauthorized");

        let malformed = post(&client, "/api/events".into(), "0x bad", json!({
            "title": "Bad Account",
            "endTimestamp": in_one_hour(),
        }));
        assert_eq!(malformed.status(), Status::Unauthorized);

        let events: Vec<VotingEvent> = client.get("/api/events").dispatch().into_json().unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn test_error_statuses() {
        let client = client();
        let missing = client.get("/api/events/5").dispatch();
        assert_eq!(missing.status(), Status::NotFound);
        assert_eq!(error_code(missing), "notFound");

        let bad_id = client.get("/api/events/five").dispatch();
        assert_eq!(bad_id.status(), Status::BadRequest);
        assert_eq!(error_code(bad_id), "invalidArgument");

        let past = post(&client, "/api/events".into(), "0xCreator", json!({
            "title": "Too Late",
            "endTimestamp": OffsetDateTime::now_utc().unix_timestamp() - 60,
        }));
        assert_eq!(past.status(), Status::BadRequest);
        assert_eq!(error_code(past), "invalidArgument");

        let id = create_event(&client, "Errors");
        assert_eq!(register(&client, id, "0xAA", ""), Status::BadRequest);
        assert_eq!(register(&client, id, "0xAA", "Alice"), Status::Created);
        assert_eq!(register(&client, id, "0xAA", "Alice"), Status::Conflict);
        assert_eq!(vote(&client, id, "0x1", "0xZZ").status(), Status::NotFound);

        assert_eq!(end(&client, id).status(), Status::Ok);
        let again = end(&client, id);
        assert_eq!(again.status(), Status::UnprocessableEntity);
        assert_eq!(error_code(again), "invalidState");
        assert_eq!(vote(&client, id, "0x1", "0xAA").status(), Status::UnprocessableEntity);
    }

    #[test]
    fn test_end_without_candidates() {
        let client = client();
        let id = create_event(&client, "Empty");
        let event: VotingEvent = end(&client, id).into_json().unwrap();
        assert!(event.ended);
        assert!(event.winner_address.is_none());
        assert_eq!(event.winner_vote_count, 0);

        let candidates: Vec<Candidate> = client.get(format!("/api/events/{id}/candidates")).dispatch().into_json().unwrap();
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_voter_status() {
        let client = client();
        let id = create_event(&client, "Status");
        register(&client, id, "0xAA", "Alice");
        vote(&client, id, "0x1", "0xAA");

        let voted: VoterStatus = client.get(format!("/api/events/{id}/voters/0x1")).dispatch().into_json().unwrap();
        assert!(voted.has_voted);
        let fresh: VoterStatus = client.get(format!("/api/events/{id}/voters/0x2")).dispatch().into_json().unwrap();
        assert!(!fresh.has_voted);
        assert_eq!(client.get("/api/events/9/voters/0x1").dispatch().status(), Status::NotFound);
    }

    #[test]
    fn test_rate_limit_on_mutations() {
        let client = client_with(ServiceConfig { max_mutations_per_window: 2, ..ServiceConfig::default() });
        let id = create_event(&client, "Limited");
        assert_eq!(register(&client, id, "0xAA", "Alice"), Status::Created);

        let limited = post(&client, format!("/api/events/{id}/candidates"), "0xCreator", json!({
            "address": "0xBB",
            "name": "Bob",
        }));
        assert_eq!(limited.status(), Status::TooManyRequests);
        assert_eq!(error_code(limited), "rateLimited");

        // other clients and reads are unaffected
        assert_eq!(vote(&client, id, "0x1", "0xAA").status(), Status::Ok);
        assert_eq!(client.get(format!("/api/events/{id}")).dispatch().status(), Status::Ok);
    }

    #[test]
    fn test_rate_limiter_window() {
        let limiter = RateLimiter::new(2, 1);
        let start = OffsetDateTime::now_utc();
        assert!(limiter.check_rate_limit("k", start).is_ok());
        assert!(limiter.check_rate_limit("k", start).is_ok());
        assert!(limiter.check_rate_limit("k", start + Duration::seconds(30)).is_err());
        assert!(limiter.check_rate_limit("other", start).is_ok());
        assert!(limiter.check_rate_limit("k", start + Duration::seconds(61)).is_ok());

        let disabled = RateLimiter::new(0, 1);
        assert!(!disabled.is_enabled());
        assert!((0..100).all(|_| disabled.check_rate_limit("k", start).is_ok()));
    }

    #[test]
    fn test_rate_limiter_window_is_clamped() {
        let start = OffsetDateTime::now_utc();

        let huge = RateLimiter::new(1, i64::MAX);
        assert!(huge.check_rate_limit("k", start).is_ok());
        assert!(huge.check_rate_limit("k", start + Duration::days(6)).is_err());
        assert!(huge.check_rate_limit("k", start + Duration::weeks(1) + Duration::seconds(1)).is_ok());

        let negative = RateLimiter::new(1, -5);
        assert!(negative.check_rate_limit("k", start).is_ok());
        assert!(negative.check_rate_limit("k", start + Duration::seconds(30)).is_err());
        assert!(negative.check_rate_limit("k", start + Duration::seconds(61)).is_ok());
    }

    #[test]
    fn test_changing_account_header_does_not_allow_second_vote() {
        let client = client();
        let id = create_event(&client, "Sybil");
        register(&client, id, "0xAA", "Alice");

        let uri = format!("/api/events/{id}/votes");
        let first = send(&client, uri.clone(), "0xFAKE0", "10.9.9.9", json!({ "address": "0xAA" }));
        assert_eq!(first.status(), Status::Ok);
        for i in 1..4 {
            let account = format!("0xFAKE{i}");
            let again = send(&client, uri.clone(), &account, "10.9.9.9", json!({ "address": "0xAA" }));
            assert_eq!(again.status(), Status::Conflict);
            assert_eq!(error_code(again), "conflict");
        }

        let event: VotingEvent = client.get(format!("/api/events/{id}")).dispatch().into_json().unwrap();
        assert_eq!(event.total_votes, 1);

        let elsewhere = send(&client, uri, "0xOther", "10.9.9.10", json!({ "address": "0xAA" }));
        assert_eq!(elsewhere.status(), Status::Ok);
        let event: VotingEvent = client.get(format!("/api/events/{id}")).dispatch().into_json().unwrap();
        assert_eq!(event.total_votes, 2);
    }

    #[test]
    fn test_account_stays_with_first_client() {
        let client = client();
        let body = || json!({ "title": "Bound", "endTimestamp": in_one_hour() });

        let home = send(&client, "/api/events".into(), "0xBound", "10.1.1.1", body());
        assert_eq!(home.status(), Status::Created);

        let stolen = send(&client, "/api/events".into(), "0xBound", "10.1.1.2", body());
        assert_eq!(stolen.status(), Status::Unauthorized);
        assert_eq!(error_code(stolen), "unauthorized");

        let back = send(&client, "/api/events".into(), "0xBound", "10.1.1.1", body());
        assert_eq!(back.status(), Status::Created);

        let events: Vec<VotingEvent> = client.get("/api/events").dispatch().into_json().unwrap();
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_health_and_catchers() {
        let client = client();
        create_event(&client, "One");
        let health: HealthResponse = client.get("/api/health").dispatch().into_json().unwrap();
        assert_eq!(health.status, "ok");
        assert_eq!(health.events, 1);

        let unknown = client.get("/nowhere").dispatch();
        assert_eq!(unknown.status(), Status::NotFound);
        assert_eq!(error_code(unknown), "notFound");

        let malformed = client.post("/api/events")
            .header(ContentType::JSON)
            .header(as_account("0xCreator"))
            .body("{\"title\": 5}")
            .dispatch();
        assert_eq!(malformed.status(), Status::UnprocessableEntity);
    }

    #[test]
    fn test_cors_preflight() {
        let client = client();
        let response = client.options("/api/events")
            .header(Header::new("Origin", "http://localhost:5173"))
            .dispatch();
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(
            response.headers().get_one("Access-Control-Allow-Origin"),
            Some("http://localhost:5173")
        );

        let foreign = client.options("/api/events")
            .header(Header::new("Origin", "https://evil.example"))
            .dispatch();
        assert!(foreign.headers().get_one("Access-Control-Allow-Origin").is_none());
    }

    #[test]
    fn test_config_defaults_from_figment() {
        let figment = rocket::Config::figment()
            .merge(("max_mutations_per_window", 5))
            .merge(("log_format", "json"));
        let config = ServiceConfig::from_figment(&figment).unwrap();
        assert_eq!(config.max_mutations_per_window, 5);
        assert_eq!(config.log_format, crate::logging::LogFormat::Json);
        assert_eq!(config.allowed_origin, "http://localhost");
        assert_eq!(config.rate_limit_window_minutes, 1);
    }
}
