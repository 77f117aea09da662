use rocket::{catchers, routes, Build, Rocket};
use rocket::figment::Figment;

use crate::{
    catchers::{bad_request, internal_error, not_found, too_many_requests, unauthorized, unprocessable},
    config::ServiceConfig,
    cors::Cors,
    routes::{
        all_options, cast_vote, create_event, end_voting, get_candidates, get_event, health,
        list_events, register_candidate, voter_status, AppState,
    },
};

pub fn build(figment: Figment, config: ServiceConfig) -> Rocket<Build> {
    let app_state = AppState::new(&config);
    if !app_state.mutation_limiter.is_enabled() {
        tracing::warn!("Mutation rate limiting disabled");
    }

    rocket::custom(figment)
        .attach(Cors::new(config.allowed_origin.clone()))
        .manage(app_state)
        .manage(config)
        .mount(
            "/api",
            routes![
                health,
                all_options,
                create_event,
                list_events,
                get_event,
                get_candidates,
                register_candidate,
                cast_vote,
                end_voting,
                voter_status,
            ],
        )
        .register(
            "/",
            catchers![
                bad_request,
                unauthorized,
                not_found,
                unprocessable,
                too_many_requests,
                internal_error,
            ],
        )
}
