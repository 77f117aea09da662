use rocket::{Request, catch, serde::json::Json};
use serde::Serialize;
use shared::ErrorCode;

#[derive(Serialize)]
pub struct ErrorMessage {
    error: String,
    code: ErrorCode,
    status: u16,
}

fn message(error: &str, code: ErrorCode, status: u16) -> Json<ErrorMessage> {
    Json(ErrorMessage { error: error.into(), code, status })
}

#[catch(400)]
pub fn bad_request(_req: &Request) -> Json<ErrorMessage> {
    message("Invalid request parameters.", ErrorCode::InvalidArgument, 400)
}

#[catch(401)]
pub fn unauthorized(_req: &Request) -> Json<ErrorMessage> {
    message("A valid X-Account header is required.", ErrorCode::Unauthorized, 401)
}

#[catch(404)]
pub fn not_found(_req: &Request) -> Json<ErrorMessage> {
    message("The requested resource was not found.", ErrorCode::NotFound, 404)
}

#[catch(422)]
pub fn unprocessable(_req: &Request) -> Json<ErrorMessage> {
    message("Malformed request body.", ErrorCode::InvalidArgument, 422)
}

#[catch(429)]
pub fn too_many_requests(_req: &Request) -> Json<ErrorMessage> {
    message("Rate limit exceeded. Please wait before trying again.", ErrorCode::RateLimited, 429)
}

#[catch(500)]
pub fn internal_error(_req: &Request) -> Json<ErrorMessage> {
    message("An internal server error occurred.", ErrorCode::SystemError, 500)
}
