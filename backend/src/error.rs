use rocket::http::Status;
use rocket::response::Responder;
use rocket::serde::json::Json;
use shared::{Error, ErrorCode, RegistryError, ACCOUNT_HEADER};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("Invalid event ID: {0}")]
    InvalidId(String),
    #[error("Missing or invalid {ACCOUNT_HEADER} header")]
    MissingAccount,
    #[error("Account {0} is bound to another client")]
    AccountBoundElsewhere(String),
    #[error("{0}")]
    RateLimited(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ApiError::Registry(e) => e.code(),
            ApiError::InvalidId(_) => ErrorCode::InvalidArgument,
            ApiError::MissingAccount | ApiError::AccountBoundElsewhere(_) => ErrorCode::Unauthorized,
            ApiError::RateLimited(_) => ErrorCode::RateLimited,
            ApiError::Internal(_) => ErrorCode::SystemError,
        }
    }

    pub fn status(&self) -> Status {
        match self.code() {
            ErrorCode::InvalidArgument => Status::BadRequest,
            ErrorCode::Unauthorized => Status::Unauthorized,
            ErrorCode::NotFound => Status::NotFound,
            ErrorCode::Conflict => Status::Conflict,
            ErrorCode::InvalidState => Status::UnprocessableEntity,
            ErrorCode::RateLimited => Status::TooManyRequests,
            ErrorCode::SystemError => Status::InternalServerError,
        }
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for ApiError {
    fn respond_to(self, req: &'r rocket::Request<'_>) -> rocket::response::Result<'o> {
        let status = self.status();
        let body = Error::new(self.code(), self.to_string());

        rocket::Response::build_from(Json(body).respond_to(req)?)
            .status(status)
            .ok()
    }
}
