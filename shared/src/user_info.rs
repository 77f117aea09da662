use serde::{Serialize, Deserialize};
use uuid::Uuid;

use crate::models::{Address, Voter};

pub const ACCOUNT_HEADER: &str = "X-Account";

/// Per-request caller context. `account` is the identity that mutating calls
/// act as; it is `None` when the header is absent or malformed. The
/// fingerprint identifies the client itself and is what a ballot, an account
/// binding and the rate limit are charged to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    pub request_id: Uuid,
    pub account: Option<Address>,
    pub user_fingerprint: String,
    pub ip: String,
}

impl UserInfo {
    pub fn account(&self) -> Option<&Address> {
        self.account.as_ref()
    }

    pub fn voter(&self) -> Option<Voter> {
        self.account.clone().map(|account| Voter {
            account,
            fingerprint: self.user_fingerprint.clone(),
        })
    }
}

pub fn generate_server_fingerprint(ip: &str, user_agent: Option<&str>) -> String {
    use base64::engine::general_purpose::URL_SAFE;
    use base64::Engine;
    use sha2::{Sha256, Digest};

    let mut hasher = Sha256::new();
    hasher.update(ip.as_bytes());
    if let Some(ua) = user_agent {
        hasher.update(ua.as_bytes());
    }
    URL_SAFE.encode(hasher.finalize())
}

// Rocket request guard, only built for the service
#[cfg(feature = "backend")]
mod backend_impl {
    use super::*;
    use rocket::request::{FromRequest, Outcome};
    use rocket::Request;

    #[rocket::async_trait]
    impl<'r> FromRequest<'r> for UserInfo {
        type Error = ();

        async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
            let headers = req.headers();
            // honours Rocket's `ip_header` setting (X-Real-IP by default)
            let ip = req.client_ip()
                .map(|ip| ip.to_string())
                .unwrap_or_else(|| "0.0.0.0".to_string());

            let user_agent = headers.get_one("User-Agent");
            let fingerprint = super::generate_server_fingerprint(&ip, user_agent);
            let account = headers.get_one(ACCOUNT_HEADER)
                .and_then(|raw| Address::parse(raw.trim()).ok());

            Outcome::Success(UserInfo {
                request_id: Uuid::new_v4(),
                account,
                user_fingerprint: fingerprint,
                ip,
            })
        }
    }
}
