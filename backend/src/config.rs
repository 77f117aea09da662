use rocket::figment::{providers::Env, Figment};
use serde::{Deserialize, Serialize};

use crate::logging::LogFormat;

const ENV_PREFIX: &str = "VOTING_";

/// Service settings layered on top of Rocket's own figment: `Rocket.toml`,
/// `ROCKET_*` variables, then `VOTING_*` variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    #[serde(default)]
    pub log_format: LogFormat,
    /// Browser origins starting with this prefix receive CORS headers.
    #[serde(default = "default_allowed_origin")]
    pub allowed_origin: String,
    /// Mutating calls allowed per account per window. `0` disables limiting.
    #[serde(default = "default_max_mutations")]
    pub max_mutations_per_window: u32,
    #[serde(default = "default_window_minutes")]
    pub rate_limit_window_minutes: i64,
}

fn default_log_filter() -> String {
    "info".into()
}

fn default_allowed_origin() -> String {
    "http://localhost".into()
}

fn default_max_mutations() -> u32 {
    30
}

fn default_window_minutes() -> i64 {
    1
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter(),
            log_format: LogFormat::default(),
            allowed_origin: default_allowed_origin(),
            max_mutations_per_window: default_max_mutations(),
            rate_limit_window_minutes: default_window_minutes(),
        }
    }
}

impl ServiceConfig {
    pub fn figment() -> Figment {
        rocket::Config::figment().merge(Env::prefixed(ENV_PREFIX).global())
    }

    pub fn from_figment(figment: &Figment) -> Result<Self, rocket::figment::Error> {
        figment.extract()
    }
}
