pub mod app;
pub mod routes;
pub mod config;
pub mod cors;
pub mod error;
pub mod logging;
pub mod utils;
pub mod rate_limiter;
pub mod catchers;
pub use shared::user_info;
pub use shared::{models::*, error::*, user_info::*};
pub use shared::registry::{RegistryError, VotingRegistry};

#[cfg(test)]
mod tests;
