pub mod error;
pub mod models;
pub mod validation;
pub mod user_info;
pub mod registry;

pub use error::{Error, ErrorCode, Result};
pub use models::*;
pub use validation::*;
pub use user_info::*;
pub use registry::{RegistryError, RegistryResult, VotingRegistry};
