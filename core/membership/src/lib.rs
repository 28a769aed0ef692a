mod config;
mod engine;
mod error;

pub use config::MembershipConfig;
pub use engine::{JoinOutcome, MembershipEngine};
pub use error::Error;
