pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, ProfileTarget, SiteTargets};
pub use error::ProbeError;
pub use types::*;
