//! Client configuration and session state

pub mod config;
pub mod session;

pub use config::{CloudConfig, DEFAULT_API_BASE_URL};
pub use session::{CloudClient, ShardEndpoint};
