pub mod config;
pub mod models;
pub mod utils;
pub mod concurrent;
pub mod probe;
pub mod discover;
pub mod external;
pub mod http_client;
pub mod output;
pub mod pipeline;

pub use crate::config::ReconConfig;
pub use crate::models::HostRecord;
pub use crate::pipeline::{Collaborators, Recon, RunOutcome, RunResult};
