pub mod checks;
pub mod client;
pub mod outcome;

pub use client::ProbeClient;
pub use outcome::{ProbeFailure, ProbeResult};
