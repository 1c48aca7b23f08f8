pub mod config;
pub mod parser;
pub mod probe;
pub mod report;
pub mod runner;
pub mod suite;

// Re-export common items
pub use probe::ProbeClient;
pub use report::generate_report;
pub use runner::run_suite;
