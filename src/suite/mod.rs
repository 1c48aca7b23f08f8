pub mod contract;
pub mod diagnostics;
