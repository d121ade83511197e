// ABOUTME: Library root for stagegate - exposes public types for testing.
// ABOUTME: The main binary is in main.rs.

pub mod approval;
pub mod cm;
pub mod config;
pub mod error;
pub mod itsm;
pub mod output;
pub mod types;
