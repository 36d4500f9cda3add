// Library module for gdsync
// Re-exports modules for use in integration tests and external crates

pub mod bridge;
pub mod config;
pub mod entitlement;
pub mod game;
pub mod sync;
