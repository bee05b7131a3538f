//! Database layer - shared connection and repositories
//!
//! # Design Principles
//!
//! - One provider per process, injected; no global client
//! - Connect lazily, at most once per provider (see [`InitPolicy`])
//! - Each repository call is one independent request; no transactions
//! - No retries: the first failure is returned to the caller

pub mod provider;
pub mod repos;

pub use provider::{ConnectionProvider, InitPolicy};
pub use repos::*;
