//! Command implementations for expensectl CLI

pub mod config;
pub mod expenses;
