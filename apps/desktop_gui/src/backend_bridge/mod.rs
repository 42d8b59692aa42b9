//! Worker thread owning the async runtime that performs transfers.

pub mod commands;
pub mod runtime;
