//! Shared types, constants, and error handling

pub mod constants;
pub mod error;
