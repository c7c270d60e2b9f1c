//! Command implementations.

pub mod list;
pub mod serve;
