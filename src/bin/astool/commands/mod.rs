//! Command implementations

pub mod completions;
pub mod configs;
pub mod deploy;
pub mod export;
pub mod sync;
