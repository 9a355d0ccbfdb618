//! Shared data model for moodmix: mood axes, the upstream wire schema, the
//! playlist document the player consumes, and user configuration.

pub mod config;
pub mod mood;
pub mod platform;
pub mod playlist;
pub mod upstream;
