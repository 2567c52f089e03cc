//! CLI subcommands

pub mod config;
pub mod context;
pub mod download;
pub mod power_level;
pub mod quota;
pub mod score;
pub mod timelines;
