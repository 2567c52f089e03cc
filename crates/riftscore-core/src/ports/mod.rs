//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. Ports are interfaces that the domain core
//! depends on, but whose implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`IBulkStorage`] - Segment-oriented storage for raw match documents
//! - [`IPowerLevelRepository`] - Persistence for players, metrics and power levels
//! - [`IPlayerDirectory`] - Riot ID lookup for players seen only by PUUID

pub mod bulk_storage;
pub mod player_directory;
pub mod power_level_repository;

pub use bulk_storage::{
    is_match_segment, segment_page, IBulkStorage, MATCH_SEGMENT_STEM, TIMELINE_SEGMENT_STEM,
};
pub use player_directory::{IPlayerDirectory, PlayerAccount};
pub use power_level_repository::{IPowerLevelRepository, Page, PlayerRecord, StoredPowerLevel};
