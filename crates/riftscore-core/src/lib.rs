//! Riftscore Core - Domain logic and scoring rules
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `Puuid`, `MatchId`, `MatchDocument`, `MatchMetrics`, `PowerLevel`
//! - **Use cases** - `ScoreSegmentUseCase`, `PlayerSummaryUseCase`
//! - **Port definitions** - Traits for adapters: `IBulkStorage`, `IPowerLevelRepository`,
//!   `IPlayerDirectory`
//! - **Configuration** - YAML-backed settings shared by the client, store, and CLI
//!
//! # Architecture
//!
//! The domain module contains pure, deterministic mapping and scoring logic.
//! Ports define trait interfaces that adapter crates implement.
//! Use cases orchestrate domain functions through port interfaces.

// Large `json!` fixtures in unit tests
#![cfg_attr(test, recursion_limit = "256")]

pub mod config;
pub mod domain;
pub mod ports;
pub mod usecases;
