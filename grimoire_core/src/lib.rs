#![forbid(unsafe_code)]

//! Core domain model and business logic for the Grimoire spell-progression
//! engine.
//!
//! This crate provides:
//! - Domain types (schools, tiers, spell records, ledger entries)
//! - XP source registry and grant calculation
//! - Experience ledger with mastery and milestone tracking
//! - Prerequisite graph queries and learning-target selection
//! - Typed engine events
//! - The engine facade and its persistence contract

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod sources;
pub mod award;
pub mod ledger;
pub mod spellbook;
pub mod graph;
pub mod targets;
pub mod events;
pub mod engine;
pub mod persist;
pub mod report;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Settings;
pub use engine::Engine;
pub use events::{EngineEvent, ListenerId};
pub use spellbook::{demo_spellbook, Spellbook};
pub use persist::{SaveData, SAVE_VERSION};
pub use report::write_progress_csv;
