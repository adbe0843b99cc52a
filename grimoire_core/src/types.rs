//! Core domain types for the spell-progression engine.
//!
//! This module defines the fundamental types used throughout the system:
//! - Schools, tiers, and opaque spell identifiers
//! - Spell records imported from host data
//! - XP source descriptors
//! - Ledger entries and learning-target state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// ============================================================================
// Identity Types
// ============================================================================

/// Opaque identifier for a spell owned by the host game.
///
/// The engine never dereferences these; it stores and compares them by
/// identity only. Attributes (school, tier, prerequisites) are resolved
/// through the [`crate::spellbook::Spellbook`].
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct SpellId(pub u32);

impl fmt::Display for SpellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08X}", self.0)
    }
}

// ============================================================================
// School and Tier
// ============================================================================

/// Magic school a spell belongs to
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum School {
    Alteration,
    Conjuration,
    Destruction,
    Illusion,
    Restoration,
}

impl School {
    /// All schools, in canonical order
    pub const ALL: [School; 5] = [
        School::Alteration,
        School::Conjuration,
        School::Destruction,
        School::Illusion,
        School::Restoration,
    ];
}

impl fmt::Display for School {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            School::Alteration => "Alteration",
            School::Conjuration => "Conjuration",
            School::Destruction => "Destruction",
            School::Illusion => "Illusion",
            School::Restoration => "Restoration",
        };
        write!(f, "{}", name)
    }
}

/// Difficulty tier of a spell, determining required XP via the threshold table
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Novice,
    Apprentice,
    Adept,
    Expert,
    Master,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tier::Novice => "Novice",
            Tier::Apprentice => "Apprentice",
            Tier::Adept => "Adept",
            Tier::Expert => "Expert",
            Tier::Master => "Master",
        };
        write!(f, "{}", name)
    }
}

// ============================================================================
// Spell Records
// ============================================================================

/// A spell as imported from host data.
///
/// Immutable after import except for `host_granted`, which the host flips
/// when it actually adds the spell to the player.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SpellRecord {
    pub id: SpellId,
    pub name: String,
    pub school: School,
    pub tier: Tier,
    #[serde(default)]
    pub prerequisites: Vec<SpellId>,
    #[serde(default)]
    pub host_granted: bool,
}

// ============================================================================
// XP Sources
// ============================================================================

/// Built-in source: unrestricted XP channel
pub const SOURCE_ANY: &str = "any";
/// Built-in source: XP routed to the active learning target of the spell's school
pub const SOURCE_SCHOOL: &str = "school";
/// Built-in source: XP granted directly to the named spell (the default channel)
pub const SOURCE_DIRECT: &str = "direct";
/// Built-in source: self-study XP (reading, practice)
pub const SOURCE_SELF: &str = "self";

/// Ids of the sources that always exist
pub const BUILTIN_SOURCES: [&str; 4] = [SOURCE_ANY, SOURCE_SCHOOL, SOURCE_DIRECT, SOURCE_SELF];

/// A named channel of XP with its own multiplier and cap.
///
/// `cap_percent` limits how far this source may push a spell's total
/// progress, as a percentage of its required XP.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct XpSourceDescriptor {
    pub display_name: String,
    pub multiplier: f64,
    pub cap_percent: f64,
}

impl XpSourceDescriptor {
    /// Descriptor with default multiplier (1.0) and cap (100%)
    pub fn with_defaults(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            multiplier: 1.0,
            cap_percent: 100.0,
        }
    }
}

// ============================================================================
// Ledger Entries
// ============================================================================

/// Per-spell accumulated experience and derived progress state.
///
/// Invariant: `0.0 <= accumulated <= required` after every mutation.
/// `mastered` is sticky: once accumulated reaches required it stays set,
/// even if the value is later lowered through a debug override.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExperienceEntry {
    pub accumulated: f64,
    pub required: f64,
    pub mastered: bool,
    /// Milestone percents already crossed ascending (re-armed when XP drops below them)
    #[serde(default)]
    pub milestones_hit: BTreeSet<u8>,
    pub last_gain_at: Option<DateTime<Utc>>,
}

impl ExperienceEntry {
    /// Fresh entry for a spell requiring `required` XP
    pub fn new(required: f64) -> Self {
        Self {
            accumulated: 0.0,
            required,
            mastered: false,
            milestones_hit: BTreeSet::new(),
            last_gain_at: None,
        }
    }

    /// Progress toward mastery as a percentage in [0, 100]
    pub fn percent(&self) -> f64 {
        if self.required <= 0.0 {
            return 100.0;
        }
        (self.accumulated / self.required) * 100.0
    }
}

// ============================================================================
// Learning Mode
// ============================================================================

/// Cardinality of learning-target selection
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LearningMode {
    /// One independent target per school
    #[default]
    PerSchool,
    /// One target engine-wide; selecting a target clears all other schools
    Single,
}

impl fmt::Display for LearningMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LearningMode::PerSchool => write!(f, "perSchool"),
            LearningMode::Single => write!(f, "single"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spell_id_display_is_hex() {
        assert_eq!(SpellId(0x0001_2EB7).to_string(), "00012EB7");
    }

    #[test]
    fn test_entry_percent() {
        let mut entry = ExperienceEntry::new(200.0);
        assert_eq!(entry.percent(), 0.0);
        entry.accumulated = 50.0;
        assert_eq!(entry.percent(), 25.0);
    }

    #[test]
    fn test_entry_percent_zero_required() {
        let entry = ExperienceEntry::new(0.0);
        assert_eq!(entry.percent(), 100.0);
    }

    #[test]
    fn test_learning_mode_display() {
        assert_eq!(LearningMode::PerSchool.to_string(), "perSchool");
        assert_eq!(LearningMode::Single.to_string(), "single");
    }

    #[test]
    fn test_school_serde_snake_case() {
        let json = serde_json::to_string(&School::Destruction).unwrap();
        assert_eq!(json, "\"destruction\"");
    }
}
