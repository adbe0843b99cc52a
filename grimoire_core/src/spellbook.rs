//! Spell records imported from host data.
//!
//! The spellbook is the engine's read-only view of the host's spell forms:
//! school, tier, and prerequisite edges, keyed by opaque spell id. A built-in
//! demo catalog stands in for host data in tests and the debug console.

use crate::types::{School, SpellId, SpellRecord, Tier};
use crate::Result;
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Cached demo spellbook - built once and reused across all operations
static DEMO_SPELLBOOK: Lazy<Spellbook> = Lazy::new(build_demo_spellbook);

/// Get a reference to the cached demo spellbook
pub fn demo_spellbook() -> &'static Spellbook {
    &DEMO_SPELLBOOK
}

/// All spell records known to the engine
#[derive(Clone, Debug, Default)]
pub struct Spellbook {
    spells: HashMap<SpellId, SpellRecord>,
}

/// On-disk spellbook format for the debug console
#[derive(Debug, Deserialize)]
struct SpellbookFile {
    #[serde(default)]
    spells: Vec<SpellRecord>,
}

impl Spellbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a spellbook from host-provided records
    pub fn from_records(records: impl IntoIterator<Item = SpellRecord>) -> Self {
        let mut book = Self::new();
        for record in records {
            book.import(record);
        }
        book
    }

    /// Load spell definitions from a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let file: SpellbookFile = toml::from_str(&contents)?;
        tracing::info!("Loaded {} spells from {:?}", file.spells.len(), path);
        Ok(Self::from_records(file.spells))
    }

    /// Import a record, keeping the existing one if the id is already known.
    ///
    /// Records are immutable after import (except the host-granted flag), so
    /// a duplicate import is a no-op. Returns true when the record was added.
    pub fn import(&mut self, record: SpellRecord) -> bool {
        match self.spells.entry(record.id) {
            std::collections::hash_map::Entry::Occupied(_) => {
                tracing::debug!("Spell {} already imported, keeping existing record", record.id);
                false
            }
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(record);
                true
            }
        }
    }

    pub fn get(&self, spell: SpellId) -> Option<&SpellRecord> {
        self.spells.get(&spell)
    }

    pub fn contains(&self, spell: SpellId) -> bool {
        self.spells.contains_key(&spell)
    }

    pub fn school_of(&self, spell: SpellId) -> Option<School> {
        self.spells.get(&spell).map(|r| r.school)
    }

    pub fn tier_of(&self, spell: SpellId) -> Option<Tier> {
        self.spells.get(&spell).map(|r| r.tier)
    }

    /// Whether the host has actually granted this spell to the player
    pub fn is_host_granted(&self, spell: SpellId) -> bool {
        self.spells.get(&spell).map(|r| r.host_granted).unwrap_or(false)
    }

    /// Record that the host granted the spell. Returns the previous flag,
    /// or None for an unknown spell.
    pub fn mark_granted(&mut self, spell: SpellId) -> Option<bool> {
        self.spells.get_mut(&spell).map(|r| {
            let previous = r.host_granted;
            r.host_granted = true;
            previous
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &SpellRecord> {
        self.spells.values()
    }

    pub fn spells_in_school(&self, school: School) -> impl Iterator<Item = &SpellRecord> {
        self.spells.values().filter(move |r| r.school == school)
    }

    pub fn len(&self) -> usize {
        self.spells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spells.is_empty()
    }

    /// Validate the spellbook for consistency.
    ///
    /// Returns a list of validation errors, or empty Vec if valid. Checks:
    /// - empty names
    /// - prerequisite references that don't resolve
    /// - prerequisites crossing school boundaries
    /// - cycles in the prerequisite edges (host data is supposed to be
    ///   acyclic, this is a defensive check at load time)
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (id, record) in &self.spells {
            if record.name.is_empty() {
                errors.push(format!("Spell {} has empty name", id));
            }
            for prereq in &record.prerequisites {
                match self.spells.get(prereq) {
                    None => errors.push(format!(
                        "Spell {} ('{}') references unknown prerequisite {}",
                        id, record.name, prereq
                    )),
                    Some(prereq_record) => {
                        if prereq_record.school != record.school {
                            errors.push(format!(
                                "Spell {} ('{}', {}) has prerequisite {} in a different school ({})",
                                id, record.name, record.school, prereq, prereq_record.school
                            ));
                        }
                    }
                }
            }
        }

        errors.extend(self.find_cycles());
        errors
    }

    /// Detect prerequisite cycles with an iterative three-color DFS
    fn find_cycles(&self) -> Vec<String> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            White,
            Grey,
            Black,
        }

        let mut marks: HashMap<SpellId, Mark> =
            self.spells.keys().map(|id| (*id, Mark::White)).collect();
        let mut errors = Vec::new();

        let mut roots: Vec<SpellId> = self.spells.keys().copied().collect();
        roots.sort_unstable();

        for root in roots {
            if marks[&root] != Mark::White {
                continue;
            }

            // Stack of (node, next prerequisite index to visit).
            let mut stack: Vec<(SpellId, usize)> = vec![(root, 0)];
            marks.insert(root, Mark::Grey);

            while let Some((node, index)) = stack.pop() {
                let prereqs = self
                    .spells
                    .get(&node)
                    .map(|r| r.prerequisites.as_slice())
                    .unwrap_or(&[]);

                if index < prereqs.len() {
                    stack.push((node, index + 1));
                    let next = prereqs[index];
                    match marks.get(&next).copied() {
                        Some(Mark::White) => {
                            marks.insert(next, Mark::Grey);
                            stack.push((next, 0));
                        }
                        Some(Mark::Grey) => {
                            errors.push(format!(
                                "Prerequisite cycle involving spell {} -> {}",
                                node, next
                            ));
                        }
                        // Black or unknown id (reported separately): skip.
                        _ => {}
                    }
                } else {
                    marks.insert(node, Mark::Black);
                }
            }
        }

        errors
    }
}

/// Demo catalog covering the five schools with small prerequisite chains.
///
/// A real host imports its own load order; this stands in for it.
fn build_demo_spellbook() -> Spellbook {
    fn spell(
        id: u32,
        name: &str,
        school: School,
        tier: Tier,
        prerequisites: &[u32],
    ) -> SpellRecord {
        SpellRecord {
            id: SpellId(id),
            name: name.into(),
            school,
            tier,
            prerequisites: prerequisites.iter().map(|p| SpellId(*p)).collect(),
            host_granted: false,
        }
    }

    Spellbook::from_records([
        // Alteration
        spell(0x0005_AD5C, "Oakflesh", School::Alteration, Tier::Novice, &[]),
        spell(0x0005_AD5D, "Stoneflesh", School::Alteration, Tier::Apprentice, &[0x0005_AD5C]),
        spell(0x0005_AD5E, "Ironflesh", School::Alteration, Tier::Adept, &[0x0005_AD5D]),
        // Conjuration
        spell(0x000A_26E5, "Summon Familiar", School::Conjuration, Tier::Novice, &[]),
        spell(0x000A_26E6, "Flame Atronach", School::Conjuration, Tier::Apprentice, &[0x000A_26E5]),
        // Destruction
        spell(0x0001_2FCD, "Flames", School::Destruction, Tier::Novice, &[]),
        spell(0x0001_2FD0, "Firebolt", School::Destruction, Tier::Apprentice, &[0x0001_2FCD]),
        spell(0x0001_C789, "Fireball", School::Destruction, Tier::Adept, &[0x0001_2FD0]),
        spell(0x0001_C78A, "Incinerate", School::Destruction, Tier::Expert, &[0x0001_C789]),
        spell(0x0001_C78B, "Fire Storm", School::Destruction, Tier::Master, &[0x0001_C78A]),
        // Illusion
        spell(0x0004_DEE8, "Courage", School::Illusion, Tier::Novice, &[]),
        spell(0x0004_DEE9, "Fear", School::Illusion, Tier::Apprentice, &[0x0004_DEE8]),
        // Restoration
        spell(0x0001_2FCC, "Healing", School::Restoration, Tier::Novice, &[]),
        spell(0x0001_2FD9, "Fast Healing", School::Restoration, Tier::Apprentice, &[0x0001_2FCC]),
        spell(0x000B_62EF, "Close Wounds", School::Restoration, Tier::Adept, &[0x0001_2FD9]),
    ])
}
