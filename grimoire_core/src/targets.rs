//! Learning target selection.
//!
//! Tracks the spell currently being trained per school. In `single` mode
//! the engine holds one target total: selecting a target clears every other
//! school first. Set-time validation is deliberately absent: the UI filters
//! choices, and an invalid target simply never accumulates school-sourced
//! XP usefully.

use crate::types::{LearningMode, School, SpellId};
use std::collections::BTreeMap;

/// Per-school selection of the spell currently being trained
#[derive(Clone, Debug, Default)]
pub struct TargetController {
    targets: BTreeMap<School, SpellId>,
}

impl TargetController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current target for a school
    pub fn get(&self, school: School) -> Option<SpellId> {
        self.targets.get(&school).copied()
    }

    /// All current targets
    pub fn all(&self) -> &BTreeMap<School, SpellId> {
        &self.targets
    }

    /// Select a target for a school.
    ///
    /// Returns the list of (school, new target) changes that took effect, in
    /// the order they should be announced. Re-selecting the current target
    /// changes nothing.
    pub fn set(
        &mut self,
        school: School,
        spell: SpellId,
        mode: LearningMode,
    ) -> Vec<(School, Option<SpellId>)> {
        let mut changes = Vec::new();

        if mode == LearningMode::Single {
            let others: Vec<School> = self
                .targets
                .keys()
                .copied()
                .filter(|s| *s != school)
                .collect();
            for other in others {
                self.targets.remove(&other);
                changes.push((other, None));
            }
        }

        if self.targets.insert(school, spell) != Some(spell) {
            tracing::debug!("Learning target for {} set to {}", school, spell);
            changes.push((school, Some(spell)));
        }

        changes
    }

    /// Clear a school's target. Idempotent; returns true if one was set.
    pub fn clear(&mut self, school: School) -> bool {
        self.targets.remove(&school).is_some()
    }

    /// Clear every target, returning the schools that had one
    pub fn clear_all(&mut self) -> Vec<School> {
        let cleared: Vec<School> = self.targets.keys().copied().collect();
        self.targets.clear();
        cleared
    }

    /// Drop the target slot if this spell just mastered while selected.
    ///
    /// The slot is left empty rather than auto-advanced; the UI reselects in
    /// response to the target-changed event. Returns true if the slot was
    /// dropped.
    pub fn on_mastered(&mut self, school: School, spell: SpellId) -> bool {
        if self.targets.get(&school) == Some(&spell) {
            self.targets.remove(&school);
            true
        } else {
            false
        }
    }

    /// Replace the whole target map (save restore)
    pub fn restore(&mut self, targets: BTreeMap<School, SpellId>) {
        self.targets = targets;
    }
}
