//! Experience ledger.
//!
//! Tracks per-spell accumulated XP, mastery, and milestone crossings.
//! Entries are created lazily on first grant or query and never destroyed
//! during a session. Mutations return a [`GrantOutcome`] describing the
//! transitions that occurred so the facade can emit the matching events;
//! the ledger itself has no event machinery.

use crate::types::{ExperienceEntry, SpellId};
use chrono::Utc;
use std::collections::HashMap;

/// What a ledger mutation actually did
#[derive(Clone, Debug, Default)]
pub struct GrantOutcome {
    /// XP applied to the entry (signed for `set_xp`, non-negative for grants)
    pub applied: f64,
    /// The mutation pushed the entry to its required XP for the first time
    pub newly_mastered: bool,
    /// Milestone percents crossed ascending by this mutation
    pub milestones_crossed: Vec<u8>,
}

/// Per-spell accumulated experience, keyed by spell identifier
#[derive(Clone, Debug, Default)]
pub struct Ledger {
    entries: HashMap<SpellId, ExperienceEntry>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an entry without creating it
    pub fn get(&self, spell: SpellId) -> Option<&ExperienceEntry> {
        self.entries.get(&spell)
    }

    /// Entry for a spell, created with `required` XP if absent
    pub fn ensure_entry(&mut self, spell: SpellId, required: f64) -> &mut ExperienceEntry {
        self.entries
            .entry(spell)
            .or_insert_with(|| ExperienceEntry::new(required.max(0.0)))
    }

    /// Accumulated XP, or 0 if the spell has no entry yet
    pub fn accumulated(&self, spell: SpellId) -> f64 {
        self.entries.get(&spell).map(|e| e.accumulated).unwrap_or(0.0)
    }

    /// Progress percent in [0, 100], or 0 if the spell has no entry yet
    pub fn progress_percent(&self, spell: SpellId) -> f64 {
        self.entries.get(&spell).map(|e| e.percent()).unwrap_or(0.0)
    }

    /// Whether accumulated XP has ever reached required XP
    pub fn is_mastered(&self, spell: SpellId) -> bool {
        self.entries.get(&spell).map(|e| e.mastered).unwrap_or(false)
    }

    /// Add already-clamped XP to a spell.
    ///
    /// `amount` must come out of the grant calculator (non-negative, fits
    /// under the cap); this method only applies it and reports transitions.
    pub fn add_xp(
        &mut self,
        spell: SpellId,
        amount: f64,
        required: f64,
        milestones: &[u8],
    ) -> GrantOutcome {
        if amount <= 0.0 {
            // Still materialize the entry so queries see a required value.
            self.ensure_entry(spell, required);
            return GrantOutcome::default();
        }

        let entry = self.ensure_entry(spell, required);
        let new_value = (entry.accumulated + amount).min(entry.required);
        let applied = new_value - entry.accumulated;
        entry.last_gain_at = Some(Utc::now());

        let mut outcome = apply_value(entry, new_value, milestones);
        outcome.applied = applied;
        outcome
    }

    /// Direct XP override for debug use.
    ///
    /// Clamps into [0, required] and re-evaluates mastery and milestones as
    /// if the value had been reached by natural progression. Lowering the
    /// value re-arms milestones above the new percentage; mastery is sticky.
    pub fn set_xp(
        &mut self,
        spell: SpellId,
        value: f64,
        required: f64,
        milestones: &[u8],
    ) -> GrantOutcome {
        let entry = self.ensure_entry(spell, required);
        let new_value = value.clamp(0.0, entry.required);
        let applied = new_value - entry.accumulated;

        let mut outcome = apply_value(entry, new_value, milestones);
        outcome.applied = applied;
        outcome
    }

    /// Iterate all entries
    pub fn entries(&self) -> impl Iterator<Item = (SpellId, &ExperienceEntry)> {
        self.entries.iter().map(|(id, e)| (*id, e))
    }

    /// Restore an entry from persisted state.
    ///
    /// `required` is re-derived from the current threshold table, so old
    /// saves pick up config changes; accumulated is clamped into the new
    /// range.
    pub fn restore_entry(&mut self, spell: SpellId, mut entry: ExperienceEntry, required: f64) {
        entry.required = required.max(0.0);
        entry.accumulated = entry.accumulated.clamp(0.0, entry.required);
        self.entries.insert(spell, entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Write `new_value` into the entry, updating mastery and milestone state.
///
/// Milestones below the new percentage latch (insert reports a crossing),
/// milestones above it un-latch so a later ascending pass fires them again.
fn apply_value(entry: &mut ExperienceEntry, new_value: f64, milestones: &[u8]) -> GrantOutcome {
    entry.accumulated = new_value;
    let percent = entry.percent();

    let mut crossed = Vec::new();
    for &threshold in milestones {
        if percent >= threshold as f64 {
            if entry.milestones_hit.insert(threshold) {
                crossed.push(threshold);
            }
        } else {
            entry.milestones_hit.remove(&threshold);
        }
    }

    let newly_mastered = !entry.mastered && entry.accumulated >= entry.required;
    if newly_mastered {
        entry.mastered = true;
        tracing::debug!("Spell mastered at {} XP", entry.required);
    }

    GrantOutcome {
        applied: 0.0,
        newly_mastered,
        milestones_crossed: crossed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPELL: SpellId = SpellId(0x1234);
    const MILESTONES: [u8; 3] = [25, 50, 75];

    #[test]
    fn test_lazy_entry_creation() {
        let mut ledger = Ledger::new();
        assert_eq!(ledger.accumulated(SPELL), 0.0);
        assert_eq!(ledger.progress_percent(SPELL), 0.0);
        assert!(ledger.get(SPELL).is_none());

        ledger.add_xp(SPELL, 10.0, 100.0, &MILESTONES);
        assert_eq!(ledger.accumulated(SPELL), 10.0);
        assert_eq!(ledger.get(SPELL).unwrap().required, 100.0);
    }

    #[test]
    fn test_accumulated_never_exceeds_required() {
        let mut ledger = Ledger::new();
        let outcome = ledger.add_xp(SPELL, 150.0, 100.0, &MILESTONES);
        assert_eq!(outcome.applied, 100.0);
        assert_eq!(ledger.accumulated(SPELL), 100.0);
    }

    #[test]
    fn test_mastery_fires_exactly_once() {
        let mut ledger = Ledger::new();
        let first = ledger.add_xp(SPELL, 100.0, 100.0, &MILESTONES);
        assert!(first.newly_mastered);
        assert!(ledger.is_mastered(SPELL));

        let second = ledger.add_xp(SPELL, 20.0, 100.0, &MILESTONES);
        assert!(!second.newly_mastered);
        assert_eq!(second.applied, 0.0);
        assert_eq!(ledger.accumulated(SPELL), 100.0);
    }

    #[test]
    fn test_milestones_fire_once_per_ascending_crossing() {
        let mut ledger = Ledger::new();
        let outcome = ledger.add_xp(SPELL, 30.0, 100.0, &MILESTONES);
        assert_eq!(outcome.milestones_crossed, vec![25]);

        // No re-fire while above the threshold.
        let outcome = ledger.add_xp(SPELL, 10.0, 100.0, &MILESTONES);
        assert!(outcome.milestones_crossed.is_empty());

        // One mutation can cross several thresholds.
        let outcome = ledger.add_xp(SPELL, 40.0, 100.0, &MILESTONES);
        assert_eq!(outcome.milestones_crossed, vec![50, 75]);
    }

    #[test]
    fn test_set_xp_rearms_milestones() {
        let mut ledger = Ledger::new();
        ledger.add_xp(SPELL, 60.0, 100.0, &MILESTONES);

        let outcome = ledger.set_xp(SPELL, 10.0, 100.0, &MILESTONES);
        assert!(outcome.milestones_crossed.is_empty());
        assert_eq!(outcome.applied, -50.0);

        // Crossing 25 and 50 again fires them again.
        let outcome = ledger.add_xp(SPELL, 45.0, 100.0, &MILESTONES);
        assert_eq!(outcome.milestones_crossed, vec![25, 50]);
    }

    #[test]
    fn test_set_xp_clamps_and_masters() {
        let mut ledger = Ledger::new();
        let outcome = ledger.set_xp(SPELL, 500.0, 100.0, &MILESTONES);
        assert_eq!(ledger.accumulated(SPELL), 100.0);
        assert!(outcome.newly_mastered);

        // Mastery is sticky even when the value is lowered afterwards.
        ledger.set_xp(SPELL, 0.0, 100.0, &MILESTONES);
        assert!(ledger.is_mastered(SPELL));
        let outcome = ledger.set_xp(SPELL, 100.0, 100.0, &MILESTONES);
        assert!(!outcome.newly_mastered);
    }

    #[test]
    fn test_zero_amount_changes_nothing() {
        let mut ledger = Ledger::new();
        ledger.add_xp(SPELL, 40.0, 100.0, &MILESTONES);
        let before = ledger.get(SPELL).unwrap().clone();

        let outcome = ledger.add_xp(SPELL, 0.0, 100.0, &MILESTONES);
        assert_eq!(outcome.applied, 0.0);
        assert!(outcome.milestones_crossed.is_empty());
        assert!(!outcome.newly_mastered);
        let after = ledger.get(SPELL).unwrap();
        assert_eq!(before.accumulated, after.accumulated);
        assert_eq!(before.milestones_hit, after.milestones_hit);
    }

    #[test]
    fn test_restore_entry_rederives_required() {
        let mut ledger = Ledger::new();
        let mut entry = ExperienceEntry::new(200.0);
        entry.accumulated = 150.0;

        // Threshold table shrank since the save was written.
        ledger.restore_entry(SPELL, entry, 100.0);
        let restored = ledger.get(SPELL).unwrap();
        assert_eq!(restored.required, 100.0);
        assert_eq!(restored.accumulated, 100.0);
    }
}
