//! Prerequisite graph queries.
//!
//! Each school's spells form a directed acyclic dependency structure:
//! prerequisites must be mastered before a spell is available to learn.
//! These are pure queries over the spellbook and the ledger; mastery state
//! is read live, so availability flips as soon as the last prerequisite
//! masters, with no recomputation step.

use crate::ledger::Ledger;
use crate::spellbook::Spellbook;
use crate::types::SpellId;

/// True iff every prerequisite of the spell is mastered.
///
/// Spells with no prerequisites are always eligible. A spell the spellbook
/// does not know is not eligible through the graph (it can still receive
/// raw/direct XP).
pub fn prerequisites_met(book: &Spellbook, ledger: &Ledger, spell: SpellId) -> bool {
    match book.get(spell) {
        Some(record) => record
            .prerequisites
            .iter()
            .all(|prereq| ledger.is_mastered(*prereq)),
        None => false,
    }
}

/// True iff the spell is known, not yet in the player's hands, and its
/// prerequisites are met.
pub fn is_available_to_learn(book: &Spellbook, ledger: &Ledger, spell: SpellId) -> bool {
    let Some(record) = book.get(spell) else {
        return false;
    };
    if ledger.is_mastered(spell) || record.host_granted {
        return false;
    }
    prerequisites_met(book, ledger, spell)
}
