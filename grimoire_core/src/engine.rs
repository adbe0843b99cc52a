//! Engine facade.
//!
//! The query/command surface the host-embedded scripting layer talks to.
//! Composes the spellbook, ledger, source registry, target controller, and
//! event dispatcher; all mutations flow through here so events fire
//! consistently.
//!
//! Error philosophy: anything reachable from live gameplay clamps or
//! no-ops (zero amounts, unknown sources, unset targets); hard errors are
//! reserved for negative amounts and spell references the host cannot
//! resolve.

use crate::award;
use crate::config::Settings;
use crate::events::{Dispatcher, EngineEvent, ListenerId};
use crate::graph;
use crate::ledger::{GrantOutcome, Ledger};
use crate::sources::SourceRegistry;
use crate::spellbook::Spellbook;
use crate::targets::TargetController;
use crate::types::{LearningMode, School, SpellId, Tier, SOURCE_DIRECT, SOURCE_SCHOOL};
use crate::{Error, Result};
use std::collections::BTreeMap;

/// Source id reported in XP-gained events for raw grants
const RAW_SOURCE: &str = "raw";

/// The spell-progression engine.
///
/// One instance per plugin load; explicitly constructed so tests can run
/// independent engines side by side.
#[derive(Debug)]
pub struct Engine {
    settings: Settings,
    spellbook: Spellbook,
    ledger: Ledger,
    sources: SourceRegistry,
    targets: TargetController,
    dispatcher: Dispatcher,
    menu_open: bool,
}

impl Engine {
    /// Construct an engine over imported spell data.
    ///
    /// Spellbook problems (dangling prerequisites, cycles) are logged and
    /// tolerated; a broken tree must never stop a running game session.
    pub fn new(settings: Settings, spellbook: Spellbook) -> Self {
        for problem in spellbook.validate() {
            tracing::warn!("Spellbook: {}", problem);
        }
        tracing::info!(
            "Engine initialized: {} spells, mode {}",
            spellbook.len(),
            settings.learning.mode
        );

        Self {
            settings,
            spellbook,
            ledger: Ledger::new(),
            sources: SourceRegistry::new(),
            targets: TargetController::new(),
            dispatcher: Dispatcher::new(),
            menu_open: false,
        }
    }

    /// Engine over the built-in demo catalog
    pub fn with_demo_spellbook(settings: Settings) -> Self {
        Self::new(settings, crate::spellbook::demo_spellbook().clone())
    }

    // ========================================================================
    // Notifications
    // ========================================================================

    /// Register an event listener
    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&EngineEvent) + 'static,
    {
        self.dispatcher.subscribe(listener)
    }

    /// Remove an event listener
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.dispatcher.unsubscribe(id)
    }

    // ========================================================================
    // XP Commands
    // ========================================================================

    /// Register an XP source; emits a source-registered event on first creation
    pub fn register_xp_source(&mut self, source_id: &str, display_name: &str) {
        if self.sources.register(source_id, display_name) {
            self.dispatcher.emit(EngineEvent::SourceRegistered {
                source: source_id.to_string(),
            });
        }
    }

    /// Grant XP through a named source, applying multipliers and caps.
    ///
    /// `school`-sourced XP is routed to the active learning target of the
    /// spell's school; with no target set the grant is discarded (a normal
    /// idle state, not an error). Returns the amount actually applied.
    pub fn add_sourced_xp(&mut self, spell: SpellId, amount: f64, source_id: &str) -> Result<f64> {
        let school = self
            .spellbook
            .school_of(spell)
            .ok_or(Error::UnknownSpell(spell))?;

        let recipient = if source_id == SOURCE_SCHOOL {
            match self.targets.get(school) {
                Some(target) => target,
                None => {
                    tracing::debug!("No {} learning target set, discarding school XP", school);
                    return Ok(0.0);
                }
            }
        } else {
            spell
        };

        let required = self.required_xp_of(recipient);
        let current = self.ledger.accumulated(recipient);
        let descriptor = self.sources.resolve(source_id).clone();
        let granted = award::compute_grant(
            amount,
            &descriptor,
            self.settings.xp.effective_multiplier(),
            current,
            required,
        )?;

        let milestones = self.settings.xp.milestones();
        let outcome = self.ledger.add_xp(recipient, granted, required, &milestones);
        self.announce(recipient, Some(source_id), &outcome);
        Ok(outcome.applied)
    }

    /// Grant XP through the default `direct` source
    pub fn add_xp(&mut self, spell: SpellId, amount: f64) -> Result<f64> {
        self.add_sourced_xp(spell, amount, SOURCE_DIRECT)
    }

    /// Grant XP bypassing multipliers and caps (still clamped to required)
    pub fn add_raw_xp(&mut self, spell: SpellId, amount: f64) -> Result<f64> {
        if !self.spellbook.contains(spell) {
            return Err(Error::UnknownSpell(spell));
        }

        let required = self.required_xp_of(spell);
        let current = self.ledger.accumulated(spell);
        let granted = award::compute_raw_grant(amount, current, required)?;

        let milestones = self.settings.xp.milestones();
        let outcome = self.ledger.add_xp(spell, granted, required, &milestones);
        self.announce(spell, Some(RAW_SOURCE), &outcome);
        Ok(outcome.applied)
    }

    /// Debug override of a spell's accumulated XP.
    ///
    /// Mastery and milestone side effects fire exactly as they would under
    /// natural progression; no XP-gained event is emitted.
    pub fn set_spell_xp(&mut self, spell: SpellId, value: f64) -> Result<()> {
        if !self.spellbook.contains(spell) {
            return Err(Error::UnknownSpell(spell));
        }

        let required = self.required_xp_of(spell);
        let milestones = self.settings.xp.milestones();
        let outcome = self.ledger.set_xp(spell, value, required, &milestones);
        self.announce(spell, None, &outcome);
        Ok(())
    }

    /// Record that the host granted the spell to the player directly.
    ///
    /// Emits an early-granted event when the ledger had not yet mastered it.
    pub fn mark_spell_granted(&mut self, spell: SpellId) -> Result<()> {
        let previously = self
            .spellbook
            .mark_granted(spell)
            .ok_or(Error::UnknownSpell(spell))?;

        if !previously && !self.ledger.is_mastered(spell) {
            self.dispatcher.emit(EngineEvent::EarlyGranted { spell });
        }
        Ok(())
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Progress toward mastery in [0, 100]; 0 for spells never trained
    pub fn progress_percent(&self, spell: SpellId) -> f64 {
        self.ledger.progress_percent(spell)
    }

    /// Accumulated XP; 0 for spells never trained
    pub fn current_xp(&self, spell: SpellId) -> f64 {
        self.ledger.accumulated(spell)
    }

    /// Required XP from the ledger entry, or derived from the tier table.
    /// 0 for spells the host cannot resolve.
    pub fn required_xp(&self, spell: SpellId) -> f64 {
        if self.ledger.get(spell).is_some() || self.spellbook.contains(spell) {
            self.required_xp_of(spell)
        } else {
            0.0
        }
    }

    /// Whether accumulated XP has reached required XP
    pub fn is_mastered(&self, spell: SpellId) -> bool {
        self.ledger.is_mastered(spell)
    }

    /// Mastered and actually applied by the host
    pub fn is_unlocked(&self, spell: SpellId) -> bool {
        self.ledger.is_mastered(spell) && self.spellbook.is_host_granted(spell)
    }

    /// Whether the spell can be trained now (known, not held, prerequisites met)
    pub fn is_available_to_learn(&self, spell: SpellId) -> bool {
        graph::is_available_to_learn(&self.spellbook, &self.ledger, spell)
    }

    /// Whether every prerequisite of the spell is mastered
    pub fn prerequisites_met(&self, spell: SpellId) -> bool {
        graph::prerequisites_met(&self.spellbook, &self.ledger, spell)
    }

    // ========================================================================
    // Learning Targets
    // ========================================================================

    /// Current learning target for a school
    pub fn get_target(&self, school: School) -> Option<SpellId> {
        self.targets.get(school)
    }

    /// All current learning targets
    pub fn get_all_targets(&self) -> BTreeMap<School, SpellId> {
        self.targets.all().clone()
    }

    /// Current learning mode
    pub fn mode(&self) -> LearningMode {
        self.settings.learning.mode
    }

    /// Select a learning target, inferring the school from the spell record.
    ///
    /// No mastery or prerequisite validation happens here; the UI filters
    /// choices, and an unhelpful target just never accumulates school XP.
    pub fn set_target(&mut self, spell: SpellId) -> Result<()> {
        let school = self
            .spellbook
            .school_of(spell)
            .ok_or(Error::UnknownSpell(spell))?;
        self.set_target_for_school(school, spell)
    }

    /// Select a learning target for an explicit school slot
    pub fn set_target_for_school(&mut self, school: School, spell: SpellId) -> Result<()> {
        match self.spellbook.school_of(spell) {
            None => return Err(Error::UnknownSpell(spell)),
            Some(actual) if actual != school => {
                tracing::warn!(
                    "Target {} belongs to {}, not {}; school XP will not reach it",
                    spell,
                    actual,
                    school
                );
            }
            Some(_) => {}
        }

        let changes = self.targets.set(school, spell, self.settings.learning.mode);
        for (changed_school, target) in changes {
            self.dispatcher.emit(EngineEvent::TargetChanged {
                school: changed_school,
                target,
            });
        }
        Ok(())
    }

    /// Clear a school's learning target. Idempotent.
    pub fn clear_target(&mut self, school: School) {
        if self.targets.clear(school) {
            self.dispatcher
                .emit(EngineEvent::TargetChanged { school, target: None });
        }
    }

    /// Clear every learning target. Idempotent.
    pub fn clear_all_targets(&mut self) {
        for school in self.targets.clear_all() {
            self.dispatcher
                .emit(EngineEvent::TargetChanged { school, target: None });
        }
    }

    // ========================================================================
    // Settings Reads
    // ========================================================================

    /// Global XP multiplier (clamped non-negative)
    pub fn global_multiplier(&self) -> f64 {
        self.settings.xp.effective_multiplier()
    }

    /// Required XP for a tier per the threshold table
    pub fn xp_for_tier(&self, tier: Tier) -> f64 {
        self.settings.thresholds.xp_for_tier(tier)
    }

    /// Cap percent for a source (100 if never referenced)
    pub fn source_cap(&self, source_id: &str) -> f64 {
        self.sources.cap_percent(source_id)
    }

    /// Set a source's multiplier (clamped non-negative)
    pub fn set_source_multiplier(&mut self, source_id: &str, value: f64) {
        self.sources.set_multiplier(source_id, value);
    }

    /// Set a source's cap percent (clamped into [0, 100])
    pub fn set_source_cap(&mut self, source_id: &str, percent: f64) {
        self.sources.set_cap(source_id, percent);
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn spellbook(&self) -> &Spellbook {
        &self.spellbook
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn sources(&self) -> &SourceRegistry {
        &self.sources
    }

    // ========================================================================
    // Menu Control
    // ========================================================================

    // Pure UI-visibility toggles; no engine-state effect.

    pub fn open_menu(&mut self) {
        self.menu_open = true;
    }

    pub fn close_menu(&mut self) {
        self.menu_open = false;
    }

    pub fn toggle_menu(&mut self) {
        self.menu_open = !self.menu_open;
    }

    pub fn is_menu_open(&self) -> bool {
        self.menu_open
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Required XP for a spell: the live entry's value if one exists,
    /// otherwise derived from the spell's tier
    fn required_xp_of(&self, spell: SpellId) -> f64 {
        if let Some(entry) = self.ledger.get(spell) {
            return entry.required;
        }
        self.spellbook
            .tier_of(spell)
            .map(|tier| self.settings.thresholds.xp_for_tier(tier))
            .unwrap_or(0.0)
    }

    /// Emit the events a ledger mutation produced
    fn announce(&mut self, spell: SpellId, source_id: Option<&str>, outcome: &GrantOutcome) {
        if let Some(source) = source_id {
            if outcome.applied > 0.0 {
                self.dispatcher.emit(EngineEvent::XpGained {
                    spell,
                    source: source.to_string(),
                    amount: outcome.applied,
                });
            }
        }

        for percent in &outcome.milestones_crossed {
            self.dispatcher.emit(EngineEvent::MilestoneReached {
                spell,
                percent: *percent,
            });
        }

        if outcome.newly_mastered {
            if let Some(school) = self.spellbook.school_of(spell) {
                self.dispatcher
                    .emit(EngineEvent::SpellMastered { school, spell });

                if self.targets.on_mastered(school, spell) {
                    self.dispatcher.emit(EngineEvent::TargetChanged {
                        school,
                        target: None,
                    });
                }
            }
        }
    }

    // ========================================================================
    // Persistence Contract
    // ========================================================================

    /// Snapshot the serializable session state
    pub fn snapshot(&self) -> crate::persist::SaveData {
        crate::persist::SaveData::capture(self)
    }

    /// Restore session state from a snapshot.
    ///
    /// Required XP is re-derived from the current threshold table for spells
    /// the spellbook still knows; entries for spells it no longer knows keep
    /// their persisted requirement. No events fire during restore.
    pub fn restore(&mut self, save: crate::persist::SaveData) {
        self.ledger = Ledger::new();
        for (spell, entry) in save.ledger {
            let required = match self.spellbook.tier_of(spell) {
                Some(tier) => self.settings.thresholds.xp_for_tier(tier),
                None => entry.required,
            };
            self.ledger.restore_entry(spell, entry, required);
        }

        self.sources = SourceRegistry::new();
        self.sources.apply_overrides(save.sources);

        self.targets.restore(save.targets);
        tracing::info!("Restored engine state: {} ledger entries", self.ledger.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ExperienceEntry;
    use std::cell::RefCell;
    use std::rc::Rc;

    // Demo spellbook ids (Destruction chain + Restoration)
    const FLAMES: SpellId = SpellId(0x0001_2FCD);
    const FIREBOLT: SpellId = SpellId(0x0001_2FD0);
    const HEALING: SpellId = SpellId(0x0001_2FCC);
    const UNKNOWN: SpellId = SpellId(0xDEAD_BEEF);

    fn engine() -> Engine {
        Engine::with_demo_spellbook(Settings::default())
    }

    fn capture_events(engine: &mut Engine) -> Rc<RefCell<Vec<EngineEvent>>> {
        let events: Rc<RefCell<Vec<EngineEvent>>> = Rc::default();
        let sink = Rc::clone(&events);
        engine.subscribe(move |event| sink.borrow_mut().push(event.clone()));
        events
    }

    #[test]
    fn test_direct_grant_accumulates() {
        let mut engine = engine();
        let granted = engine.add_sourced_xp(FLAMES, 30.0, "direct").unwrap();
        assert_eq!(granted, 30.0);
        assert_eq!(engine.current_xp(FLAMES), 30.0);
        assert_eq!(engine.progress_percent(FLAMES), 30.0);
    }

    #[test]
    fn test_unknown_spell_is_hard_error() {
        let mut engine = engine();
        assert!(matches!(
            engine.add_sourced_xp(UNKNOWN, 10.0, "direct"),
            Err(Error::UnknownSpell(_))
        ));
        assert!(matches!(
            engine.add_raw_xp(UNKNOWN, 10.0),
            Err(Error::UnknownSpell(_))
        ));
        assert!(matches!(
            engine.set_target(UNKNOWN),
            Err(Error::UnknownSpell(_))
        ));
        // Queries stay soft.
        assert_eq!(engine.progress_percent(UNKNOWN), 0.0);
        assert_eq!(engine.required_xp(UNKNOWN), 0.0);
        assert!(!engine.is_available_to_learn(UNKNOWN));
    }

    #[test]
    fn test_training_source_scenario() {
        let mut engine = engine();
        engine.register_xp_source("training", "Training");
        engine.set_source_multiplier("training", 2.0);
        engine.set_source_cap("training", 80.0);

        let first = engine.add_sourced_xp(FLAMES, 30.0, "training").unwrap();
        assert_eq!(first, 60.0);
        assert_eq!(engine.current_xp(FLAMES), 60.0);

        let second = engine.add_sourced_xp(FLAMES, 30.0, "training").unwrap();
        assert_eq!(second, 20.0);
        assert_eq!(engine.current_xp(FLAMES), 80.0);
    }

    #[test]
    fn test_raw_grant_masters_once() {
        let mut engine = engine();
        let events = capture_events(&mut engine);

        let granted = engine.add_raw_xp(FLAMES, 150.0).unwrap();
        assert_eq!(granted, 100.0);
        assert!(engine.is_mastered(FLAMES));

        let mastered_count = events
            .borrow()
            .iter()
            .filter(|e| matches!(e, EngineEvent::SpellMastered { .. }))
            .count();
        assert_eq!(mastered_count, 1);

        // Re-granting reports the clamp result but emits no further mastery.
        let again = engine.add_raw_xp(FLAMES, 10.0).unwrap();
        assert_eq!(again, 0.0);
        let mastered_count = events
            .borrow()
            .iter()
            .filter(|e| matches!(e, EngineEvent::SpellMastered { .. }))
            .count();
        assert_eq!(mastered_count, 1);
    }

    #[test]
    fn test_zero_grant_emits_nothing() {
        let mut engine = engine();
        let events = capture_events(&mut engine);

        let granted = engine.add_sourced_xp(FLAMES, 0.0, "direct").unwrap();
        assert_eq!(granted, 0.0);
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn test_school_xp_routes_to_target() {
        let mut engine = engine();
        engine.set_target(FLAMES).unwrap();

        // The grant names Firebolt but lands on the Destruction target.
        let granted = engine.add_sourced_xp(FIREBOLT, 40.0, "school").unwrap();
        assert_eq!(granted, 40.0);
        assert_eq!(engine.current_xp(FLAMES), 40.0);
        assert_eq!(engine.current_xp(FIREBOLT), 0.0);
    }

    #[test]
    fn test_school_xp_discarded_without_target() {
        let mut engine = engine();
        let events = capture_events(&mut engine);
        let granted = engine.add_sourced_xp(FLAMES, 40.0, "school").unwrap();
        assert_eq!(granted, 0.0);
        assert_eq!(engine.current_xp(FLAMES), 0.0);
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn test_milestone_events() {
        let mut engine = engine();
        let events = capture_events(&mut engine);

        engine.add_sourced_xp(FLAMES, 60.0, "direct").unwrap();
        let milestones: Vec<u8> = events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                EngineEvent::MilestoneReached { percent, .. } => Some(*percent),
                _ => None,
            })
            .collect();
        assert_eq!(milestones, vec![25, 50]);
    }

    #[test]
    fn test_mastering_target_empties_slot() {
        let mut engine = engine();
        engine.set_target(FLAMES).unwrap();
        let events = capture_events(&mut engine);

        engine.add_raw_xp(FLAMES, 100.0).unwrap();
        assert_eq!(engine.get_target(School::Destruction), None);

        let saw_clear = events.borrow().iter().any(|e| {
            matches!(
                e,
                EngineEvent::TargetChanged {
                    school: School::Destruction,
                    target: None,
                }
            )
        });
        assert!(saw_clear, "expected a target-cleared event");
    }

    #[test]
    fn test_single_mode_target_exclusivity() {
        let mut settings = Settings::default();
        settings.learning.mode = LearningMode::Single;
        let mut engine = Engine::with_demo_spellbook(settings);

        engine.set_target(FLAMES).unwrap();
        engine.set_target(HEALING).unwrap();

        assert_eq!(engine.get_target(School::Destruction), None);
        assert_eq!(engine.get_target(School::Restoration), Some(HEALING));
        assert_eq!(engine.get_all_targets().len(), 1);
    }

    #[test]
    fn test_availability_follows_prerequisites() {
        let mut engine = engine();
        assert!(!engine.is_available_to_learn(FIREBOLT));
        assert!(engine.prerequisites_met(FLAMES));

        engine.add_raw_xp(FLAMES, 100.0).unwrap();
        assert!(engine.prerequisites_met(FIREBOLT));
        assert!(engine.is_available_to_learn(FIREBOLT));
    }

    #[test]
    fn test_unlocked_requires_host_grant() {
        let mut engine = engine();
        engine.add_raw_xp(FLAMES, 100.0).unwrap();
        assert!(engine.is_mastered(FLAMES));
        assert!(!engine.is_unlocked(FLAMES));

        engine.mark_spell_granted(FLAMES).unwrap();
        assert!(engine.is_unlocked(FLAMES));
    }

    #[test]
    fn test_early_grant_event_only_before_mastery() {
        let mut engine = engine();
        let events = capture_events(&mut engine);

        engine.mark_spell_granted(FLAMES).unwrap();
        assert_eq!(
            events.borrow().last(),
            Some(&EngineEvent::EarlyGranted { spell: FLAMES })
        );

        // Mastered spells being applied by the host is the normal path.
        engine.add_raw_xp(HEALING, 100.0).unwrap();
        let before = events.borrow().len();
        engine.mark_spell_granted(HEALING).unwrap();
        assert_eq!(events.borrow().len(), before);
    }

    #[test]
    fn test_source_registered_event_fires_once() {
        let mut engine = engine();
        let events = capture_events(&mut engine);

        engine.register_xp_source("quest", "Quest Rewards");
        engine.register_xp_source("quest", "Quest Rewards (renamed)");

        let count = events
            .borrow()
            .iter()
            .filter(|e| matches!(e, EngineEvent::SourceRegistered { .. }))
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_set_spell_xp_consistent_side_effects() {
        let mut engine = engine();
        let events = capture_events(&mut engine);

        engine.set_spell_xp(FLAMES, 100.0).unwrap();
        assert!(engine.is_mastered(FLAMES));
        let kinds: Vec<&str> = events
            .borrow()
            .iter()
            .map(|e| match e {
                EngineEvent::XpGained { .. } => "gain",
                EngineEvent::MilestoneReached { .. } => "milestone",
                EngineEvent::SpellMastered { .. } => "mastered",
                _ => "other",
            })
            .collect();
        // Milestones then mastery; no XP-gained for an override.
        assert_eq!(kinds, vec!["milestone", "milestone", "milestone", "mastered"]);
    }

    #[test]
    fn test_menu_toggles_have_no_engine_effect() {
        let mut engine = engine();
        assert!(!engine.is_menu_open());
        engine.open_menu();
        assert!(engine.is_menu_open());
        engine.toggle_menu();
        assert!(!engine.is_menu_open());
        engine.toggle_menu();
        engine.close_menu();
        assert!(!engine.is_menu_open());
        assert_eq!(engine.current_xp(FLAMES), 0.0);
    }

    #[test]
    fn test_snapshot_restore_roundtrip() {
        let mut engine = engine();
        engine.register_xp_source("training", "Training");
        engine.set_source_cap("training", 60.0);
        engine.add_sourced_xp(FLAMES, 45.0, "training").unwrap();
        engine.set_target(FIREBOLT).unwrap();

        let save = engine.snapshot();

        let mut revived = Engine::with_demo_spellbook(Settings::default());
        revived.restore(save);

        assert_eq!(revived.current_xp(FLAMES), 45.0);
        assert_eq!(revived.get_target(School::Destruction), Some(FIREBOLT));
        assert_eq!(revived.source_cap("training"), 60.0);
    }

    #[test]
    fn test_restore_rederives_required_from_current_table() {
        let mut engine = engine();
        engine.add_sourced_xp(FLAMES, 45.0, "direct").unwrap();
        let save = engine.snapshot();

        let mut settings = Settings::default();
        settings.thresholds.novice = 40.0;
        let mut revived = Engine::with_demo_spellbook(settings);
        revived.restore(save);

        assert_eq!(revived.required_xp(FLAMES), 40.0);
        assert_eq!(revived.current_xp(FLAMES), 40.0);
    }

    #[test]
    fn test_restore_keeps_entries_for_forgotten_spells() {
        let mut engine = engine();
        engine.add_sourced_xp(FLAMES, 45.0, "direct").unwrap();
        let save = engine.snapshot();

        // A spellbook that no longer carries the demo records.
        let mut revived = Engine::new(Settings::default(), Spellbook::new());
        revived.restore(save);
        assert_eq!(revived.current_xp(FLAMES), 45.0);
        assert_eq!(revived.required_xp(FLAMES), 100.0);
    }

    #[test]
    fn test_accumulated_bounded_after_any_sequence() {
        let mut engine = engine();
        engine.register_xp_source("wild", "Wild");
        engine.set_source_multiplier("wild", 9.0);

        for amount in [12.5, 0.0, 300.0, 7.0] {
            engine.add_sourced_xp(FLAMES, amount, "wild").unwrap();
            engine.add_raw_xp(FLAMES, amount).unwrap();
            let entry = engine.ledger().get(FLAMES).unwrap();
            assert!(entry.accumulated >= 0.0);
            assert!(entry.accumulated <= entry.required);
        }
    }

    #[test]
    fn test_restore_entry_from_save_struct() {
        // Restores go through SaveData; spot-check the entry shape survives.
        let mut engine = engine();
        engine.add_sourced_xp(FLAMES, 30.0, "direct").unwrap();
        let save = engine.snapshot();
        let entry: &ExperienceEntry = save.ledger.get(&FLAMES).unwrap();
        assert_eq!(entry.accumulated, 30.0);
        assert!(entry.milestones_hit.contains(&25));
    }
}
