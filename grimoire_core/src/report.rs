//! CSV progress export.
//!
//! Writes one row per ledger entry for spreadsheet inspection. Diagnostic
//! surface for the debug console; the engine itself never reads these.

use crate::engine::Engine;
use crate::Result;
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct ProgressRow {
    spell: String,
    name: String,
    school: String,
    tier: String,
    xp: f64,
    required: f64,
    percent: f64,
    mastered: bool,
}

/// Export every ledger entry to a CSV file, one row per spell.
///
/// Rows are sorted by school then name. Entries for spells the spellbook
/// no longer resolves are skipped. Returns the number of rows written.
pub fn write_progress_csv(engine: &Engine, path: &Path) -> Result<usize> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut rows: Vec<ProgressRow> = engine
        .ledger()
        .entries()
        .filter_map(|(id, entry)| {
            let record = engine.spellbook().get(id)?;
            Some(ProgressRow {
                spell: id.to_string(),
                name: record.name.clone(),
                school: record.school.to_string(),
                tier: record.tier.to_string(),
                xp: entry.accumulated,
                required: entry.required,
                percent: entry.percent(),
                mastered: entry.mastered,
            })
        })
        .collect();
    rows.sort_by(|a, b| (&a.school, &a.name).cmp(&(&b.school, &b.name)));

    let mut writer = csv::Writer::from_path(path)?;
    for row in &rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    tracing::info!("Wrote {} progress rows to {:?}", rows.len(), path);
    Ok(rows.len())
}
