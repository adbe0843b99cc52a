//! Session-state persistence.
//!
//! The engine's serialize/deserialize contract is [`SaveData`]: the ledger,
//! custom source overrides, and learning targets, under a schema version so
//! older saves migrate (missing fields default). File IO is atomic —
//! temp-file write, sync, rename — with advisory locking, and a malformed
//! blob falls back to empty state rather than refusing to start.

use crate::engine::Engine;
use crate::types::{ExperienceEntry, School, SpellId, XpSourceDescriptor};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Current save schema version
pub const SAVE_VERSION: u32 = 1;

/// Serializable per-session engine state
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SaveData {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub saved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ledger: BTreeMap<SpellId, ExperienceEntry>,
    /// Custom sources plus built-ins whose tuning changed
    #[serde(default)]
    pub sources: HashMap<String, XpSourceDescriptor>,
    #[serde(default)]
    pub targets: BTreeMap<School, SpellId>,
}

impl Default for SaveData {
    fn default() -> Self {
        Self {
            version: SAVE_VERSION,
            saved_at: None,
            ledger: BTreeMap::new(),
            sources: HashMap::new(),
            targets: BTreeMap::new(),
        }
    }
}

impl SaveData {
    /// Snapshot an engine's serializable state
    pub fn capture(engine: &Engine) -> Self {
        Self {
            version: SAVE_VERSION,
            saved_at: Some(Utc::now()),
            ledger: engine
                .ledger()
                .entries()
                .map(|(id, entry)| (id, entry.clone()))
                .collect(),
            sources: engine.sources().overrides(),
            targets: engine.get_all_targets(),
        }
    }
}

/// Load a save blob from a file with shared locking.
///
/// Returns default (empty) state if the file doesn't exist, can't be read,
/// is malformed, or carries a newer schema than this build understands.
pub fn load(path: &Path) -> Result<SaveData> {
    if !path.exists() {
        tracing::info!("No save file found, starting with empty state");
        return Ok(SaveData::default());
    }

    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            tracing::warn!("Unable to open save file {:?}: {}. Using defaults.", path, e);
            return Ok(SaveData::default());
        }
    };

    if let Err(e) = file.lock_shared() {
        tracing::warn!("Unable to lock save file {:?}: {}. Using defaults.", path, e);
        return Ok(SaveData::default());
    }

    let mut contents = String::new();
    let mut reader = std::io::BufReader::new(&file);
    if let Err(e) = reader.read_to_string(&mut contents) {
        let _ = file.unlock();
        tracing::warn!("Failed to read save file {:?}: {}. Using defaults.", path, e);
        return Ok(SaveData::default());
    }

    file.unlock()?;

    match serde_json::from_str::<SaveData>(&contents) {
        Ok(save) if save.version > SAVE_VERSION => {
            tracing::warn!(
                "Save file {:?} has schema v{} (this build understands v{}). Using defaults.",
                path,
                save.version,
                SAVE_VERSION
            );
            Ok(SaveData::default())
        }
        Ok(save) => {
            tracing::debug!("Loaded save from {:?} (schema v{})", path, save.version);
            Ok(save)
        }
        Err(e) => {
            tracing::warn!("Failed to parse save file {:?}: {}. Using defaults.", path, e);
            Ok(SaveData::default())
        }
    }
}

/// Write a save blob to a file with exclusive locking.
///
/// Atomically writes by:
/// 1. Writing to a temp file in the same directory
/// 2. Syncing to disk
/// 3. Renaming over the original
pub fn save(data: &SaveData, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let temp = NamedTempFile::new_in(path.parent().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::Other, "save path missing parent")
    })?)?;

    temp.as_file().lock_exclusive()?;

    {
        let mut writer = std::io::BufWriter::new(temp.as_file());
        let contents = serde_json::to_string(data)?;
        writer.write_all(contents.as_bytes())?;
        writer.flush()?;
    }

    temp.as_file().sync_all()?;
    temp.as_file().unlock()?;

    temp.persist(path).map_err(|e| Error::Io(e.error))?;

    tracing::debug!("Saved engine state to {:?}", path);
    Ok(())
}

/// Snapshot an engine to a file
pub fn save_engine(engine: &Engine, path: &Path) -> Result<()> {
    save(&engine.snapshot(), path)
}

/// Restore an engine from a file (empty state if absent or unreadable)
pub fn load_engine(engine: &mut Engine, path: &Path) -> Result<()> {
    let data = load(path)?;
    engine.restore(data);
    Ok(())
}
