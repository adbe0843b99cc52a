//! Configuration file support for Grimoire.
//!
//! Settings are loaded from `$XDG_CONFIG_HOME/grimoire/config.toml`.
//! Everything has a default, so a missing or partial file is never an error.

use crate::types::{LearningMode, Tier};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Engine-wide settings
///
/// Read by the grant calculator and the facade; written only via
/// configuration load, never by runtime XP events.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub xp: XpConfig,

    #[serde(default)]
    pub learning: LearningConfig,

    #[serde(default)]
    pub thresholds: ThresholdConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Optional spellbook definition file for the debug console
    #[serde(default)]
    pub spellbook_file: Option<PathBuf>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            spellbook_file: None,
        }
    }
}

/// XP tuning configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct XpConfig {
    #[serde(default = "default_global_multiplier")]
    pub global_multiplier: f64,

    /// Progress percents at which milestone events fire
    #[serde(default = "default_milestone_percents")]
    pub milestone_percents: Vec<u8>,
}

impl Default for XpConfig {
    fn default() -> Self {
        Self {
            global_multiplier: default_global_multiplier(),
            milestone_percents: default_milestone_percents(),
        }
    }
}

impl XpConfig {
    /// Global multiplier clamped to be non-negative
    pub fn effective_multiplier(&self) -> f64 {
        self.global_multiplier.max(0.0)
    }

    /// Milestone percents restricted to (0, 100), deduplicated, ascending
    pub fn milestones(&self) -> Vec<u8> {
        let mut percents: Vec<u8> = self
            .milestone_percents
            .iter()
            .copied()
            .filter(|p| (1..=99).contains(p))
            .collect();
        percents.sort_unstable();
        percents.dedup();
        percents
    }
}

/// Learning target configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct LearningConfig {
    #[serde(default)]
    pub mode: LearningMode,
}

/// Tier → required XP table
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ThresholdConfig {
    #[serde(default = "default_novice_xp")]
    pub novice: f64,
    #[serde(default = "default_apprentice_xp")]
    pub apprentice: f64,
    #[serde(default = "default_adept_xp")]
    pub adept: f64,
    #[serde(default = "default_expert_xp")]
    pub expert: f64,
    #[serde(default = "default_master_xp")]
    pub master: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            novice: default_novice_xp(),
            apprentice: default_apprentice_xp(),
            adept: default_adept_xp(),
            expert: default_expert_xp(),
            master: default_master_xp(),
        }
    }
}

impl ThresholdConfig {
    /// Required XP for a tier
    pub fn xp_for_tier(&self, tier: Tier) -> f64 {
        let xp = match tier {
            Tier::Novice => self.novice,
            Tier::Apprentice => self.apprentice,
            Tier::Adept => self.adept,
            Tier::Expert => self.expert,
            Tier::Master => self.master,
        };
        xp.max(0.0)
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        let home = std::env::var("HOME").expect("HOME environment variable not set");
        PathBuf::from(home).join(".local/share")
    });
    base.join("grimoire")
}

fn default_global_multiplier() -> f64 {
    1.0
}

fn default_milestone_percents() -> Vec<u8> {
    vec![25, 50, 75]
}

fn default_novice_xp() -> f64 {
    100.0
}

fn default_apprentice_xp() -> f64 {
    250.0
}

fn default_adept_xp() -> f64 {
    500.0
}

fn default_expert_xp() -> f64 {
    1000.0
}

fn default_master_xp() -> f64 {
    2000.0
}

impl Settings {
    /// Load settings from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load settings from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&contents)?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(settings)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            let home = std::env::var("HOME").expect("HOME environment variable not set");
            PathBuf::from(home).join(".config")
        });
        base.join("grimoire").join("config.toml")
    }

    /// Save the current settings to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
