//! Preset storage: bundled premade presets plus user presets
//!
//! Premade presets are compiled in from `presets/*.json` (and optionally read
//! from an extra directory). They are read-only: update and delete only ever
//! touch the user preset list kept under [`USER_PRESETS_KEY`].

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::constants::storage::USER_PRESETS_KEY;
use crate::storage::KeyValueStore;
use crate::types::{ConfigPreset, PresetKind, Settings};

/// Bundled premade presets: (file name, contents)
const BUNDLED_PRESETS: &[(&str, &str)] = &[
    ("minimal-dark.json", include_str!("../presets/minimal-dark.json")),
    ("nature-calm.json", include_str!("../presets/nature-calm.json")),
];

/// Anything the state core can bootstrap from
pub trait PresetSource {
    /// All presets, newest `lastModified` first
    fn load_presets(&self) -> Result<Vec<ConfigPreset>>;
}

pub struct PresetStore<S> {
    store: S,
    presets_dir: Option<PathBuf>,
}

fn parse_premade(file_name: &str, contents: &str) -> Option<ConfigPreset> {
    match serde_json::from_str::<ConfigPreset>(contents) {
        Ok(mut preset) => {
            preset.kind = PresetKind::Premade;
            Some(preset)
        }
        Err(e) => {
            error!(file = %file_name, error = %e, "Failed to parse premade preset, skipping");
            None
        }
    }
}

impl<S: KeyValueStore> PresetStore<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            presets_dir: None,
        }
    }

    /// Also load `*.json` premade presets from this directory
    pub fn with_presets_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.presets_dir = dir;
        self
    }

    fn premade_presets(&self) -> Vec<ConfigPreset> {
        let mut presets: Vec<ConfigPreset> = BUNDLED_PRESETS
            .iter()
            .filter_map(|(name, contents)| parse_premade(name, contents))
            .collect();

        if let Some(dir) = &self.presets_dir {
            presets.extend(read_presets_dir(dir));
        }

        presets
    }

    /// User presets; corrupt storage is cleared and treated as empty
    fn user_presets(&self) -> Result<Vec<ConfigPreset>> {
        let Some(json) = self.store.get(USER_PRESETS_KEY)? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str::<Vec<ConfigPreset>>(&json) {
            Ok(mut presets) => {
                for preset in &mut presets {
                    preset.kind = PresetKind::User;
                }
                Ok(presets)
            }
            Err(e) => {
                warn!(key = USER_PRESETS_KEY, error = %e, "User presets are corrupt, clearing them");
                self.store.remove(USER_PRESETS_KEY)?;
                Ok(Vec::new())
            }
        }
    }

    fn write_user_presets(&self, presets: &[ConfigPreset]) -> Result<()> {
        let json = serde_json::to_string(presets).context("Failed to serialize user presets")?;
        self.store
            .set(USER_PRESETS_KEY, &json)
            .context("Failed to persist user presets")
    }

    pub fn load_presets(&self) -> Result<Vec<ConfigPreset>> {
        let mut presets = self.premade_presets();
        presets.extend(self.user_presets()?);

        // Stable sort: equal timestamps keep premade-before-user order
        presets.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));

        debug!(count = presets.len(), "Loaded presets");
        Ok(presets)
    }

    pub fn find(&self, id: Uuid) -> Result<Option<ConfigPreset>> {
        Ok(self.load_presets()?.into_iter().find(|p| p.id == id))
    }

    pub fn save_user_preset(&self, name: &str, settings: &Settings) -> Result<ConfigPreset> {
        let preset = ConfigPreset {
            id: Uuid::new_v4(),
            name: name.to_string(),
            settings: settings.clone(),
            last_modified: Utc::now(),
            kind: PresetKind::User,
        };

        let mut presets = self.user_presets()?;
        presets.push(preset.clone());
        self.write_user_presets(&presets)?;

        info!(preset = %preset.name, id = %preset.id, "Saved new user preset");
        Ok(preset)
    }

    /// Returns `false` when `id` is not a user preset (premade ids included)
    pub fn update_user_preset(&self, id: Uuid, name: &str, settings: &Settings) -> Result<bool> {
        let mut presets = self.user_presets()?;

        let Some(preset) = presets.iter_mut().find(|p| p.id == id) else {
            debug!(id = %id, "No user preset to update");
            return Ok(false);
        };

        // lastModified must move forward even if the clock did not
        let now = Utc::now();
        preset.last_modified = if now > preset.last_modified {
            now
        } else {
            preset.last_modified + Duration::milliseconds(1)
        };
        preset.name = name.to_string();
        preset.settings = settings.clone();

        info!(preset = %name, id = %id, "Updated user preset");
        self.write_user_presets(&presets)?;
        Ok(true)
    }

    /// Returns `false` when `id` is not a user preset
    pub fn delete_user_preset(&self, id: Uuid) -> Result<bool> {
        let mut presets = self.user_presets()?;
        let before = presets.len();
        presets.retain(|p| p.id != id);

        if presets.len() == before {
            debug!(id = %id, "No user preset to delete");
            return Ok(false);
        }

        self.write_user_presets(&presets)?;
        info!(id = %id, "Deleted user preset");
        Ok(true)
    }
}

impl<S: KeyValueStore> PresetSource for PresetStore<S> {
    fn load_presets(&self) -> Result<Vec<ConfigPreset>> {
        PresetStore::load_presets(self)
    }
}

fn read_presets_dir(dir: &Path) -> Vec<ConfigPreset> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(path = %dir.display(), error = %e, "Cannot read presets directory");
            return Vec::new();
        }
    };

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    paths
        .iter()
        .filter_map(|path| {
            let name = path.display().to_string();
            match fs::read_to_string(path) {
                Ok(contents) => parse_premade(&name, &contents),
                Err(e) => {
                    warn!(file = %name, error = %e, "Failed to read premade preset, skipping");
                    None
                }
            }
        })
        .collect()
}

/// Write a preset as pretty JSON to `<dir>/<slug>.json`
pub fn export_preset(preset: &ConfigPreset, dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create export directory {:?}", dir))?;

    let path = dir.join(preset.export_file_name());
    let json = serde_json::to_string_pretty(preset).context("Failed to serialize preset")?;
    fs::write(&path, json).with_context(|| format!("Failed to write preset to {:?}", path))?;

    info!(preset = %preset.name, path = %path.display(), "Exported preset");
    Ok(path)
}
