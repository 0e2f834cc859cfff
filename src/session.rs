//! Persisted dashboard session
//!
//! A [`Session`] owns the live [`ConfigState`] and writes a snapshot of it to
//! the key-value store after every mutation that changed it. The only
//! constructor is [`Session::bootstrap`], so nothing can touch the state
//! before the initial preset load has finished.

use anyhow::{Context, Result};
use chrono::Utc;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::constants::storage::SESSION_KEY;
use crate::presets::{PresetStore, export_preset};
use crate::state::ConfigState;
use crate::storage::KeyValueStore;
use crate::types::{ConfigPreset, PresetKind};

/// Name used when exporting settings that belong to no preset
const UNSAVED_EXPORT_NAME: &str = "Current Settings";

pub struct Session<S> {
    state: ConfigState,
    store: S,
    presets: PresetStore<S>,
    /// Last JSON written under [`SESSION_KEY`]
    snapshot: String,
}

/// Read the stored snapshot; a corrupt one is logged and cleared
fn restore_snapshot(store: &impl KeyValueStore) -> Result<Option<ConfigState>> {
    let Some(json) = store.get(SESSION_KEY)? else {
        debug!("No stored session snapshot");
        return Ok(None);
    };

    match serde_json::from_str::<ConfigState>(&json) {
        Ok(state) => Ok(Some(state.repaired())),
        Err(e) => {
            warn!(key = SESSION_KEY, error = %e, "Session snapshot is corrupt, clearing it");
            store.remove(SESSION_KEY)?;
            Ok(None)
        }
    }
}

impl<S: KeyValueStore> Session<S> {
    /// Build the initial state
    ///
    /// With `resume` set a valid stored snapshot wins over the newest preset
    /// and keeps its background. Otherwise the newest preset is loaded and a
    /// random background is shown. Storage failures are logged and the
    /// session carries on in memory.
    pub fn bootstrap(store: S, presets: PresetStore<S>, resume: bool) -> Self {
        let restored = if resume {
            restore_snapshot(&store).unwrap_or_else(|e| {
                warn!(error = ?e, "Cannot read session snapshot, starting from presets");
                None
            })
        } else {
            None
        };

        let state = match restored {
            Some(state) => {
                info!(preset = ?state.current_preset_id(), "Resumed previous session");
                state
            }
            None => {
                let mut state = ConfigState::default();
                state.initialize_from_preset(&presets);
                state.randomize_background();
                state
            }
        };

        let mut session = Self {
            state,
            store,
            presets,
            snapshot: String::new(),
        };
        if let Err(e) = session.persist() {
            warn!(error = ?e, "Cannot write session snapshot, continuing in memory");
        }
        session
    }

    pub fn state(&self) -> &ConfigState {
        &self.state
    }

    pub fn presets(&self) -> &PresetStore<S> {
        &self.presets
    }

    /// Run a mutation, then persist if the state changed
    pub fn update<R>(&mut self, mutate: impl FnOnce(&mut ConfigState) -> R) -> Result<R> {
        let result = mutate(&mut self.state);
        self.persist()?;
        Ok(result)
    }

    fn persist(&mut self) -> Result<()> {
        let json = serde_json::to_string(&self.state).context("Failed to serialize session")?;
        if json == self.snapshot {
            return Ok(());
        }

        self.store
            .set(SESSION_KEY, &json)
            .context("Failed to persist session")?;
        self.snapshot = json;
        Ok(())
    }

    /// Save the live settings as a new user preset and select it
    pub fn save_as_preset(&mut self, name: &str) -> Result<ConfigPreset> {
        let preset = self
            .presets
            .save_user_preset(name, self.state.settings())?;
        self.update(|state| state.mark_saved_as(preset.id))?;
        Ok(preset)
    }

    /// Overwrite the selected user preset with the live settings
    ///
    /// Returns `false` when nothing is selected or the selection is premade.
    pub fn save_to_current_preset(&mut self) -> Result<bool> {
        let Some(id) = self.state.current_preset_id() else {
            warn!("No preset selected, nothing to save to");
            return Ok(false);
        };
        let Some(current) = self.presets.find(id)? else {
            warn!(id = %id, "Selected preset no longer exists");
            return Ok(false);
        };
        if current.is_premade() {
            warn!(preset = %current.name, "Premade presets are read-only");
            return Ok(false);
        }

        if !self
            .presets
            .update_user_preset(id, &current.name, self.state.settings())?
        {
            return Ok(false);
        }
        self.update(|state| state.mark_saved_as(id))?;
        Ok(true)
    }

    /// Returns `false` for an unknown id
    pub fn load_preset_by_id(&mut self, id: Uuid) -> Result<bool> {
        let Some(preset) = self.presets.find(id)? else {
            warn!(id = %id, "No preset with this id");
            return Ok(false);
        };
        self.update(|state| state.load_preset(&preset))?;
        Ok(true)
    }

    /// Delete a user preset; premade presets are refused
    pub fn delete_preset(&mut self, id: Uuid) -> Result<bool> {
        if let Some(preset) = self.presets.find(id)?.filter(ConfigPreset::is_premade) {
            warn!(preset = %preset.name, "Premade presets cannot be deleted");
            return Ok(false);
        }

        if !self.presets.delete_user_preset(id)? {
            return Ok(false);
        }
        if self.state.current_preset_id() == Some(id) {
            self.update(|state| state.clear_current_preset())?;
        }
        Ok(true)
    }

    /// Export the live settings under the selected preset's identity
    pub fn export_current(&self, dir: &Path) -> Result<PathBuf> {
        let selected = match self.state.current_preset_id() {
            Some(id) => self.presets.find(id)?,
            None => None,
        };

        let preset = match selected {
            Some(preset) => ConfigPreset {
                settings: self.state.settings().clone(),
                last_modified: if self.state.is_modified() {
                    Utc::now()
                } else {
                    preset.last_modified
                },
                ..preset
            },
            None => ConfigPreset {
                id: Uuid::new_v4(),
                name: UNSAVED_EXPORT_NAME.to_string(),
                settings: self.state.settings().clone(),
                last_modified: Utc::now(),
                kind: PresetKind::User,
            },
        };

        export_preset(&preset, dir)
    }
}
