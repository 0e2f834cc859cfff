//! Live dashboard configuration state
//!
//! `ConfigState` is the single source of truth for the settings being shown.
//! Every method is synchronous and free of I/O; persistence is layered on top
//! by [`crate::session::Session`].
//!
//! Invariants kept by every operation:
//! - `quotes` and `backgrounds` are never empty
//! - `current_background` is always one of `backgrounds`
//! - `is_modified` is set by every edit and cleared only by a preset load
//!   or an explicit reset

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::codec;
use crate::color::HexColor;
use crate::config::defaults::{default_backgrounds, default_quotes};
use crate::constants::rotation::{MAX_INTERVAL_SECS, MIN_INTERVAL_SECS};
use crate::presets::PresetSource;
use crate::types::{Background, BackgroundPatch, ConfigPreset, Quote, Settings};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigState {
    #[serde(flatten)]
    settings: Settings,
    current_background: Background,
    is_modified: bool,
    current_preset_id: Option<Uuid>,
}

fn clamp_interval(seconds: u32) -> u32 {
    if seconds < MIN_INTERVAL_SECS || seconds > MAX_INTERVAL_SECS {
        let clamped = seconds.clamp(MIN_INTERVAL_SECS, MAX_INTERVAL_SECS);
        warn!(
            rotation_interval = seconds,
            min = MIN_INTERVAL_SECS,
            max = MAX_INTERVAL_SECS,
            using = clamped,
            "rotation_interval out of range, clamping"
        );
        clamped
    } else {
        seconds
    }
}

/// Bring loaded settings back inside the invariants
fn normalize(mut settings: Settings) -> Settings {
    if settings.quotes.is_empty() {
        debug!("Settings have no quotes, using defaults");
        settings.quotes = default_quotes();
    }
    if settings.backgrounds.is_empty() {
        debug!("Settings have no backgrounds, using defaults");
        settings.backgrounds = default_backgrounds();
    }
    for background in &mut settings.backgrounds {
        background.clamp_tunables();
    }
    settings.rotation_interval = clamp_interval(settings.rotation_interval);
    settings
}

fn first_background(settings: &Settings) -> Background {
    settings
        .backgrounds
        .first()
        .cloned()
        .unwrap_or_else(|| Background::new("", ""))
}

impl Default for ConfigState {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl ConfigState {
    /// Unmodified state with no preset selected
    pub fn new(settings: Settings) -> Self {
        let settings = normalize(settings);
        Self {
            current_background: first_background(&settings),
            settings,
            is_modified: false,
            current_preset_id: None,
        }
    }

    /// Re-establish invariants on a state that came from outside (a stored snapshot)
    pub fn repaired(self) -> Self {
        let settings = normalize(self.settings);
        let current_background = settings
            .backgrounds
            .iter()
            .find(|b| b.id == self.current_background.id)
            .cloned()
            .unwrap_or_else(|| first_background(&settings));

        Self {
            settings,
            current_background,
            is_modified: self.is_modified,
            current_preset_id: self.current_preset_id,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn current_background(&self) -> &Background {
        &self.current_background
    }

    /// The quote at the head of the rotation
    pub fn current_quote(&self) -> Option<&Quote> {
        self.settings.quotes.first()
    }

    pub fn is_modified(&self) -> bool {
        self.is_modified
    }

    pub fn current_preset_id(&self) -> Option<Uuid> {
        self.current_preset_id
    }

    pub fn set_time_color(&mut self, color: HexColor) {
        self.settings.time_color = color;
        self.mark_as_modified();
    }

    pub fn set_quote_color(&mut self, color: HexColor) {
        self.settings.quote_color = color;
        self.mark_as_modified();
    }

    /// Merge `patch` into the background with `id` (and into the current
    /// background if it is that one). Returns whether the id was found.
    ///
    /// An unknown id changes nothing but still counts as an edit.
    pub fn set_background_config(&mut self, id: Uuid, patch: &BackgroundPatch) -> bool {
        let mut found = false;
        for background in self.settings.backgrounds.iter_mut().filter(|b| b.id == id) {
            patch.apply_to(background);
            found = true;
        }

        if self.current_background.id == id {
            patch.apply_to(&mut self.current_background);
        }

        if !found {
            warn!(id = %id, "No background with this id, nothing to update");
        }
        self.mark_as_modified();
        found
    }

    /// Advance the repeat mode of the background with `id` to the next option.
    /// Returns `false` (nothing changed) for an unknown id.
    pub fn next_background_repeat(&mut self, id: Uuid) -> bool {
        let Some(repeat) = self
            .settings
            .backgrounds
            .iter()
            .find(|b| b.id == id)
            .map(|b| b.repeat.next())
        else {
            warn!(id = %id, "No background with this id, repeat unchanged");
            return false;
        };

        let patch = BackgroundPatch {
            repeat: Some(repeat),
            ..Default::default()
        };
        self.set_background_config(id, &patch)
    }

    pub fn set_rotation_interval(&mut self, seconds: u32) {
        self.settings.rotation_interval = clamp_interval(seconds);
        self.mark_as_modified();
    }

    pub fn set_rotation_paused(&mut self, paused: bool) {
        self.settings.is_rotation_paused = paused;
        self.mark_as_modified();
    }

    /// Replace quotes from bulk-edit text. Returns `false` (state untouched)
    /// when the text holds no valid entry.
    pub fn set_quotes(&mut self, text: &str) -> bool {
        let quotes = codec::decode_quotes(text);
        if quotes.is_empty() {
            debug!("Quote text has no valid entries, keeping current quotes");
            return false;
        }

        info!(count = quotes.len(), "Replacing quotes");
        self.settings.quotes = quotes;
        self.mark_as_modified();
        true
    }

    /// Replace backgrounds from bulk-edit text. Returns `false` (state
    /// untouched) when the text holds no valid entry.
    ///
    /// Entries matching an existing background by `(url, name)` keep its id
    /// and tunables; each existing background is reused at most once so ids
    /// stay unique. The first entry becomes the current background.
    pub fn set_backgrounds(&mut self, text: &str) -> bool {
        let decoded = codec::decode_backgrounds(text);
        if decoded.is_empty() {
            debug!("Background text has no valid entries, keeping current backgrounds");
            return false;
        }

        let mut unclaimed: Vec<Option<Background>> =
            self.settings.backgrounds.iter().cloned().map(Some).collect();

        let backgrounds: Vec<Background> = decoded
            .into_iter()
            .map(|fresh| {
                unclaimed
                    .iter_mut()
                    .find(|slot| matches!(slot, Some(existing) if existing.same_source(&fresh)))
                    .and_then(Option::take)
                    .unwrap_or(fresh)
            })
            .collect();

        info!(count = backgrounds.len(), "Replacing backgrounds");
        self.current_background = backgrounds[0].clone();
        self.settings.backgrounds = backgrounds;
        self.mark_as_modified();
        true
    }

    /// Show a uniformly chosen background. Not an edit.
    pub fn randomize_background(&mut self) {
        self.randomize_background_with(&mut rand::rng());
    }

    pub fn randomize_background_with<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let backgrounds = &self.settings.backgrounds;
        if backgrounds.is_empty() {
            return;
        }
        let index = rng.random_range(0..backgrounds.len());
        self.current_background = backgrounds[index].clone();
        debug!(background = %self.current_background.name, "Switched background");
    }

    /// Move the first quote to the end (round-robin). Not an edit.
    pub fn randomize_quote(&mut self) {
        if !self.settings.quotes.is_empty() {
            self.settings.quotes.rotate_left(1);
        }
    }

    /// Replace everything with the preset's settings and select it
    pub fn load_preset(&mut self, preset: &ConfigPreset) {
        let settings = normalize(preset.settings.clone());
        self.current_background = first_background(&settings);
        self.settings = settings;
        self.current_preset_id = Some(preset.id);
        self.is_modified = false;
        info!(preset = %preset.name, id = %preset.id, "Loaded preset");
    }

    /// Startup path: load the newest preset, or fall back to defaults
    pub fn initialize_from_preset(&mut self, source: &impl PresetSource) {
        match source.load_presets() {
            Ok(presets) => match presets.first() {
                Some(preset) => self.load_preset(preset),
                None => {
                    warn!("No presets available, using default settings");
                    *self = ConfigState::default();
                }
            },
            Err(e) => {
                error!(error = ?e, "Failed to load initial preset, using default settings");
                *self = ConfigState::default();
            }
        }
    }

    pub fn mark_as_modified(&mut self) {
        self.is_modified = true;
    }

    pub fn reset_modified_state(&mut self) {
        self.is_modified = false;
    }

    /// Forget the selected preset (it was deleted)
    pub fn clear_current_preset(&mut self) {
        self.current_preset_id = None;
    }

    /// Select a preset that now holds exactly the live settings
    pub fn mark_saved_as(&mut self, preset_id: Uuid) {
        self.current_preset_id = Some(preset_id);
        self.reset_modified_state();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BackgroundRepeat, PresetKind, Rotation};
    use anyhow::anyhow;
    use chrono::Utc;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    struct FixedPresets(Vec<ConfigPreset>);

    impl PresetSource for FixedPresets {
        fn load_presets(&self) -> anyhow::Result<Vec<ConfigPreset>> {
            Ok(self.0.clone())
        }
    }

    struct FailingPresets;

    impl PresetSource for FailingPresets {
        fn load_presets(&self) -> anyhow::Result<Vec<ConfigPreset>> {
            Err(anyhow!("disk on fire"))
        }
    }

    fn preset(name: &str, settings: Settings) -> ConfigPreset {
        ConfigPreset {
            id: Uuid::new_v4(),
            name: name.to_string(),
            settings,
            last_modified: Utc::now(),
            kind: PresetKind::User,
        }
    }

    fn quote_texts(state: &ConfigState) -> Vec<&str> {
        state.settings().quotes.iter().map(|q| q.text.as_str()).collect()
    }

    #[test]
    fn test_default_state_invariants() {
        let state = ConfigState::default();

        assert!(!state.is_modified());
        assert_eq!(state.current_preset_id(), None);
        assert_eq!(state.current_background(), &state.settings().backgrounds[0]);
    }

    #[test]
    fn test_setters_mark_modified() {
        let setters: [fn(&mut ConfigState); 7] = [
            |s| s.set_time_color(HexColor::white()),
            |s| s.set_quote_color(HexColor::white()),
            |s| {
                let id = s.current_background().id;
                s.set_background_config(id, &BackgroundPatch::default());
            },
            |s| s.set_rotation_interval(60),
            |s| s.set_rotation_paused(true),
            |s| {
                s.set_quotes("Text\nAuthor");
            },
            |s| {
                s.set_backgrounds("http://a/img.jpg\nA");
            },
        ];

        for setter in setters {
            let mut state = ConfigState::default();
            setter(&mut state);
            assert!(state.is_modified());
        }
    }

    #[test]
    fn test_set_time_and_quote_color() {
        let mut state = ConfigState::default();
        state.set_time_color(HexColor::parse("#ff0000").unwrap());
        state.set_quote_color(HexColor::parse("#00ff00").unwrap());

        assert_eq!(state.settings().time_color.as_str(), "#ff0000");
        assert_eq!(state.settings().quote_color.as_str(), "#00ff00");
    }

    #[test]
    fn test_set_background_config_updates_current_and_list() {
        let mut state = ConfigState::default();
        let id = state.current_background().id;
        let others_before: Vec<Background> = state.settings().backgrounds[1..].to_vec();

        let found = state.set_background_config(
            id,
            &BackgroundPatch {
                scale: Some(2.0),
                ..Default::default()
            },
        );

        assert!(found);
        assert_eq!(state.current_background().scale, 2.0);
        assert_eq!(state.settings().backgrounds[0].scale, 2.0);
        assert_eq!(&state.settings().backgrounds[1..], &others_before[..]);
    }

    #[test]
    fn test_set_background_config_non_current_leaves_current_alone() {
        let mut state = ConfigState::default();
        let other = state.settings().backgrounds[2].id;

        state.set_background_config(
            other,
            &BackgroundPatch {
                rotation: Some(Rotation::Deg90),
                ..Default::default()
            },
        );

        assert_eq!(state.settings().backgrounds[2].rotation, Rotation::Deg90);
        assert_eq!(state.current_background().rotation, Rotation::Deg0);
    }

    #[test]
    fn test_set_background_config_unknown_id() {
        let mut state = ConfigState::default();
        let before = state.settings().clone();

        let found = state.set_background_config(
            Uuid::new_v4(),
            &BackgroundPatch {
                blur: Some(5),
                ..Default::default()
            },
        );

        assert!(!found);
        assert_eq!(state.settings(), &before);
        assert_eq!(state.current_background(), &before.backgrounds[0]);
        assert!(state.is_modified());
    }

    #[test]
    fn test_next_background_repeat_cycles_current() {
        let mut state = ConfigState::default();
        let id = state.current_background().id;

        assert!(state.next_background_repeat(id));
        assert_eq!(state.current_background().repeat, BackgroundRepeat::Repeat);
        assert_eq!(state.settings().backgrounds[0].repeat, BackgroundRepeat::Repeat);

        state.next_background_repeat(id);
        assert_eq!(state.current_background().repeat, BackgroundRepeat::RepeatX);
    }

    #[test]
    fn test_next_background_repeat_targets_given_background() {
        let mut state = ConfigState::default();
        let other = state.settings().backgrounds[1].id;

        assert!(state.next_background_repeat(other));

        assert_eq!(state.settings().backgrounds[1].repeat, BackgroundRepeat::Repeat);
        assert_eq!(state.settings().backgrounds[0].repeat, BackgroundRepeat::NoRepeat);
        assert_eq!(state.current_background().repeat, BackgroundRepeat::NoRepeat);
    }

    #[test]
    fn test_next_background_repeat_unknown_id() {
        let mut state = ConfigState::default();
        let before = state.clone();

        assert!(!state.next_background_repeat(Uuid::new_v4()));
        assert_eq!(state, before);
    }

    #[test]
    fn test_rotation_interval_clamped() {
        let mut state = ConfigState::default();

        state.set_rotation_interval(1);
        assert_eq!(state.settings().rotation_interval, 5);

        state.set_rotation_interval(10_000);
        assert_eq!(state.settings().rotation_interval, 300);

        state.set_rotation_interval(45);
        assert_eq!(state.settings().rotation_interval, 45);
    }

    #[test]
    fn test_empty_text_leaves_state_unchanged() {
        let mut state = ConfigState::default();
        let before = state.clone();

        assert!(!state.set_quotes(""));
        assert!(!state.set_backgrounds(""));
        assert!(!state.set_quotes("one line only"));
        assert!(!state.set_backgrounds("\n\n  \nname without url"));

        assert_eq!(state, before);
        assert!(!state.is_modified());
    }

    #[test]
    fn test_set_quotes_replaces_list() {
        let mut state = ConfigState::default();

        assert!(state.set_quotes("A\nX\n\nB\nY"));
        assert_eq!(quote_texts(&state), vec!["A", "B"]);
    }

    #[test]
    fn test_set_backgrounds_scenario_from_defaults() {
        let mut state = ConfigState::default();
        let old_ids: Vec<Uuid> = state.settings().backgrounds.iter().map(|b| b.id).collect();

        assert!(state.set_backgrounds("http://a/img.jpg\nA\n\nhttp://b/img.jpg\nB"));

        let backgrounds = &state.settings().backgrounds;
        assert_eq!(backgrounds.len(), 2);
        assert!(backgrounds.iter().all(|b| !old_ids.contains(&b.id)));
        assert_eq!(state.current_background().url, "http://a/img.jpg");
        assert_eq!(state.current_background(), &backgrounds[0]);
        assert!(state.is_modified());
    }

    #[test]
    fn test_set_backgrounds_preserves_matching_entries() {
        let mut state = ConfigState::default();
        let kept = state.settings().backgrounds[1].clone();
        state.set_background_config(
            kept.id,
            &BackgroundPatch {
                blur: Some(7),
                ..Default::default()
            },
        );

        let text = format!("http://new/img.jpg\nNew\n\n{}\n{}", kept.url, kept.name);
        assert!(state.set_backgrounds(&text));

        let backgrounds = &state.settings().backgrounds;
        assert_eq!(backgrounds[1].id, kept.id);
        assert_eq!(backgrounds[1].blur, 7);
        assert_ne!(backgrounds[0].id, kept.id);
        assert_eq!(backgrounds[0].blur, 0);
        assert_eq!(state.current_background().url, "http://new/img.jpg");
    }

    #[test]
    fn test_set_backgrounds_duplicate_entries_get_distinct_ids() {
        let mut state = ConfigState::default();
        let existing = state.settings().backgrounds[0].clone();

        let text = format!(
            "{url}\n{name}\n\n{url}\n{name}",
            url = existing.url,
            name = existing.name
        );
        assert!(state.set_backgrounds(&text));

        let backgrounds = &state.settings().backgrounds;
        assert_eq!(backgrounds[0].id, existing.id);
        assert_ne!(backgrounds[1].id, existing.id);
    }

    #[test]
    fn test_randomize_quote_is_round_robin() {
        let mut state = ConfigState::default();
        assert!(state.set_quotes("A\na\n\nB\nb\n\nC\nc"));
        state.reset_modified_state();

        state.randomize_quote();
        assert_eq!(quote_texts(&state), vec!["B", "C", "A"]);
        assert_eq!(state.current_quote().unwrap().text, "B");

        state.randomize_quote();
        assert_eq!(quote_texts(&state), vec!["C", "A", "B"]);
        assert!(!state.is_modified());
    }

    #[test]
    fn test_randomize_background_picks_member_without_modifying() {
        let mut state = ConfigState::default();
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..50 {
            state.randomize_background_with(&mut rng);
            assert!(state.settings().backgrounds.contains(state.current_background()));
        }
        assert!(!state.is_modified());
    }

    #[test]
    fn test_randomize_background_reaches_every_entry() {
        let mut state = ConfigState::default();
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen = std::collections::HashSet::new();

        for _ in 0..200 {
            state.randomize_background_with(&mut rng);
            seen.insert(state.current_background().id);
        }
        assert_eq!(seen.len(), state.settings().backgrounds.len());
    }

    #[test]
    fn test_load_preset_resets_flags() {
        let mut state = ConfigState::default();
        state.set_rotation_paused(true);

        let mut settings = Settings::default();
        settings.rotation_interval = 120;
        let preset = preset("Slow", settings);
        state.load_preset(&preset);

        assert!(!state.is_modified());
        assert_eq!(state.current_preset_id(), Some(preset.id));
        assert_eq!(state.settings().rotation_interval, 120);
        assert!(!state.settings().is_rotation_paused);
        assert_eq!(state.current_background(), &state.settings().backgrounds[0]);
    }

    #[test]
    fn test_load_preset_with_empty_lists_uses_defaults() {
        let mut state = ConfigState::default();
        let mut settings = Settings::default();
        settings.quotes.clear();
        settings.backgrounds.clear();

        state.load_preset(&preset("Empty", settings));

        assert_eq!(state.settings().quotes, default_quotes());
        assert_eq!(state.settings().backgrounds, default_backgrounds());
    }

    #[test]
    fn test_initialize_from_first_preset() {
        let mut first_settings = Settings::default();
        first_settings.rotation_interval = 15;
        let first = preset("First", first_settings);
        let second = preset("Second", Settings::default());

        let mut state = ConfigState::default();
        state.initialize_from_preset(&FixedPresets(vec![first.clone(), second]));

        assert_eq!(state.current_preset_id(), Some(first.id));
        assert_eq!(state.settings().rotation_interval, 15);
        assert!(!state.is_modified());
    }

    #[test]
    fn test_initialize_falls_back_to_defaults() {
        let mut state = ConfigState::default();
        state.set_rotation_interval(99);
        state.initialize_from_preset(&FixedPresets(Vec::new()));
        assert_eq!(state, ConfigState::default());

        let mut state = ConfigState::default();
        state.set_rotation_interval(99);
        state.initialize_from_preset(&FailingPresets);
        assert_eq!(state, ConfigState::default());
        assert_eq!(state.current_preset_id(), None);
    }

    #[test]
    fn test_modified_flag_controls() {
        let mut state = ConfigState::default();

        state.mark_as_modified();
        assert!(state.is_modified());

        state.reset_modified_state();
        assert!(!state.is_modified());
    }

    #[test]
    fn test_repaired_repoints_dangling_current_background() {
        let mut state = ConfigState::default();
        state.current_background = Background::new("http://gone", "Gone");
        state.settings.quotes.clear();

        let repaired = state.repaired();

        assert_eq!(repaired.current_background(), &repaired.settings().backgrounds[0]);
        assert_eq!(repaired.settings().quotes, default_quotes());
    }

    #[test]
    fn test_snapshot_json_round_trip() {
        let mut state = ConfigState::default();
        state.set_quotes("Q\nA");
        state.mark_saved_as(Uuid::new_v4());

        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains("\"currentBackground\""));
        assert!(json.contains("\"timeColor\""));

        let back: ConfigState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }
}
