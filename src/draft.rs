//! Settings draft and typed setter dispatch
//!
//! A [`SettingsDraft`] is the editable form of the settings: lists are held in
//! the bulk text format so they can be edited as plain text. Committing a
//! draft diffs it against the live state and applies one [`SettingChange`]
//! per differing field.

use tracing::debug;

use crate::codec;
use crate::color::HexColor;
use crate::state::ConfigState;
use crate::types::Settings;

/// One edit to one settings field
#[derive(Debug, Clone, PartialEq)]
pub enum SettingChange {
    TimeColor(HexColor),
    QuoteColor(HexColor),
    Quotes(String),
    Backgrounds(String),
    RotationInterval(u32),
    RotationPaused(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SettingsDraft {
    pub time_color: HexColor,
    pub quote_color: HexColor,
    pub quotes_text: String,
    pub backgrounds_text: String,
    pub rotation_interval: u32,
    pub is_rotation_paused: bool,
}

impl SettingsDraft {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            time_color: settings.time_color.clone(),
            quote_color: settings.quote_color.clone(),
            quotes_text: codec::encode_quotes(&settings.quotes),
            backgrounds_text: codec::encode_backgrounds(&settings.backgrounds),
            rotation_interval: settings.rotation_interval,
            is_rotation_paused: settings.is_rotation_paused,
        }
    }

    /// Fields that differ from the live state, in apply order
    pub fn changes(&self, state: &ConfigState) -> Vec<SettingChange> {
        let live = Self::from_settings(state.settings());
        let mut changes = Vec::new();

        if self.time_color != live.time_color {
            changes.push(SettingChange::TimeColor(self.time_color.clone()));
        }
        if self.quote_color != live.quote_color {
            changes.push(SettingChange::QuoteColor(self.quote_color.clone()));
        }
        if self.quotes_text != live.quotes_text {
            changes.push(SettingChange::Quotes(self.quotes_text.clone()));
        }
        if self.backgrounds_text != live.backgrounds_text {
            changes.push(SettingChange::Backgrounds(self.backgrounds_text.clone()));
        }
        if self.rotation_interval != live.rotation_interval {
            changes.push(SettingChange::RotationInterval(self.rotation_interval));
        }
        if self.is_rotation_paused != live.is_rotation_paused {
            changes.push(SettingChange::RotationPaused(self.is_rotation_paused));
        }

        changes
    }
}

impl ConfigState {
    /// Apply a single change; `false` when list text had no valid entry and
    /// the state was left alone
    pub fn apply(&mut self, change: SettingChange) -> bool {
        match change {
            SettingChange::TimeColor(color) => self.set_time_color(color),
            SettingChange::QuoteColor(color) => self.set_quote_color(color),
            SettingChange::Quotes(text) => return self.set_quotes(&text),
            SettingChange::Backgrounds(text) => return self.set_backgrounds(&text),
            SettingChange::RotationInterval(seconds) => self.set_rotation_interval(seconds),
            SettingChange::RotationPaused(paused) => self.set_rotation_paused(paused),
        }
        true
    }

    /// Commit a draft; returns how many changes were accepted
    pub fn apply_draft(&mut self, draft: &SettingsDraft) -> usize {
        let mut accepted = 0;
        for change in draft.changes(self) {
            debug!(change = ?change, "Applying setting change");
            if self.apply(change) {
                accepted += 1;
            }
        }
        accepted
    }
}
