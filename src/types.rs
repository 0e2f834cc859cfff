//! Core data types: quotes, backgrounds, settings and presets
//!
//! JSON field names are camelCase so stored blobs and exported preset files
//! keep the same layout the dashboard has always written.

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::color::{HexColor, deserialize_or_white};
use crate::constants::background::{DEFAULT_BLUR, DEFAULT_SCALE, MAX_BLUR, MAX_SCALE, MIN_SCALE};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub text: String,
    pub author: String,
}

impl Quote {
    pub fn new(text: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            author: author.into(),
        }
    }
}

/// Clockwise rotation of the background image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub fn degrees(self) -> u16 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }
}

impl TryFrom<u16> for Rotation {
    type Error = anyhow::Error;

    fn try_from(degrees: u16) -> Result<Self, Self::Error> {
        match degrees {
            0 => Ok(Rotation::Deg0),
            90 => Ok(Rotation::Deg90),
            180 => Ok(Rotation::Deg180),
            270 => Ok(Rotation::Deg270),
            other => Err(anyhow!("unsupported rotation {other} (expected 0, 90, 180 or 270)")),
        }
    }
}

impl From<Rotation> for u16 {
    fn from(rotation: Rotation) -> Self {
        rotation.degrees()
    }
}

impl FromStr for Rotation {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let degrees: u16 = s
            .trim()
            .trim_end_matches('°')
            .parse()
            .map_err(|_| anyhow!("invalid rotation '{s}'"))?;
        Rotation::try_from(degrees)
    }
}

/// CSS `background-size` value: a keyword or an explicit `<width> <height>` pair
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BackgroundSize {
    #[default]
    Cover,
    Contain,
    Auto,
    Initial,
    Inherit,
    /// Anything else, e.g. `"100% auto"` or `"50% 50%"`
    Explicit(String),
}

impl BackgroundSize {
    pub fn as_css(&self) -> &str {
        match self {
            BackgroundSize::Cover => "cover",
            BackgroundSize::Contain => "contain",
            BackgroundSize::Auto => "auto",
            BackgroundSize::Initial => "initial",
            BackgroundSize::Inherit => "inherit",
            BackgroundSize::Explicit(value) => value,
        }
    }
}

impl From<String> for BackgroundSize {
    fn from(value: String) -> Self {
        match value.trim() {
            "cover" => BackgroundSize::Cover,
            "contain" => BackgroundSize::Contain,
            "auto" => BackgroundSize::Auto,
            "initial" => BackgroundSize::Initial,
            "inherit" => BackgroundSize::Inherit,
            other => BackgroundSize::Explicit(other.to_string()),
        }
    }
}

impl From<BackgroundSize> for String {
    fn from(size: BackgroundSize) -> Self {
        size.as_css().to_string()
    }
}

impl FromStr for BackgroundSize {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(anyhow!("background size must not be empty"));
        }
        Ok(BackgroundSize::from(s.to_string()))
    }
}

impl fmt::Display for BackgroundSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_css())
    }
}

/// CSS `background-repeat` value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackgroundRepeat {
    #[default]
    NoRepeat,
    Repeat,
    RepeatX,
    RepeatY,
}

impl BackgroundRepeat {
    pub fn as_css(self) -> &'static str {
        match self {
            BackgroundRepeat::NoRepeat => "no-repeat",
            BackgroundRepeat::Repeat => "repeat",
            BackgroundRepeat::RepeatX => "repeat-x",
            BackgroundRepeat::RepeatY => "repeat-y",
        }
    }

    /// Next option in the repeat button's cycle
    pub fn next(self) -> Self {
        match self {
            BackgroundRepeat::NoRepeat => BackgroundRepeat::Repeat,
            BackgroundRepeat::Repeat => BackgroundRepeat::RepeatX,
            BackgroundRepeat::RepeatX => BackgroundRepeat::RepeatY,
            BackgroundRepeat::RepeatY => BackgroundRepeat::NoRepeat,
        }
    }
}

impl FromStr for BackgroundRepeat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "no-repeat" => Ok(BackgroundRepeat::NoRepeat),
            "repeat" => Ok(BackgroundRepeat::Repeat),
            "repeat-x" => Ok(BackgroundRepeat::RepeatX),
            "repeat-y" => Ok(BackgroundRepeat::RepeatY),
            other => Err(anyhow!(
                "invalid repeat '{other}' (expected no-repeat, repeat, repeat-x or repeat-y)"
            )),
        }
    }
}

impl fmt::Display for BackgroundRepeat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_css())
    }
}

fn default_scale() -> f32 {
    DEFAULT_SCALE
}

fn default_blur() -> u8 {
    DEFAULT_BLUR
}

/// A background image plus its presentation tunables
///
/// `id` is the stable identity; every other field may be edited.
/// Missing tunables (presets written before they existed) take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Background {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub url: String,
    pub name: String,
    #[serde(default = "default_scale")]
    pub scale: f32,
    #[serde(default)]
    pub rotation: Rotation,
    #[serde(default)]
    pub size: BackgroundSize,
    #[serde(default)]
    pub repeat: BackgroundRepeat,
    #[serde(default = "default_blur")]
    pub blur: u8,
}

impl Background {
    /// New background with a fresh id and default tunables
    pub fn new(url: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            url: url.into(),
            name: name.into(),
            scale: DEFAULT_SCALE,
            rotation: Rotation::default(),
            size: BackgroundSize::default(),
            repeat: BackgroundRepeat::default(),
            blur: DEFAULT_BLUR,
        }
    }

    /// Same entry for bulk-edit purposes
    pub fn same_source(&self, other: &Background) -> bool {
        self.url == other.url && self.name == other.name
    }

    /// Clamp tunables into their slider ranges
    pub fn clamp_tunables(&mut self) {
        if !self.scale.is_finite() {
            self.scale = DEFAULT_SCALE;
        }
        self.scale = self.scale.clamp(MIN_SCALE, MAX_SCALE);
        self.blur = self.blur.min(MAX_BLUR);
    }
}

/// Partial update for a background; `None` leaves the field alone
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackgroundPatch {
    pub url: Option<String>,
    pub name: Option<String>,
    pub scale: Option<f32>,
    pub rotation: Option<Rotation>,
    pub size: Option<BackgroundSize>,
    pub repeat: Option<BackgroundRepeat>,
    pub blur: Option<u8>,
}

impl BackgroundPatch {
    pub fn is_empty(&self) -> bool {
        *self == BackgroundPatch::default()
    }

    pub fn apply_to(&self, background: &mut Background) {
        if let Some(url) = &self.url {
            background.url = url.clone();
        }
        if let Some(name) = &self.name {
            background.name = name.clone();
        }
        if let Some(scale) = self.scale {
            background.scale = scale;
        }
        if let Some(rotation) = self.rotation {
            background.rotation = rotation;
        }
        if let Some(size) = &self.size {
            background.size = size.clone();
        }
        if let Some(repeat) = self.repeat {
            background.repeat = repeat;
        }
        if let Some(blur) = self.blur {
            background.blur = blur;
        }
        background.clamp_tunables();
    }
}

/// User-editable dashboard settings
///
/// Fields missing from stored JSON fall back to the built-in defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    #[serde(deserialize_with = "deserialize_or_white")]
    pub time_color: HexColor,
    #[serde(deserialize_with = "deserialize_or_white")]
    pub quote_color: HexColor,
    pub quotes: Vec<Quote>,
    pub backgrounds: Vec<Background>,
    /// Seconds between automatic rotations
    pub rotation_interval: u32,
    pub is_rotation_paused: bool,
}

impl Default for Settings {
    fn default() -> Self {
        crate::config::defaults::default_settings()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresetKind {
    /// Created and edited at runtime
    #[default]
    User,
    /// Bundled with the application, read-only
    Premade,
}

/// Export slug for a preset with an empty name
const EMPTY_NAME_SLUG: &str = "preset";

fn default_last_modified() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

/// A named, persisted snapshot of Settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigPreset {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default = "default_last_modified")]
    pub last_modified: DateTime<Utc>,
    #[serde(rename = "type", default)]
    pub kind: PresetKind,
}

impl ConfigPreset {
    pub fn is_premade(&self) -> bool {
        self.kind == PresetKind::Premade
    }

    /// Export filename: lowercase name with every whitespace run (leading and
    /// trailing ones included) replaced by one hyphen. An empty name exports
    /// as `preset.json`.
    pub fn export_file_name(&self) -> String {
        let mut slug = String::with_capacity(self.name.len());
        let mut in_whitespace = false;
        for c in self.name.to_lowercase().chars() {
            if c.is_whitespace() {
                if !in_whitespace {
                    slug.push('-');
                }
                in_whitespace = true;
            } else {
                slug.push(c);
                in_whitespace = false;
            }
        }

        if slug.is_empty() {
            slug.push_str(EMPTY_NAME_SLUG);
        }
        format!("{slug}.json")
    }
}
