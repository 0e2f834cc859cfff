//! Hex color handling for the clock and quote text colors

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// A `#rrggbb` color, stored lowercase
///
/// Accepts 3-digit shorthand (`#fff`) and an optional leading `#`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor(String);

impl HexColor {
    pub fn parse(input: &str) -> Option<Self> {
        let hex = input.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);

        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }

        let expanded = match hex.len() {
            3 => hex.chars().flat_map(|c| [c, c]).collect::<String>(),
            6 => hex.to_string(),
            _ => return None,
        };

        Some(Self(format!("#{}", expanded.to_ascii_lowercase())))
    }

    /// White, the default for both text colors
    pub fn white() -> Self {
        Self("#ffffff".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Deserialize a color, falling back to white for strings that are not hex colors
///
/// Hand-edited preset files may carry arbitrary strings here.
pub fn deserialize_or_white<'de, D>(deserializer: D) -> Result<HexColor, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(HexColor::parse(&raw).unwrap_or_else(|| {
        warn!(color = %raw, "Invalid hex color, using default");
        HexColor::white()
    }))
}

impl Default for HexColor {
    fn default() -> Self {
        Self::white()
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HexColor {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| anyhow::anyhow!("invalid hex color '{s}' (expected #rrggbb)"))
    }
}

impl TryFrom<String> for HexColor {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<HexColor> for String {
    fn from(color: HexColor) -> Self {
        color.0
    }
}
