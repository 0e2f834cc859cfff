//! Application-wide constants
//!
//! This module contains all magic numbers and string literals used throughout
//! the application, providing a single source of truth for constant values.

/// Config file location constants
pub mod config {
    /// Directory name under the platform config/data dirs
    pub const APP_DIR: &str = "tabboard";

    /// Application config filename
    pub const FILENAME: &str = "config.json";

    /// Key-value storage filename (inside the data dir)
    pub const STORAGE_FILENAME: &str = "storage.json";
}

/// Key-value storage keys
pub mod storage {
    /// Serialized live ConfigState for session continuity
    pub const SESSION_KEY: &str = "dashboard-storage";

    /// JSON array of user ConfigPreset objects
    pub const USER_PRESETS_KEY: &str = "user-presets";
}

/// Defaults applied to freshly created or legacy backgrounds
pub mod background {
    pub const DEFAULT_SCALE: f32 = 1.1;
    pub const DEFAULT_BLUR: u8 = 0;

    pub const MIN_SCALE: f32 = 0.1;
    pub const MAX_SCALE: f32 = 3.0;
    pub const MAX_BLUR: u8 = 20;
}

/// Rotation timing limits (seconds)
pub mod rotation {
    pub const DEFAULT_INTERVAL_SECS: u32 = 30;
    pub const MIN_INTERVAL_SECS: u32 = 5;
    pub const MAX_INTERVAL_SECS: u32 = 300;
}
