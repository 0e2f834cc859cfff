//! Configuration for tabboard
//!
//! - **app**: `AppConfig`, the on-disk `config.json` (paths, log level, startup behaviour)
//! - **defaults**: hardcoded fallback dashboard settings

pub mod app;
pub mod defaults;

pub use app::AppConfig;
