//! Hardcoded fallback settings
//!
//! Used when no preset can be loaded and to fill fields missing from stored JSON.

use uuid::Uuid;

use crate::color::HexColor;
use crate::constants::rotation::DEFAULT_INTERVAL_SECS;
use crate::types::{Background, Quote, Settings};

const MOUNTAIN_SUNRISE_ID: Uuid = Uuid::from_u128(0x550e8400_e29b_41d4_a716_446655440000);
const FOREST_VALLEY_ID: Uuid = Uuid::from_u128(0x6ba7b810_9dad_11d1_80b4_00c04fd430c8);
const TROPICAL_BEACH_ID: Uuid = Uuid::from_u128(0x6ba7b811_9dad_11d1_80b4_00c04fd430c8);

pub fn default_quotes() -> Vec<Quote> {
    vec![
        Quote::new("The only way to do great work is to love what you do.", "Steve Jobs"),
        Quote::new("Life is what happens when you're busy making other plans.", "John Lennon"),
        Quote::new(
            "The future belongs to those who believe in the beauty of their dreams.",
            "Eleanor Roosevelt",
        ),
    ]
}

pub fn default_backgrounds() -> Vec<Background> {
    [
        (
            MOUNTAIN_SUNRISE_ID,
            "https://images.unsplash.com/photo-1470071459604-3b5ec3a7fe05",
            "Mountain Sunrise",
        ),
        (
            FOREST_VALLEY_ID,
            "https://images.unsplash.com/photo-1497436072909-60f360e1d4b1",
            "Forest Valley",
        ),
        (
            TROPICAL_BEACH_ID,
            "https://images.unsplash.com/photo-1507525428034-b723cf961d3e",
            "Tropical Beach",
        ),
    ]
    .into_iter()
    .map(|(id, url, name)| Background {
        id,
        ..Background::new(url, name)
    })
    .collect()
}

pub fn default_settings() -> Settings {
    Settings {
        time_color: HexColor::white(),
        quote_color: HexColor::white(),
        quotes: default_quotes(),
        backgrounds: default_backgrounds(),
        rotation_interval: DEFAULT_INTERVAL_SECS,
        is_rotation_paused: false,
    }
}
