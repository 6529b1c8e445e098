//! Threshold-based mood classification of a reading.
//!
//! All comparisons are strict, so a value sitting exactly on a threshold
//! (e.g. air humidity of 50 or 70) yields neither of the paired tags.

use serde::Serialize;

use crate::Reading;

// ---

const AIR_HUMIDITY_DRY: f64 = 50.0;
const AIR_HUMIDITY_HUMID: f64 = 70.0;
const AIR_TEMP_HOT: f64 = 25.0;
const AIR_TEMP_COLD: f64 = 20.0;
const SOIL_HUMIDITY_DRY: f64 = 70.0;
const SOIL_HUMIDITY_WET: f64 = 85.0;
const LIGHT_BRIGHT: f64 = 5000.0;
const LIGHT_DIM: f64 = 4000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MoodTag {
    Parched,
    Relaxed,
    Energetic,
    Sluggish,
    Thirsty,
    Refreshed,
    Bright,
    Cozy,
    Playful,
    Reflective,
}

impl MoodTag {
    // ---
    pub fn as_str(&self) -> &'static str {
        match self {
            MoodTag::Parched => "parched",
            MoodTag::Relaxed => "relaxed",
            MoodTag::Energetic => "energetic",
            MoodTag::Sluggish => "sluggish",
            MoodTag::Thirsty => "thirsty",
            MoodTag::Refreshed => "refreshed",
            MoodTag::Bright => "bright",
            MoodTag::Cozy => "cozy",
            MoodTag::Playful => "playful",
            MoodTag::Reflective => "reflective",
        }
    }

    /// Short first-person hint for the prompt.
    pub fn description(&self) -> &'static str {
        match self {
            MoodTag::Parched => "the air feels dry on your leaves",
            MoodTag::Relaxed => "the humid air makes you feel relaxed",
            MoodTag::Energetic => "the warmth makes you energetic",
            MoodTag::Sluggish => "the chill makes you sluggish",
            MoodTag::Thirsty => "your roots are thirsty",
            MoodTag::Refreshed => "your soil is freshly watered and you feel refreshed",
            MoodTag::Bright => "you are basking in bright light",
            MoodTag::Cozy => "the dim light feels cozy",
            MoodTag::Playful => "the markets are up and you feel playful",
            MoodTag::Reflective => "the markets are down and you feel reflective",
        }
    }
}

/// Classify a reading into mood tags, in a fixed order.
///
/// `prior` is the reading captured before `reading`; without it no market
/// trend tag is produced.
pub fn classify(reading: &Reading, prior: Option<&Reading>) -> Vec<MoodTag> {
    // ---
    let env = &reading.environmental_data;
    let mut tags = Vec::new();

    if env.air.humidity < AIR_HUMIDITY_DRY {
        tags.push(MoodTag::Parched);
    } else if env.air.humidity > AIR_HUMIDITY_HUMID {
        tags.push(MoodTag::Relaxed);
    }

    if env.air.temperature > AIR_TEMP_HOT {
        tags.push(MoodTag::Energetic);
    } else if env.air.temperature < AIR_TEMP_COLD {
        tags.push(MoodTag::Sluggish);
    }

    if env.soil.humidity < SOIL_HUMIDITY_DRY {
        tags.push(MoodTag::Thirsty);
    } else if env.soil.humidity > SOIL_HUMIDITY_WET {
        tags.push(MoodTag::Refreshed);
    }

    if env.light.intensity > LIGHT_BRIGHT {
        tags.push(MoodTag::Bright);
    } else if env.light.intensity < LIGHT_DIM {
        tags.push(MoodTag::Cozy);
    }

    if let Some(trend) = prior.and_then(|p| market_trend(reading, p)) {
        if trend > 0.0 {
            tags.push(MoodTag::Playful);
        } else if trend < 0.0 {
            tags.push(MoodTag::Reflective);
        }
    }

    tags
}

/// Mean relative change of both market indices from `prior` to `current`.
fn market_trend(current: &Reading, prior: &Reading) -> Option<f64> {
    // ---
    let now = &current.external_factors.market_indices;
    let before = &prior.external_factors.market_indices;

    if before.dow_jones == 0.0 || before.nasdaq == 0.0 {
        return None;
    }

    let dow = (now.dow_jones - before.dow_jones) / before.dow_jones;
    let nasdaq = (now.nasdaq - before.nasdaq) / before.nasdaq;
    Some((dow + nasdaq) / 2.0)
}
