//! Data models for plant readings, diary posts and their interactions.

use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

// ---

/// Conditions measured directly around the plant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentalData {
    // ---
    pub location: String,
    pub air: AirConditions,
    pub soil: SoilConditions,
    pub light: LightConditions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirConditions {
    /// Relative humidity in percent.
    pub humidity: f64,
    /// Temperature in °C.
    pub temperature: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoilConditions {
    /// Soil moisture in percent.
    pub humidity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightConditions {
    /// Light intensity in lux.
    pub intensity: f64,
    /// Light exposure in hours.
    pub duration: f64,
}

/// Contextual data that does not come from the plant's own sensors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalFactors {
    // ---
    pub weather: Weather,
    pub market_indices: MarketIndices,
    #[serde(default)]
    pub news: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weather {
    // ---
    pub temperature: f64,
    /// Precipitation in mm.
    pub precipitation: f64,
    /// Cloud cover in percent.
    pub cloud_cover: f64,
    pub moon_phase: String,
    pub air_quality: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketIndices {
    // ---
    pub dow_jones: f64,
    pub nasdaq: f64,
}

/// Reading document as uploaded by the sensor collector.
#[derive(Debug, Deserialize)]
pub struct RawReading {
    // ---
    #[serde(default, deserialize_with = "capture_time")]
    pub timestamp: Option<DateTime<Utc>>,
    pub environmental_data: EnvironmentalData,
    pub external_factors: ExternalFactors,
}

/// RFC 3339, or an ISO 8601 time with no offset which is taken as UTC.
fn capture_time<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    // ---
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };

    if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(ts.with_timezone(&Utc)));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| Some(naive.and_utc()))
        .map_err(|e| serde::de::Error::custom(format!("invalid timestamp {:?}: {}", raw, e)))
}

/// Immutable snapshot of the plant environment at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    // ---
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub environmental_data: EnvironmentalData,
    pub external_factors: ExternalFactors,
}

impl RawReading {
    // ---
    /// Assign identity, defaulting the capture time to now when absent.
    pub fn into_reading(self) -> Reading {
        // ---
        Reading {
            id: Uuid::new_v4(),
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
            environmental_data: self.environmental_data,
            external_factors: self.external_factors,
        }
    }
}

/// A generated diary entry. Never mutated once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiaryPost {
    // ---
    pub id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    /// Reading the entry was written from.
    pub reading_id: Uuid,
}

impl DiaryPost {
    // ---
    pub fn new(content: impl Into<String>, reading: &Reading) -> Self {
        // ---
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            created_at: Utc::now(),
            reading_id: reading.id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionKind {
    Like,
    Comment,
}

impl InteractionKind {
    // ---
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionKind::Like => "like",
            InteractionKind::Comment => "comment",
        }
    }
}

impl fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InteractionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(InteractionKind::Like),
            "comment" => Ok(InteractionKind::Comment),
            other => Err(format!("unknown interaction kind '{}'", other)),
        }
    }
}

/// A like or comment left on a diary post by someone outside this service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    // ---
    pub id: Uuid,
    pub post_id: Uuid,
    pub kind: InteractionKind,
    /// Comment text; `None` for likes.
    pub content: Option<String>,
    pub created_at: DateTime<Utc>,
}
