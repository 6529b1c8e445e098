//! In-memory doubles for the store, generator and publisher.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use crate::generation::TextGenerator;
use crate::models::{
    AirConditions, EnvironmentalData, ExternalFactors, LightConditions, MarketIndices,
    SoilConditions, Weather,
};
use crate::prompt::ComposedPrompt;
use crate::publisher::FeedPublisher;
use crate::store::PlantStore;
use crate::{DiaryError, DiaryPost, Interaction, Reading};

// ---

pub fn sample_reading() -> Reading {
    // ---
    Reading {
        id: Uuid::new_v4(),
        timestamp: Utc.with_ymd_and_hms(2025, 3, 26, 18, 45, 0).unwrap(),
        environmental_data: EnvironmentalData {
            location: "living_room".to_string(),
            air: AirConditions {
                humidity: 55.2,
                temperature: 22.5,
            },
            soil: SoilConditions { humidity: 72.0 },
            light: LightConditions {
                intensity: 5400.0,
                duration: 6.5,
            },
        },
        external_factors: ExternalFactors {
            weather: Weather {
                temperature: 18.0,
                precipitation: 0.4,
                cloud_cover: 25.0,
                moon_phase: "waxing_gibbous".to_string(),
                air_quality: 87.0,
            },
            market_indices: MarketIndices {
                dow_jones: 36789.0,
                nasdaq: 17456.0,
            },
            news: vec![
                "Local elections scheduled next month".to_string(),
                "New plant growth hormone identified".to_string(),
            ],
        },
    }
}

pub fn sample_post(content: &str, created_at: DateTime<Utc>) -> DiaryPost {
    // ---
    DiaryPost {
        id: Uuid::new_v4(),
        content: content.to_string(),
        created_at,
        reading_id: Uuid::new_v4(),
    }
}

#[derive(Default)]
struct StoreState {
    readings: Vec<Reading>,
    posts: Vec<DiaryPost>,
    interactions: Vec<Interaction>,
    fail_post_inserts: bool,
    post_inserts: usize,
    interaction_lookups: usize,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<StoreState>,
}

impl MemoryStore {
    // ---
    pub fn add_interaction(&self, interaction: Interaction) {
        self.state.lock().unwrap().interactions.push(interaction);
    }

    pub fn fail_post_inserts(&self) {
        self.state.lock().unwrap().fail_post_inserts = true;
    }

    /// Attempted post inserts, successful or not.
    pub fn post_inserts(&self) -> usize {
        self.state.lock().unwrap().post_inserts
    }

    pub fn interaction_lookups(&self) -> usize {
        self.state.lock().unwrap().interaction_lookups
    }
}

#[async_trait]
impl PlantStore for MemoryStore {
    // ---
    async fn latest_readings(&self, limit: usize) -> Result<Vec<Reading>, DiaryError> {
        let mut readings = self.state.lock().unwrap().readings.clone();
        readings.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        readings.truncate(limit);
        Ok(readings)
    }

    async fn insert_reading(&self, reading: &Reading) -> Result<(), DiaryError> {
        self.state.lock().unwrap().readings.push(reading.clone());
        Ok(())
    }

    async fn recent_posts(&self, limit: usize) -> Result<Vec<DiaryPost>, DiaryError> {
        let mut posts = self.state.lock().unwrap().posts.clone();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        posts.truncate(limit);
        Ok(posts)
    }

    async fn interactions_for(&self, post_id: Uuid) -> Result<Vec<Interaction>, DiaryError> {
        let mut state = self.state.lock().unwrap();
        state.interaction_lookups += 1;
        Ok(state
            .interactions
            .iter()
            .filter(|i| i.post_id == post_id)
            .cloned()
            .collect())
    }

    async fn insert_post(&self, post: &DiaryPost) -> Result<(), DiaryError> {
        let mut state = self.state.lock().unwrap();
        state.post_inserts += 1;
        if state.fail_post_inserts {
            return Err(DiaryError::StoreUnavailable("insert rejected".to_string()));
        }
        state.posts.push(post.clone());
        Ok(())
    }
}

type ErrorFactory = Box<dyn Fn() -> DiaryError + Send + Sync>;

/// Generator that returns a fixed reply (or error) and records its calls.
pub struct ScriptedGenerator {
    reply: Result<String, ErrorFactory>,
    calls: Mutex<Vec<(ComposedPrompt, u64)>>,
}

impl ScriptedGenerator {
    // ---
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(make: impl Fn() -> DiaryError + Send + Sync + 'static) -> Self {
        Self {
            reply: Err(Box::new(make)),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<ComposedPrompt> {
        self.calls.lock().unwrap().iter().map(|(p, _)| p.clone()).collect()
    }

    pub fn seeds(&self) -> Vec<u64> {
        self.calls.lock().unwrap().iter().map(|(_, s)| *s).collect()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn complete(&self, prompt: &ComposedPrompt, seed: u64) -> Result<String, DiaryError> {
        self.calls.lock().unwrap().push((prompt.clone(), seed));
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(make) => Err(make()),
        }
    }
}

/// Publisher that keeps every posted text.
#[derive(Default)]
pub struct RecordingPublisher {
    posts: Mutex<Vec<String>>,
}

impl RecordingPublisher {
    pub fn posts(&self) -> Vec<String> {
        self.posts.lock().unwrap().clone()
    }
}

#[async_trait]
impl FeedPublisher for RecordingPublisher {
    async fn post(&self, text: &str) -> Result<(), DiaryError> {
        self.posts.lock().unwrap().push(text.to_string());
        Ok(())
    }
}
