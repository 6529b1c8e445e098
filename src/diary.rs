//! Diary generation workflow.
//!
//! fetch latest readings → classify mood → summarize engagement → compose
//! prompt → generate → truncate → persist. Every step before persistence
//! fails closed. A failed insert is logged and reported alongside the text,
//! which is still returned.

use std::sync::Arc;

use rand::Rng;
use tracing::{info, warn};

use crate::engagement;
use crate::generation::TextGenerator;
use crate::mood::{self, MoodTag};
use crate::prompt::{self, PersonaTemplate, DIARY_MAX_CHARS};
use crate::publisher::post_length;
use crate::store::PlantStore;
use crate::{DiaryError, DiaryPost};

// ---

/// Upper bound (exclusive) for the per-call sampling seed.
const SEED_RANGE: u64 = 1_000_000;

/// Result of one generation run.
#[derive(Debug, Clone)]
pub struct GeneratedDiary {
    // ---
    pub post: DiaryPost,
    pub moods: Vec<MoodTag>,
    /// Set when the post could not be stored; `post` is still valid.
    pub persist_error: Option<String>,
}

impl GeneratedDiary {
    // ---
    pub fn persisted(&self) -> bool {
        self.persist_error.is_none()
    }
}

/// Wires the store and generator together. Cheap to clone.
#[derive(Clone)]
pub struct DiaryService {
    store: Arc<dyn PlantStore>,
    generator: Arc<dyn TextGenerator>,
    persona: PersonaTemplate,
}

impl DiaryService {
    // ---
    pub fn new(
        store: Arc<dyn PlantStore>,
        generator: Arc<dyn TextGenerator>,
        persona: PersonaTemplate,
    ) -> Self {
        // ---
        Self {
            store,
            generator,
            persona,
        }
    }

    pub async fn generate(&self) -> Result<GeneratedDiary, DiaryError> {
        // ---
        let mut readings = self.store.latest_readings(2).await?.into_iter();
        let reading = readings.next().ok_or(DiaryError::NotFound("No plant data found"))?;
        let prior = readings.next();

        let moods = mood::classify(&reading, prior.as_ref());
        info!(reading_id = %reading.id, ?moods, "Classified plant mood");

        let summary = engagement::load_summary(self.store.as_ref()).await?;
        let composed = prompt::compose(self.persona, &reading, &moods, &summary);

        let seed = rand::thread_rng().gen_range(0..SEED_RANGE);
        info!(persona = %self.persona, seed, history = summary.len(), "Generating diary entry");

        let raw = self.generator.complete(&composed, seed).await?;
        let text = clamp_diary(&raw);

        let post = DiaryPost::new(text, &reading);
        let persist_error = match self.store.insert_post(&post).await {
            Ok(()) => {
                info!(post_id = %post.id, "Diary entry stored");
                None
            }
            Err(e) => {
                warn!(post_id = %post.id, error = %e, "Diary generated but not stored");
                Some(e.to_string())
            }
        };

        Ok(GeneratedDiary {
            post,
            moods,
            persist_error,
        })
    }

    pub async fn current(&self) -> Result<DiaryPost, DiaryError> {
        self.store.latest_post().await
    }
}

/// Trim the model's reply and cut it to the diary ceiling.
///
/// The model is asked to stay within the limit but is not trusted to. Length
/// is counted the way the feed counts it, so a clamped entry always fits
/// behind the publish prefix.
pub fn clamp_diary(raw: &str) -> String {
    // ---
    let trimmed = raw.trim();
    let length = post_length(trimmed);
    if length <= DIARY_MAX_CHARS {
        return trimmed.to_string();
    }

    warn!(
        length,
        max = DIARY_MAX_CHARS,
        "Generated diary exceeds limit, truncating"
    );
    let mut used = 0;
    trimmed
        .chars()
        .take_while(|c| {
            used += c.len_utf16();
            used <= DIARY_MAX_CHARS
        })
        .collect::<String>()
        .trim_end()
        .to_string()
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::error::UpstreamError;
    use crate::models::{Interaction, InteractionKind};
    use crate::testing::{sample_post, sample_reading, MemoryStore, ScriptedGenerator};
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn service(store: Arc<MemoryStore>, generator: Arc<ScriptedGenerator>) -> DiaryService {
        DiaryService::new(store, generator, PersonaTemplate::EngagementAware)
    }

    #[tokio::test]
    async fn test_generate_persists_post_for_latest_reading() {
        // ---
        let store = Arc::new(MemoryStore::default());
        let reading = sample_reading();
        store.insert_reading(&reading).await.unwrap();
        let generator = Arc::new(ScriptedGenerator::replying("  Sunlight, finally.  "));

        let diary = service(store.clone(), generator.clone())
            .generate()
            .await
            .unwrap();

        assert_eq!(diary.post.content, "Sunlight, finally.");
        assert_eq!(diary.post.reading_id, reading.id);
        assert!(diary.persisted());
        assert_eq!(store.latest_post().await.unwrap(), diary.post);

        let seeds = generator.seeds();
        assert_eq!(seeds.len(), 1);
        assert!(seeds[0] < SEED_RANGE);
    }

    #[tokio::test]
    async fn test_prompt_includes_engagement_history() {
        // ---
        let store = Arc::new(MemoryStore::default());
        store.insert_reading(&sample_reading()).await.unwrap();
        let earlier = sample_post("Yesterday was damp.", Utc::now() - Duration::days(1));
        store.insert_post(&earlier).await.unwrap();
        store.add_interaction(Interaction {
            id: Uuid::new_v4(),
            post_id: earlier.id,
            kind: InteractionKind::Comment,
            content: Some("Poor thing".to_string()),
            created_at: Utc::now(),
        });
        let generator = Arc::new(ScriptedGenerator::replying("ok"));

        service(store, generator.clone()).generate().await.unwrap();

        let prompts = generator.prompts();
        assert!(prompts[0].user.contains("Yesterday was damp."));
        assert!(prompts[0].user.contains("Poor thing"));
    }

    #[tokio::test]
    async fn test_no_reading_is_not_found_and_skips_generation() {
        // ---
        let store = Arc::new(MemoryStore::default());
        let generator = Arc::new(ScriptedGenerator::replying("unused"));

        let err = service(store, generator.clone()).generate().await.unwrap_err();

        assert!(matches!(err, DiaryError::NotFound(_)));
        assert!(generator.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_upstream_failure_does_not_persist() {
        // ---
        let store = Arc::new(MemoryStore::default());
        store.insert_reading(&sample_reading()).await.unwrap();
        let generator = Arc::new(ScriptedGenerator::failing(|| {
            DiaryError::upstream(
                "openrouter",
                UpstreamError::Status {
                    status: 500,
                    message: "boom".to_string(),
                },
            )
        }));

        let err = service(store.clone(), generator).generate().await.unwrap_err();

        assert!(matches!(err, DiaryError::Upstream { .. }));
        assert_eq!(store.post_inserts(), 0);
    }

    #[tokio::test]
    async fn test_persist_failure_still_returns_text() {
        // ---
        let store = Arc::new(MemoryStore::default());
        store.insert_reading(&sample_reading()).await.unwrap();
        store.fail_post_inserts();
        let generator = Arc::new(ScriptedGenerator::replying("Still here."));

        let diary = service(store.clone(), generator).generate().await.unwrap();

        assert_eq!(diary.post.content, "Still here.");
        assert!(!diary.persisted());
        assert!(diary.persist_error.unwrap().contains("store unavailable"));
        assert!(store.latest_post().await.is_err());
    }

    #[tokio::test]
    async fn test_market_trend_uses_previous_reading() {
        // ---
        let store = Arc::new(MemoryStore::default());
        let prior = sample_reading();
        let mut latest = sample_reading();
        latest.timestamp = prior.timestamp + Duration::hours(1);
        latest.external_factors.market_indices.dow_jones += 400.0;
        latest.external_factors.market_indices.nasdaq += 90.0;
        store.insert_reading(&prior).await.unwrap();
        store.insert_reading(&latest).await.unwrap();

        let generator = Arc::new(ScriptedGenerator::replying("ok"));
        let diary = service(store, generator).generate().await.unwrap();

        assert!(diary.moods.contains(&MoodTag::Playful));
        assert_eq!(diary.post.reading_id, latest.id);
    }

    #[test]
    fn test_clamp_diary_truncates_on_char_boundary() {
        // ---
        let long = "a".repeat(DIARY_MAX_CHARS + 20);
        assert_eq!(clamp_diary(&long).chars().count(), DIARY_MAX_CHARS);

        // Each leaf is two UTF-16 units
        let leaves = "🌿".repeat(DIARY_MAX_CHARS);
        let clamped = clamp_diary(&leaves);
        assert_eq!(clamped.chars().count(), DIARY_MAX_CHARS / 2);
        assert_eq!(post_length(&clamped), DIARY_MAX_CHARS);
        assert!(crate::publisher::format_diary_post(&clamped).is_ok());

        let odd = format!("a{}", "🌿".repeat(DIARY_MAX_CHARS));
        assert_eq!(post_length(&clamp_diary(&odd)), DIARY_MAX_CHARS - 1);

        let short = clamp_diary("  hello \n");
        assert_eq!(short, "hello");
    }
}
