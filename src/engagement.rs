//! Engagement summary of the most recent diary posts.
//!
//! Joins each of the last few posts with its likes and comments so the prompt
//! can show the model what readers responded to.

use std::collections::HashMap;

use futures::future::try_join_all;
use uuid::Uuid;

use crate::store::PlantStore;
use crate::{DiaryError, DiaryPost, Interaction, InteractionKind};

// ---

/// Number of past posts considered when summarizing engagement.
pub const RECENT_POST_LIMIT: usize = 5;

/// Stand-in for a comment stored without text.
pub const EMPTY_COMMENT: &str = "(empty comment)";

/// Comments on a post. Empty threads are explicit so they can be rendered
/// as such rather than silently dropped.
#[derive(Debug, Clone, PartialEq)]
pub enum CommentThread {
    NoComments,
    Comments(Vec<String>),
}

impl From<Vec<String>> for CommentThread {
    fn from(comments: Vec<String>) -> Self {
        if comments.is_empty() {
            CommentThread::NoComments
        } else {
            CommentThread::Comments(comments)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngagementEntry {
    // ---
    pub post_id: Uuid,
    pub content: String,
    pub likes: usize,
    pub comments: CommentThread,
}

/// Per-post engagement, newest post first. Never longer than
/// [`RECENT_POST_LIMIT`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngagementSummary {
    entries: Vec<EngagementEntry>,
}

impl EngagementSummary {
    // ---
    pub fn entries(&self) -> &[EngagementEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Build the summary from posts (newest first) and interactions keyed by post.
///
/// Post order is preserved. Only interactions whose `post_id` matches the
/// post are counted; comments are ordered by creation time.
pub fn summarize(
    posts: &[DiaryPost],
    interactions: &HashMap<Uuid, Vec<Interaction>>,
) -> EngagementSummary {
    // ---
    let entries = posts
        .iter()
        .take(RECENT_POST_LIMIT)
        .map(|post| {
            let related: Vec<&Interaction> = interactions
                .get(&post.id)
                .map(|list| list.iter().filter(|i| i.post_id == post.id).collect())
                .unwrap_or_default();

            let likes = related
                .iter()
                .filter(|i| i.kind == InteractionKind::Like)
                .count();

            let mut comments: Vec<&Interaction> = related
                .into_iter()
                .filter(|i| i.kind == InteractionKind::Comment)
                .collect();
            comments.sort_by_key(|i| i.created_at);

            let comments: Vec<String> = comments
                .into_iter()
                .map(|i| match i.content.as_deref().map(str::trim) {
                    Some(text) if !text.is_empty() => text.to_string(),
                    _ => EMPTY_COMMENT.to_string(),
                })
                .collect();

            EngagementEntry {
                post_id: post.id,
                content: post.content.clone(),
                likes,
                comments: comments.into(),
            }
        })
        .collect();

    EngagementSummary { entries }
}

/// Fetch the recent posts and their interactions from `store`.
///
/// Interaction lookups run as one unordered batch; the result is reassembled
/// in post order. Any failed lookup fails the whole summary.
pub async fn load_summary(store: &dyn PlantStore) -> Result<EngagementSummary, DiaryError> {
    // ---
    let posts = store.recent_posts(RECENT_POST_LIMIT).await?;
    if posts.is_empty() {
        tracing::debug!("No previous diary posts, engagement summary is empty");
        return Ok(EngagementSummary::default());
    }

    let lookups = posts.iter().map(|post| async move {
        let list = store.interactions_for(post.id).await?;
        Ok::<_, DiaryError>((post.id, list))
    });
    let interactions: HashMap<Uuid, Vec<Interaction>> =
        try_join_all(lookups).await?.into_iter().collect();

    let summary = summarize(&posts, &interactions);
    tracing::debug!(posts = summary.len(), "Engagement summary loaded");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::testing::{sample_post, MemoryStore};
    use chrono::{DateTime, Duration, Utc};

    fn interaction(
        post_id: Uuid,
        kind: InteractionKind,
        content: Option<&str>,
        at: DateTime<Utc>,
    ) -> Interaction {
        // ---
        Interaction {
            id: Uuid::new_v4(),
            post_id,
            kind,
            content: content.map(str::to_string),
            created_at: at,
        }
    }

    #[test]
    fn test_likes_and_comments_are_counted_per_post() {
        // ---
        let now = Utc::now();
        let a = sample_post("first", now);
        let b = sample_post("second", now - Duration::hours(1));

        let mut map = HashMap::new();
        map.insert(
            a.id,
            vec![
                interaction(a.id, InteractionKind::Like, None, now),
                interaction(a.id, InteractionKind::Comment, Some("lovely"), now),
                interaction(a.id, InteractionKind::Like, None, now),
            ],
        );
        map.insert(b.id, vec![interaction(b.id, InteractionKind::Like, None, now)]);

        let summary = summarize(&[a.clone(), b.clone()], &map);
        let entries = summary.entries();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].post_id, a.id);
        assert_eq!(entries[0].likes, 2);
        assert_eq!(
            entries[0].comments,
            CommentThread::Comments(vec!["lovely".to_string()])
        );
        assert_eq!(entries[1].post_id, b.id);
        assert_eq!(entries[1].likes, 1);
        assert_eq!(entries[1].comments, CommentThread::NoComments);
    }

    #[test]
    fn test_interactions_for_other_posts_are_ignored() {
        // ---
        let now = Utc::now();
        let a = sample_post("first", now);
        let stray = Uuid::new_v4();

        let mut map = HashMap::new();
        map.insert(
            a.id,
            vec![
                interaction(stray, InteractionKind::Like, None, now),
                interaction(a.id, InteractionKind::Like, None, now),
            ],
        );

        let summary = summarize(&[a], &map);
        assert_eq!(summary.entries()[0].likes, 1);
    }

    #[test]
    fn test_comments_follow_creation_order() {
        // ---
        let now = Utc::now();
        let a = sample_post("first", now);

        let mut map = HashMap::new();
        map.insert(
            a.id,
            vec![
                interaction(a.id, InteractionKind::Comment, Some("third"), now),
                interaction(a.id, InteractionKind::Comment, Some("first"), now - Duration::minutes(2)),
                interaction(a.id, InteractionKind::Comment, Some("second"), now - Duration::minutes(1)),
            ],
        );

        let summary = summarize(&[a], &map);
        assert_eq!(
            summary.entries()[0].comments,
            CommentThread::Comments(vec![
                "first".to_string(),
                "second".to_string(),
                "third".to_string()
            ])
        );
    }

    #[test]
    fn test_comment_without_text_is_still_a_comment() {
        // ---
        let now = Utc::now();
        let a = sample_post("first", now);

        let mut map = HashMap::new();
        map.insert(
            a.id,
            vec![
                interaction(a.id, InteractionKind::Comment, None, now - Duration::minutes(1)),
                interaction(a.id, InteractionKind::Comment, Some("  "), now),
            ],
        );

        let summary = summarize(&[a], &map);
        assert_eq!(
            summary.entries()[0].comments,
            CommentThread::Comments(vec![EMPTY_COMMENT.to_string(), EMPTY_COMMENT.to_string()])
        );
    }

    #[test]
    fn test_summary_never_exceeds_limit() {
        // ---
        let now = Utc::now();
        let posts: Vec<DiaryPost> = (0..8)
            .map(|i| sample_post(&format!("post {}", i), now - Duration::hours(i)))
            .collect();

        let summary = summarize(&posts, &HashMap::new());
        assert_eq!(summary.len(), RECENT_POST_LIMIT);
        assert_eq!(summary.entries()[0].content, "post 0");

        let summary = summarize(&posts[..2], &HashMap::new());
        assert_eq!(summary.len(), 2);
    }

    #[tokio::test]
    async fn test_load_summary_from_store() {
        // ---
        let store = MemoryStore::default();
        let now = Utc::now();
        let posts: Vec<DiaryPost> = (0..7)
            .map(|i| sample_post(&format!("post {}", i), now - Duration::hours(i)))
            .collect();
        for post in &posts {
            store.insert_post(post).await.unwrap();
        }
        store.add_interaction(interaction(posts[0].id, InteractionKind::Like, None, now));
        store.add_interaction(interaction(posts[0].id, InteractionKind::Like, None, now));
        store.add_interaction(interaction(
            posts[4].id,
            InteractionKind::Comment,
            Some("more please"),
            now,
        ));
        // Outside the five most recent posts
        store.add_interaction(interaction(posts[6].id, InteractionKind::Like, None, now));

        let summary = load_summary(&store).await.unwrap();
        let entries = summary.entries();

        assert_eq!(entries.len(), RECENT_POST_LIMIT);
        let ids: Vec<Uuid> = entries.iter().map(|e| e.post_id).collect();
        let expected: Vec<Uuid> = posts[..5].iter().map(|p| p.id).collect();
        assert_eq!(ids, expected);
        assert_eq!(entries[0].likes, 2);
        assert_eq!(
            entries[4].comments,
            CommentThread::Comments(vec!["more please".to_string()])
        );
        assert_eq!(store.interaction_lookups(), 5);
    }

    #[tokio::test]
    async fn test_load_summary_without_history_is_empty() {
        // ---
        let store = MemoryStore::default();
        let summary = load_summary(&store).await.unwrap();
        assert!(summary.is_empty());
        assert_eq!(store.interaction_lookups(), 0);
    }
}
