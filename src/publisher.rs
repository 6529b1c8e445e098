//! Publishing diary entries to Bluesky.
//!
//! Length is checked before the publisher is touched, so an oversized entry
//! never causes a network call.

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::error::UpstreamError;
use crate::DiaryError;

// ---

const SERVICE: &str = "bluesky";

/// Marker prepended to every published diary entry.
pub const DIARY_PREFIX: &str = "🌱 ";

/// Hard limit on the posted text, counted in UTF-16 code units.
pub const MAX_POST_LENGTH: usize = 300;

pub const TEST_MESSAGE: &str = "🌱 LeafMeAlone Test 🌱\n\nThis is a test message to verify the connection with Bluesky.\n\n#LeafMeAlone #Test";

#[async_trait]
pub trait FeedPublisher: Send + Sync {
    /// Post `text` exactly as given. One attempt, no retry.
    async fn post(&self, text: &str) -> Result<(), DiaryError>;
}

/// Length of `text` as the feed counts it.
///
/// The emoji prefix is two UTF-16 units plus the space, so it costs 3.
pub fn post_length(text: &str) -> usize {
    text.encode_utf16().count()
}

/// Prefix `diary` with the marker and check it against the post limit.
pub fn format_diary_post(diary: &str) -> Result<String, DiaryError> {
    // ---
    let text = format!("{}{}", DIARY_PREFIX, diary);
    let length = post_length(&text);
    if length > MAX_POST_LENGTH {
        return Err(DiaryError::LengthExceeded {
            length,
            max: MAX_POST_LENGTH,
        });
    }
    Ok(text)
}

pub async fn publish_diary(publisher: &dyn FeedPublisher, diary: &str) -> Result<(), DiaryError> {
    // ---
    let text = format_diary_post(diary)?;
    publisher.post(&text).await?;
    info!("Plant diary published to Bluesky successfully");
    Ok(())
}

pub async fn publish_test_message(publisher: &dyn FeedPublisher) -> Result<(), DiaryError> {
    // ---
    publisher.post(TEST_MESSAGE).await?;
    info!("Test message published to Bluesky successfully");
    Ok(())
}

/// AT Protocol client: logs in with an app password, then creates a feed
/// post record. A fresh session is opened per post.
pub struct BlueskyClient {
    client: Client,
    service: String,
    identifier: Option<String>,
    password: Option<String>,
}

impl BlueskyClient {
    // ---
    pub fn new(
        client: Client,
        service: impl Into<String>,
        identifier: Option<String>,
        password: Option<String>,
    ) -> Self {
        // ---
        Self {
            client,
            service: service.into().trim_end_matches('/').to_string(),
            identifier,
            password,
        }
    }

    fn xrpc_url(&self, method: &str) -> String {
        format!("{}/xrpc/{}", self.service, method)
    }

    async fn login(&self, identifier: &str, password: &str) -> Result<Session, DiaryError> {
        // ---
        debug!(identifier, "Creating Bluesky session");
        let response = self
            .client
            .post(self.xrpc_url("com.atproto.server.createSession"))
            .json(&CreateSessionRequest {
                identifier,
                password,
            })
            .send()
            .await
            .map_err(send_failed)?;

        let response = check_status(response).await?;
        response.json::<Session>().await.map_err(|e| {
            DiaryError::upstream(SERVICE, UpstreamError::MalformedResponse(e.to_string()))
        })
    }
}

#[async_trait]
impl FeedPublisher for BlueskyClient {
    // ---
    async fn post(&self, text: &str) -> Result<(), DiaryError> {
        // ---
        let (identifier, password) = match (self.identifier.as_deref(), self.password.as_deref()) {
            (Some(i), Some(p)) => (i, p),
            (None, _) => return Err(DiaryError::ConfigurationMissing("BLUESKY_IDENTIFIER")),
            (_, None) => return Err(DiaryError::ConfigurationMissing("BLUESKY_PASSWORD")),
        };

        let session = self.login(identifier, password).await?;

        let request = CreateRecordRequest {
            repo: &session.did,
            collection: "app.bsky.feed.post",
            record: PostRecord {
                record_type: "app.bsky.feed.post",
                text,
                created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            },
        };

        let response = self
            .client
            .post(self.xrpc_url("com.atproto.repo.createRecord"))
            .bearer_auth(&session.access_jwt)
            .json(&request)
            .send()
            .await
            .map_err(send_failed)?;

        check_status(response).await?;
        Ok(())
    }
}

fn send_failed(e: reqwest::Error) -> DiaryError {
    // ---
    error!(error = %e, "Failed to reach Bluesky");
    DiaryError::upstream(SERVICE, UpstreamError::Unreachable(e.to_string()))
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, DiaryError> {
    // ---
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<XrpcError>(&body)
        .ok()
        .and_then(|e| e.message.or(e.error))
        .unwrap_or_else(|| "Unknown error".to_string());

    error!(status = %status, body = %body, "Bluesky API error");
    Err(DiaryError::upstream(
        SERVICE,
        UpstreamError::Status {
            status: status.as_u16(),
            message,
        },
    ))
}

// === Request/Response Types ===

#[derive(Debug, Serialize)]
struct CreateSessionRequest<'a> {
    identifier: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Session {
    access_jwt: String,
    did: String,
}

#[derive(Debug, Serialize)]
struct CreateRecordRequest<'a> {
    repo: &'a str,
    collection: &'static str,
    record: PostRecord<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PostRecord<'a> {
    #[serde(rename = "$type")]
    record_type: &'static str,
    text: &'a str,
    created_at: String,
}

#[derive(Debug, Deserialize)]
struct XrpcError {
    error: Option<String>,
    message: Option<String>,
}
