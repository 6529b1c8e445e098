//! Prompt composition for diary generation.
//!
//! `compose` is a pure string template: the same reading, mood tags and
//! engagement summary always produce the same prompt. It never validates or
//! truncates anything.

use std::{fmt, fmt::Write as _, str::FromStr};

use crate::engagement::{CommentThread, EngagementSummary};
use crate::mood::MoodTag;
use crate::Reading;

// ---

/// Length ceiling the model is instructed to respect.
pub const DIARY_MAX_CHARS: usize = 280;

/// Voice the plant writes in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PersonaTemplate {
    NeutralReporter,
    CynicalFriend,
    #[default]
    EngagementAware,
}

impl PersonaTemplate {
    // ---
    pub fn as_str(&self) -> &'static str {
        match self {
            PersonaTemplate::NeutralReporter => "neutral-reporter",
            PersonaTemplate::CynicalFriend => "cynical-friend",
            PersonaTemplate::EngagementAware => "engagement-aware",
        }
    }

    fn system_message(&self) -> String {
        // ---
        let voice = match self {
            PersonaTemplate::NeutralReporter => {
                "You are an indoor plant keeping a calm, matter-of-fact diary of your day."
            }
            PersonaTemplate::CynicalFriend => {
                "You are an indoor plant with a dry, sarcastic wit, writing to a friend who \
                 keeps forgetting to water you."
            }
            PersonaTemplate::EngagementAware => {
                "You are an indoor plant with a unique personality that changes every day. \
                 You can be cynical, poetic, philosophical, cheerful, or melancholic, but \
                 always with a touch of humor. You pay attention to what your readers liked."
            }
        };
        format!(
            "{} You must always respond in {} characters or less.",
            voice, DIARY_MAX_CHARS
        )
    }

    fn preamble(&self) -> &'static str {
        match self {
            PersonaTemplate::NeutralReporter => {
                "Write a short diary entry describing how your day went, in a plain and \
                 observant tone."
            }
            PersonaTemplate::CynicalFriend => {
                "Write a short diary entry about your day. Be sarcastic and a little \
                 grumpy, but let some affection show through."
            }
            PersonaTemplate::EngagementAware => {
                "Write a short diary entry about your day. Adapt your style to your mood: \
                 if you're poetic, write a little poem; if you're philosophical, share a deep \
                 thought; if you're cheerful, tell a funny anecdote. Lean into whatever your \
                 readers responded to in your previous entries."
            }
        }
    }
}

impl fmt::Display for PersonaTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PersonaTemplate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "neutral-reporter" => Ok(PersonaTemplate::NeutralReporter),
            "cynical-friend" => Ok(PersonaTemplate::CynicalFriend),
            "engagement-aware" => Ok(PersonaTemplate::EngagementAware),
            other => Err(format!(
                "unknown persona '{}' (expected neutral-reporter, cynical-friend or engagement-aware)",
                other
            )),
        }
    }
}

/// The two messages sent to the text-generation service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedPrompt {
    pub system: String,
    pub user: String,
}

pub fn compose(
    persona: PersonaTemplate,
    reading: &Reading,
    moods: &[MoodTag],
    summary: &EngagementSummary,
) -> ComposedPrompt {
    // ---
    let mut user = String::new();

    // `write!` into a String cannot fail
    let _ = writeln!(user, "{}", persona.preamble());
    let _ = writeln!(user);

    render_mood(&mut user, moods);
    render_reading(&mut user, reading);
    render_history(&mut user, summary);

    let _ = writeln!(
        user,
        "IMPORTANT: Your response must be {} characters or less. Not one more.",
        DIARY_MAX_CHARS
    );
    let _ = write!(
        user,
        "Do not quote any numbers or measurements from the data above; express how they \
         make you feel instead. The text will be posted with an emoji, so keep it short."
    );

    ComposedPrompt {
        system: persona.system_message(),
        user,
    }
}

fn render_mood(out: &mut String, moods: &[MoodTag]) {
    // ---
    if moods.is_empty() {
        let _ = writeln!(out, "Today's mood: balanced, nothing stands out.");
    } else {
        let names: Vec<&str> = moods.iter().map(MoodTag::as_str).collect();
        let _ = writeln!(out, "Today's mood: {}.", names.join(", "));
        for mood in moods {
            let _ = writeln!(out, "- {}", mood.description());
        }
    }
    let _ = writeln!(out);
}

fn render_reading(out: &mut String, reading: &Reading) {
    // ---
    let env = &reading.environmental_data;
    let ext = &reading.external_factors;

    let _ = writeln!(out, "Location: {}", env.location);
    let _ = writeln!(out);
    let _ = writeln!(out, "Environmental Conditions:");
    let _ = writeln!(out, "- Air temperature: {}°C", env.air.temperature);
    let _ = writeln!(out, "- Air humidity: {}%", env.air.humidity);
    let _ = writeln!(out, "- Soil humidity: {}%", env.soil.humidity);
    let _ = writeln!(out, "- Light intensity: {} lux", env.light.intensity);
    let _ = writeln!(out, "- Light exposure duration: {} hours", env.light.duration);
    let _ = writeln!(out);
    let _ = writeln!(out, "Weather Conditions:");
    let _ = writeln!(out, "- Temperature: {}°C", ext.weather.temperature);
    let _ = writeln!(out, "- Precipitation: {}mm", ext.weather.precipitation);
    let _ = writeln!(out, "- Cloud cover: {}%", ext.weather.cloud_cover);
    let _ = writeln!(out, "- Moon phase: {}", ext.weather.moon_phase);
    let _ = writeln!(out, "- Air quality: {}", ext.weather.air_quality);
    let _ = writeln!(out);
    let _ = writeln!(out, "Market Indices:");
    let _ = writeln!(out, "- Dow Jones: {}", ext.market_indices.dow_jones);
    let _ = writeln!(out, "- NASDAQ: {}", ext.market_indices.nasdaq);
    let _ = writeln!(out);
    let _ = writeln!(out, "Latest News:");
    if ext.news.is_empty() {
        let _ = writeln!(out, "- No news today");
    } else {
        for headline in &ext.news {
            let _ = writeln!(out, "- {}", headline);
        }
    }
    let _ = writeln!(out);
}

fn render_history(out: &mut String, summary: &EngagementSummary) {
    // ---
    let _ = writeln!(out, "Your previous diary entries and how readers reacted:");
    if summary.is_empty() {
        let _ = writeln!(out, "No previous diary entries yet.");
    }
    for (n, entry) in summary.entries().iter().enumerate() {
        let _ = writeln!(out, "{}. \"{}\"", n + 1, entry.content);
        let _ = writeln!(out, "   Likes: {}", entry.likes);
        match &entry.comments {
            CommentThread::NoComments => {
                let _ = writeln!(out, "   Comments: No comments");
            }
            CommentThread::Comments(comments) => {
                let _ = writeln!(out, "   Comments:");
                for comment in comments {
                    let _ = writeln!(out, "   - \"{}\"", comment);
                }
            }
        }
    }
    let _ = writeln!(out);
}
