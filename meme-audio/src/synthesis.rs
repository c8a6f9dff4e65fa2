/// Turns prompts into audio.
///
/// Handlers only see the [`AudioSynthesizer`] trait. The only implementation today is
/// [`PlaceholderSynthesizer`], which does not generate or store any audio: it makes up a
/// unique storage URL and estimates the duration from the prompt's length. A real
/// provider has to call a generation service with the prompt and the server-side model,
/// upload the result to object storage, and report the URL and measured duration.
use async_trait::async_trait;
use meme_audio_api_structs::Prompt;
use rand::{distributions::Alphanumeric, prelude::*};
use tracing::{debug, instrument};
use url::Url;

use crate::config;

/// The shortest clip the placeholder will report, in seconds.
pub const MIN_DURATION_SECS: i64 = 5;

const SUFFIX_LEN: usize = 8;

/// Where generated audio ended up and how long it is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedAudio {
    pub audio_url: String,
    /// Length in seconds; always positive.
    pub duration: i64,
}

#[async_trait]
pub trait AudioSynthesizer: Send + Sync + std::fmt::Debug {
    /// Generate audio for the prompt and store it somewhere fetchable.
    async fn synthesize(&self, prompt: &Prompt) -> Result<SynthesizedAudio, crate::Error>;
}

/// Roughly a tenth of a second per character, never shorter than [`MIN_DURATION_SECS`].
pub fn estimate_duration(prompt: &Prompt) -> i64 {
    let tenths = i64::try_from(prompt.char_count() / 10).unwrap_or(i64::MAX);
    tenths.max(MIN_DURATION_SECS)
}

#[derive(Debug, Clone)]
pub struct PlaceholderSynthesizer {
    storage_base_url: Url,
    model: Option<String>,
}

impl PlaceholderSynthesizer {
    pub fn new(config: &config::Synthesis) -> Self {
        Self {
            storage_base_url: config.storage_base_url.clone(),
            model: config.model.as_deref().map(url_safe),
        }
    }

    /// `{base}/clips/[{model}-]{unix millis}-{random suffix}.mp3`
    fn clip_url(&self) -> String {
        let suffix: String = thread_rng()
            .sample_iter(&Alphanumeric)
            .take(SUFFIX_LEN)
            .map(|c| char::from(c).to_ascii_lowercase())
            .collect();
        let model = self
            .model
            .as_ref()
            .map(|model| format!("{model}-"))
            .unwrap_or_default();
        format!(
            "{}/clips/{}{}-{}.mp3",
            self.storage_base_url.as_str().trim_end_matches('/'),
            model,
            chrono::Utc::now().timestamp_millis(),
            suffix
        )
    }
}

#[async_trait]
impl AudioSynthesizer for PlaceholderSynthesizer {
    #[instrument(skip_all)]
    async fn synthesize(&self, prompt: &Prompt) -> Result<SynthesizedAudio, crate::Error> {
        let audio = SynthesizedAudio {
            audio_url: self.clip_url(),
            duration: estimate_duration(prompt),
        };
        debug!(url = %audio.audio_url, duration = audio.duration, "Made up a clip");
        Ok(audio)
    }
}

fn url_safe(model: &str) -> String {
    model
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '-'
            }
        })
        .collect()
}
