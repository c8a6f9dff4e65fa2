use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Prompt, ValidationErrors};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioClip {
    /// The unique identifier for the clip, assigned by the server.
    pub id: i64,
    /// The prompt the clip was generated from.
    pub prompt: String,
    /// Where the generated audio can be fetched from.
    pub audio_url: String,
    /// Length of the audio, in seconds.
    pub duration: i64,
    /// The time when the clip was added to the database.
    pub created_at: DateTime<Utc>,
}

impl AudioClip {
    /// The duration as `m:ss`.
    pub fn formatted_duration(&self) -> String {
        let seconds = self.duration.max(0);
        format!("{}:{:02}", seconds / 60, seconds % 60)
    }
}

/// Request body for `createAudio`.
///
/// Unknown fields are refused, so a client cannot smuggle a model name or a
/// provider credential through this request.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CreateAudio {
    pub prompt: String,
}

/// A `createAudio` request that passed validation.
#[derive(Clone, Debug)]
pub struct NewAudio {
    pub prompt: Prompt,
}

impl TryFrom<CreateAudio> for NewAudio {
    type Error = ValidationErrors;

    fn try_from(request: CreateAudio) -> Result<Self, Self::Error> {
        let prompt = Prompt::parse(request.prompt)?;
        Ok(Self { prompt })
    }
}

/// Request input for `getAudioById`.
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct GetAudioById {
    pub id: i64,
}

/// A clip identifier known to be positive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClipId(i64);

impl ClipId {
    pub fn get(self) -> i64 {
        self.0
    }
}

impl TryFrom<GetAudioById> for ClipId {
    type Error = ValidationErrors;

    fn try_from(request: GetAudioById) -> Result<Self, Self::Error> {
        if request.id > 0 {
            Ok(Self(request.id))
        } else {
            Err(ValidationErrors::single("id", "Id must be a positive integer"))
        }
    }
}

impl fmt::Display for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
