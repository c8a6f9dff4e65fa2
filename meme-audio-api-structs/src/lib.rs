/// Defines public-facing structures used in the RPC API
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

mod clip;
mod validation;

pub use clip::{AudioClip, ClipId, CreateAudio, GetAudioById, NewAudio};
pub use validation::{Issue, Prompt, ValidationErrors, PROMPT_MAX_CHARS};

/// The status token reported by a healthy server.
pub const STATUS_OK: &str = "ok";

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Health {
    /// Always [`STATUS_OK`] when the server answers at all.
    pub status: String,
    /// The server's clock at the time of the request.
    pub timestamp: DateTime<Utc>,
    pub db_connections: u32,
}

/// The JSON body of error responses from the RPC operations and of unknown routes.
///
/// Requests using the wrong method on a known route get a bare 405.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<Issue>,
}
