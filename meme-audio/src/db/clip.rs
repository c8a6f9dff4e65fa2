use chrono::{DateTime, Utc};
use meme_audio_api_structs::AudioClip as ApiAudioClip;
use sqlx::SqliteConnection;
use tracing::instrument;

/// Representation of a generated audio clip in the database.
///
/// Rows are only ever inserted; nothing updates or deletes them.
#[derive(Debug, sqlx::FromRow)]
pub struct AudioClip {
    /// The unique identifier for the clip and primary key for the table.
    pub id: i64,
    /// The prompt the audio was generated from.
    pub prompt: String,
    /// Where the generated audio can be fetched from.
    pub audio_url: String,
    /// Length of the audio, in seconds.
    pub duration: i64,
    /// The time when the clip was added to the database.
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Display for AudioClip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Clip ID {}\n\tPrompt: {}\n\tDuration: {}s\n\tURL: {}\n",
            self.id, self.prompt, self.duration, self.audio_url
        )
    }
}

impl From<AudioClip> for ApiAudioClip {
    fn from(clip: AudioClip) -> Self {
        Self {
            id: clip.id,
            prompt: clip.prompt,
            audio_url: clip.audio_url,
            duration: clip.duration,
            created_at: clip.created_at,
        }
    }
}

/// Insert a new clip. The database assigns `id` and `created_at`.
#[instrument(skip(connection, prompt))]
pub async fn add_clip(
    connection: &mut SqliteConnection,
    prompt: &str,
    audio_url: &str,
    duration: i64,
) -> Result<AudioClip, crate::Error> {
    Ok(sqlx::query_as::<_, AudioClip>(
        "
        INSERT INTO audio_clips (prompt, audio_url, duration)
        VALUES ($1, $2, $3)
        RETURNING id, prompt, audio_url, duration, created_at
        ",
    )
    .bind(prompt)
    .bind(audio_url)
    .bind(duration)
    .fetch_one(&mut *connection)
    .await?)
}

/// Get a single clip by id, or `None` if no clip has that id.
#[instrument(skip(connection))]
pub async fn get_clip(
    connection: &mut SqliteConnection,
    id: i64,
) -> Result<Option<AudioClip>, crate::Error> {
    Ok(sqlx::query_as::<_, AudioClip>(
        "
        SELECT id, prompt, audio_url, duration, created_at
        FROM audio_clips
        WHERE id = $1;
        ",
    )
    .bind(id)
    .fetch_optional(&mut *connection)
    .await?)
}

/// List all clips in the database, newest first. No pagination is performed.
///
/// Clips created within the same millisecond are ordered by id, so the most recently
/// inserted still comes first.
#[instrument(skip_all)]
pub async fn clips_list(connection: &mut SqliteConnection) -> Result<Vec<AudioClip>, crate::Error> {
    sqlx::query_as::<_, AudioClip>(
        "
        SELECT id, prompt, audio_url, duration, created_at
        FROM audio_clips
        ORDER BY created_at DESC, id DESC;
        ",
    )
    .fetch_all(&mut *connection)
    .await
    .map_err(crate::Error::Database)
}
