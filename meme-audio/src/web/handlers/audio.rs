use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Json,
};
use meme_audio_api_structs::{
    AudioClip, ClipId, CreateAudio, GetAudioById, NewAudio, ValidationErrors,
};
use tracing::{error, info, instrument};

use crate::db;
use crate::web::AppState;

/// Generate a clip for a prompt and add it to the collection.
///
/// The request is validated before anything else happens, so a rejected prompt never
/// reaches the synthesizer or the database.
#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<CreateAudio>, JsonRejection>,
) -> Result<Json<AudioClip>, crate::Error> {
    let Json(request) =
        payload.map_err(|rejection| ValidationErrors::single("body", rejection.body_text()))?;
    let new_audio = NewAudio::try_from(request)?;

    let audio = state
        .synthesizer
        .synthesize(&new_audio.prompt)
        .await
        .map_err(|err| {
            error!("Audio creation failed: {}", err);
            err
        })?;

    let mut conn = state.db.acquire().await?;
    let clip = db::add_clip(
        &mut conn,
        new_audio.prompt.as_str(),
        &audio.audio_url,
        audio.duration,
    )
    .await
    .map_err(|err| {
        error!("Audio creation failed: {}", err);
        err
    })?;
    info!(id = clip.id, duration = clip.duration, "Created audio clip");
    Ok(AudioClip::from(clip).into())
}

/// List every clip, newest first.
#[instrument(skip(state))]
pub async fn get_all(State(state): State<AppState>) -> Result<Json<Vec<AudioClip>>, crate::Error> {
    let mut conn = state.db.acquire().await?;
    let clips = db::clips_list(&mut conn).await.map_err(|err| {
        error!("Get audio clips failed: {}", err);
        err
    })?;
    Ok(clips
        .into_iter()
        .map(AudioClip::from)
        .collect::<Vec<_>>()
        .into())
}

/// Get a single clip by id; a missing clip is `null`, not an error.
#[instrument(skip(state))]
pub async fn get(
    State(state): State<AppState>,
    query: Result<Query<GetAudioById>, QueryRejection>,
) -> Result<Json<Option<AudioClip>>, crate::Error> {
    let Query(request) =
        query.map_err(|rejection| ValidationErrors::single("query", rejection.body_text()))?;
    let id = ClipId::try_from(request)?;

    let mut conn = state.db.acquire().await?;
    let clip = db::get_clip(&mut conn, id.get()).await.map_err(|err| {
        error!("Failed to get audio clip by ID: {}", err);
        err
    })?;
    Ok(clip.map(AudioClip::from).into())
}
