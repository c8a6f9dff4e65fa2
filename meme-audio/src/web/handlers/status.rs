use axum::{extract::State, Json};
use chrono::Utc;

use meme_audio_api_structs::{Health, STATUS_OK};
use tracing::{error, instrument};

use crate::web::AppState;
use crate::Error;

/// Reports on the health of the web server.
#[instrument(skip(state))]
pub async fn get(State(state): State<AppState>) -> Result<Json<Health>, Error> {
    let _conn = state.db.acquire().await.map_err(|err| {
        error!("Database is unavailable: {:?}", err);
        err
    })?;

    Ok(Health {
        status: STATUS_OK.to_string(),
        timestamp: Utc::now(),
        db_connections: state.db.size(),
    }
    .into())
}
