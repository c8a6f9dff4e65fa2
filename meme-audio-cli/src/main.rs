use std::time::Duration;

use clap::{Parser, Subcommand};
use meme_audio_api_structs::{
    AudioClip, ClipId, CreateAudio, ErrorBody, GetAudioById, Health, NewAudio, ValidationErrors,
};
use prettytable::{row, Table};
use reqwest::{Response, Url};
use thiserror::Error as ThisError;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// How much of a prompt to show in the clip table.
const PROMPT_COLUMN_CHARS: usize = 60;

#[derive(ThisError, Debug)]
enum Error {
    #[error("An HTTP error occurred: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("Unable to parse meme-audio server URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("Unable to serialize output to JSON: {0}")]
    Json(#[from] serde_json::error::Error),
    #[error("Request is invalid: {0}")]
    Invalid(#[from] ValidationErrors),
    #[error("The server rejected the request ({status}): {message}")]
    Server {
        status: reqwest::StatusCode,
        message: String,
    },
}

/// Command-line interface for the meme-audio service
///
/// This supports generating clips and browsing the shared collection.
#[derive(clap::Parser, Debug)]
#[command(name = "meme-audio")]
#[command(about = "Generate and browse meme audio clips", long_about = None)]
struct Cli {
    #[arg(long, env = "MEME_AUDIO_URL", default_value = "http://127.0.0.1:2022/")]
    url: Url,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that the server is up
    Health,
    /// Generate a new clip from a prompt
    Create {
        /// What the clip should sound like (1 to 500 characters)
        prompt: String,
    },
    /// List every clip, newest first
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show a single clip
    Get {
        /// The clip ID (from "list")
        id: i64,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let opts = Cli::parse();
    if let Err(e) = process_command(opts).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn process_command(opts: Cli) -> Result<(), Error> {
    let client = reqwest::ClientBuilder::new()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(30))
        .build()?;

    match opts.command {
        Command::Health => {
            let response = client
                .get(rpc_url(&opts.url, "healthcheck")?)
                .send()
                .await?;
            let health = check(response).await?.json::<Health>().await?;
            println!("{}", serde_json::to_string_pretty(&health)?);
        }
        Command::Create { prompt } => {
            let request = CreateAudio { prompt };
            // Catch what the server would reject without a round trip.
            NewAudio::try_from(request.clone())?;
            let response = client
                .post(rpc_url(&opts.url, "createAudio")?)
                .json(&request)
                .send()
                .await?;
            let clip = check(response).await?.json::<AudioClip>().await?;
            println!("{}", serde_json::to_string_pretty(&clip)?);
        }
        Command::List { json } => {
            let response = client
                .get(rpc_url(&opts.url, "getAudioClips")?)
                .send()
                .await?;
            let clips = check(response).await?.json::<Vec<AudioClip>>().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&clips)?);
            } else {
                print!("{}", clips_table(&clips));
            }
        }
        Command::Get { id } => {
            let request = GetAudioById { id };
            let id = ClipId::try_from(request)?;
            let response = client
                .get(rpc_url(&opts.url, "getAudioById")?)
                .query(&request)
                .send()
                .await?;
            match check(response).await?.json::<Option<AudioClip>>().await? {
                Some(clip) => println!("{}", serde_json::to_string_pretty(&clip)?),
                None => println!("Clip {id} not found"),
            }
        }
    }
    Ok(())
}

fn rpc_url(base: &Url, operation: &str) -> Result<Url, Error> {
    Ok(base.join(&format!("rpc/{operation}"))?)
}

/// Turn non-2xx responses into an [`Error::Server`], using the server's error body when
/// there is one.
async fn check(response: Response) -> Result<Response, Error> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) if body.issues.is_empty() => body.error,
        Ok(body) => format!(
            "{}: {}",
            body.error,
            ValidationErrors {
                issues: body.issues
            }
        ),
        Err(_) => text,
    };
    Err(Error::Server { status, message })
}

fn clips_table(clips: &[AudioClip]) -> Table {
    let mut table = Table::new();
    table.set_titles(row!["ID", "Duration", "Created", "Prompt"]);
    for clip in clips {
        table.add_row(row![
            clip.id,
            clip.formatted_duration(),
            clip.created_at.format("%Y-%m-%d %H:%M"),
            truncate(&clip.prompt, PROMPT_COLUMN_CHARS),
        ]);
    }
    table
}

fn truncate(prompt: &str, max_chars: usize) -> String {
    if prompt.chars().count() > max_chars {
        let head: String = prompt.chars().take(max_chars).collect();
        format!("{head}...")
    } else {
        prompt.to_owned()
    }
}
