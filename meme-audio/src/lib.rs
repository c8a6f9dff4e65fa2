// SPDX-License-Identifier: GPL-2.0-or-later
use meme_audio_api_structs::ValidationErrors;
use thiserror::Error as ThisError;

/// An enumeration of errors meme-audio library functions can encounter.
#[derive(ThisError, Debug)]
pub enum Error {
    #[error("A database error occurred: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Database migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("Client request is invalid: {0}")]
    Validation(#[from] ValidationErrors),
    #[error("Audio synthesis failed: {0}")]
    Synthesis(String),
    #[error("Configuration file could not be read: {0}")]
    ConfigReadError(#[from] std::io::Error),
    #[error("Configuration file could not be parsed: {0}")]
    ConfigParseError(#[from] toml::de::Error),
    #[error("Configuration file contains invalid values: {0}")]
    ConfigValueError(String),
    #[error("HTTP server encountered an error: {0}")]
    Server(std::io::Error),
    #[error("Tokio task failed: {0}")]
    TokioTask(#[from] tokio::task::JoinError),
}

pub mod cli;
pub mod config;
pub mod db;
pub mod synthesis;
pub mod web;
