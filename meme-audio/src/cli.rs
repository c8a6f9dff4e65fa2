// SPDX-License-Identifier: GPL-2.0-or-later
use clap::{Parser, Subcommand};

use crate::config::{load_config, Config};

/// Serve the meme audio generator and its clip collection.
///
/// # Logging
///
/// Log levels and filtering are controlled by tracing_subscriber's EnvFilter using the
/// RUST_LOG environment variable. Refer to the documentation at
/// https://docs.rs/tracing-subscriber/0.3/tracing_subscriber/filter/struct.EnvFilter.html
/// for complete details. When unset, "info" is used.
///
/// # Configuration
///
/// The optional configuration file is expected to be in TOML format. The listening port and
/// database URL can also be set with SERVER_PORT and DATABASE_URL, which take precedence over
/// the file.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct MemeAudio {
    /// Path to a configuration file; built-in defaults are used when omitted
    #[arg(long, value_parser = load_config, env = "MEME_AUDIO_CONFIG")]
    pub config: Option<Config>,
    /// The port to listen on
    #[arg(long, env = "SERVER_PORT")]
    pub port: Option<u16>,
    /// The sqlx connection string for the clip database
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl MemeAudio {
    /// Merge the configuration file with any settings given on the command line or in the
    /// environment.
    pub fn resolve_config(&self) -> Config {
        let mut config = self.config.clone().unwrap_or_default();
        if let Some(port) = self.port {
            config.set_port(port);
        }
        if let Some(database_url) = &self.database_url {
            config.database_url = database_url.clone();
        }
        config
    }
}

#[derive(Subcommand, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Apply database migrations and run the RPC server (the default)
    #[default]
    Run,
    /// Apply database migrations and exit
    Migrate,
    /// Print the effective configuration
    Config,
}
