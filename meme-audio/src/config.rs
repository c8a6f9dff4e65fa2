/// Defines the configuration file format for meme-audio.
use std::{
    fmt::Display,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::Error;

pub const DEFAULT_PORT: u16 = 2022;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// The sqlx connection string for the clip database.
    pub database_url: String,
    /// Upper bound on pooled database connections.
    pub max_connections: u32,
    /// The HTTP server configuration options
    pub http_api: HttpApi,
    /// Options for the audio synthesizer
    pub synthesis: Synthesis,
}

impl Config {
    /// Listen on `port` on the configured interface.
    pub fn set_port(&mut self, port: u16) {
        self.http_api.url.set_port(port);
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct HttpApi {
    /// The address the RPC server binds to.
    pub url: SocketAddr,
    /// The path to an x509 certificate the server should use for HTTPS.
    pub tls_certificate: Option<PathBuf>,
    /// The path to the key for the given certificate.
    pub tls_key: Option<PathBuf>,
}

impl HttpApi {
    /// The certificate and key to serve HTTPS with, if any.
    ///
    /// Both must be set, or neither.
    pub fn tls(&self) -> Result<Option<(PathBuf, PathBuf)>, Error> {
        match (&self.tls_certificate, &self.tls_key) {
            (None, None) => Ok(None),
            (Some(cert), Some(key)) => Ok(Some((cert.clone(), key.clone()))),
            _ => Err(Error::ConfigValueError(
                "'tls_certificate' and 'tls_key' must both be set or neither should be set."
                    .into(),
            )),
        }
    }
}

impl Default for HttpApi {
    fn default() -> Self {
        HttpApi {
            url: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
            tls_certificate: None,
            tls_key: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Synthesis {
    /// Prefix of every generated audio URL.
    pub storage_base_url: Url,
    /// The model to generate audio with. This is never accepted from clients.
    pub model: Option<String>,
}

impl Default for Synthesis {
    fn default() -> Self {
        Synthesis {
            storage_base_url: Url::parse("https://audio-storage.example.com")
                .expect("the default storage URL is valid"),
            model: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database_url: "sqlite://meme-audio.sqlite".to_string(),
            max_connections: 8,
            http_api: Default::default(),
            synthesis: Default::default(),
        }
    }
}

impl Display for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            toml::ser::to_string_pretty(&self).unwrap_or_default()
        )
    }
}

/// Load a [`Config`] instance from the given path.
pub fn load_config(path: &str) -> Result<Config, Error> {
    let path = PathBuf::from(path);
    let config_string = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&config_string).map_err(|err| {
        eprintln!("Example config format:\n\n{}", Config::default());
        err
    })?;
    config.http_api.tls()?;
    Ok(config)
}
