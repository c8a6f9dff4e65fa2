// SPDX-License-Identifier: GPL-2.0-or-later
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use meme_audio::config::Config;
use meme_audio::synthesis::PlaceholderSynthesizer;
use meme_audio::web::{self, AppState};
use meme_audio::{cli, db, Error};

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let opts = cli::MemeAudio::parse();
    let config = opts.resolve_config();

    if let Err(e) = process_command(opts.command.unwrap_or_default(), config).await {
        error!("{e}");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn process_command(command: cli::Command, config: Config) -> Result<(), Error> {
    match command {
        cli::Command::Config => {
            println!("{config}");
            Ok(())
        }
        cli::Command::Migrate => {
            let db_pool = db::connect(&config).await?;
            db::migrate(&db_pool).await?;
            info!("Database is up to date");
            Ok(())
        }
        cli::Command::Run => {
            let tls = config.http_api.tls()?;
            let db_pool = db::connect(&config).await?;
            db::migrate(&db_pool).await?;

            let synthesizer = Arc::new(PlaceholderSynthesizer::new(&config.synthesis));
            let router = web::create_router(AppState::new(db_pool, synthesizer));

            let http_handle = axum_server::Handle::new();
            let handle = http_handle.clone();
            tokio::spawn(async move {
                let _shutdown_signal = tokio::signal::ctrl_c().await;
                info!("Shutdown signal received; beginning graceful shutdown.");
                handle.graceful_shutdown(Some(Duration::from_secs(15)));
            });

            let url = config.http_api.url;
            match tls {
                None => {
                    info!("RPC server listening on {:?}", &url);
                    tokio::spawn(async move {
                        axum_server::bind(url)
                            .handle(http_handle)
                            .serve(router.into_make_service())
                            .await
                            .map_err(Error::Server)
                    })
                }
                Some((cert, key)) => tokio::spawn(async move {
                    info!("RPC server listening with TLS on {:?}", &url);
                    let tls_config =
                        axum_server::tls_rustls::RustlsConfig::from_pem_file(cert, key)
                            .await
                            .map_err(Error::Server)?;
                    axum_server::bind_rustls(url, tls_config)
                        .handle(http_handle)
                        .serve(router.into_make_service())
                        .await
                        .map_err(Error::Server)
                }),
            }
            .await??;

            Ok(())
        }
    }
}
