// Entrypoint for the CLI application.
// - Keeps `main` small: load configuration, create an API client and
//   hand everything to the batch flow in `run`.
// - Returns `anyhow::Result` so setup failures print a clean error.

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tunetag::api::ApiClient;
use tunetag::cli::Cli;
use tunetag::run::{self, CoverPolicy, RunOptions};

fn main() -> anyhow::Result<()> {
    // A .env in the working directory may hold CLIENT_ID / CLIENT_SECRET.
    dotenvy::dotenv().ok();
    init_logging().context("Failed to open app.log")?;

    let cli = Cli::parse();
    run::print_banner();

    let api = ApiClient::from_env()?;

    let covers = if cli.yes {
        CoverPolicy::Replace
    } else if cli.skip_existing {
        CoverPolicy::Keep
    } else {
        CoverPolicy::Ask
    };

    run::run(
        api,
        RunOptions {
            folder: cli.folder,
            recursive: cli.recursive,
            covers,
            artist: cli.artist,
            quiet: cli.quiet,
        },
    )
}

/// Log to `app.log` in the working directory; the console stays
/// reserved for user-facing output and prompts. `RUST_LOG` overrides
/// the default `info` level.
fn init_logging() -> anyhow::Result<()> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open("app.log")?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}
