// Terminal layer: drives the per-file pipeline and owns every prompt,
// using `dialoguer` for input and `indicatif` for progress. The flow is
// strictly sequential: authenticate, scan, then tag file by file.

use crate::api::{ApiClient, Track, TrackSummary};
use crate::scan;
use crate::tags::{self, TrackTags};
use anyhow::{Context, Result};
use crossterm::style::Stylize;
use dialoguer::{Confirm, Input, Password};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// What to do with a file that already has a front cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverPolicy {
    /// Ask per file (the default).
    Ask,
    /// Replace without asking (`--yes`).
    Replace,
    /// Leave the file untouched (`--skip-existing`).
    Keep,
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub folder: PathBuf,
    pub recursive: bool,
    pub covers: CoverPolicy,
    /// Artist name attached to every search query.
    pub artist: Option<String>,
    pub quiet: bool,
}

pub fn print_banner() {
    let banner = r#"
 _                    _
| |_ _   _ _ __   ___| |_ __ _  __ _
| __| | | | '_ \ / _ \ __/ _` |/ _` |
| |_| |_| | | | |  __/ || (_| | (_| |
 \__|\__,_|_| |_|\___|\__\__,_|\__, |
                               |___/"#;
    println!("{}", banner.cyan());
    println!("Batch-tags your MP3/FLAC files with metadata and cover art");
    println!("from a music catalog. Press Ctrl+C to exit.\n");
}

/// Top-level flow. Receives a configured `ApiClient` and blocks until
/// every discovered file was either tagged or skipped.
pub fn run(mut api: ApiClient, opts: RunOptions) -> Result<()> {
    if !api.has_credentials() {
        let (id, secret) = prompt_credentials()?;
        api.set_credentials(&id, &secret);
    }

    println!("---> Requesting catalog access token...");
    api.authenticate()?;
    println!("---> Authorization completed successfully.");

    println!("---> Looking for song files in {}...", opts.folder.display());
    info!(
        "scanning {} (recursive: {})",
        opts.folder.display(),
        opts.recursive
    );
    let files = scan::scan(&opts.folder, opts.recursive)?;
    if files.is_empty() {
        warn!("no song files found in {}", opts.folder.display());
        println!(
            "{}",
            format!(
                "---> WARNING: No song files found in {}.",
                opts.folder.display()
            )
            .yellow()
        );
        return Ok(());
    }
    info!("found {} song files", files.len());

    let bar = if opts.quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(files.len() as u64)
    };
    bar.set_style(ProgressStyle::with_template("{bar:30} {pos}/{len} {msg}").unwrap());

    let mut tagged = 0usize;
    let mut skipped = 0usize;
    for file in &files {
        match tag_file(&api, file, &opts, &bar) {
            Ok(true) => tagged += 1,
            Ok(false) => skipped += 1,
            Err(e) => {
                skipped += 1;
                error!("failed to tag {}: {:#}", file.display(), e);
                say(&bar, format!("--- ERROR: {:#}. Skipping...", e).red().to_string());
            }
        }
        bar.inc(1);
    }
    bar.finish_and_clear();

    info!("run completed: {} tagged, {} skipped", tagged, skipped);
    println!("\n---> Done: {} tagged, {} skipped.", tagged, skipped);
    Ok(())
}

/// Process a single file top to bottom. Returns `Ok(false)` when the
/// file was deliberately skipped; errors bubble up to the caller which
/// warns and moves on to the next file.
fn tag_file(api: &ApiClient, file: &Path, opts: &RunOptions, bar: &ProgressBar) -> Result<bool> {
    let title = scan::song_title_from_path(file);
    bar.set_message(ellipsize(&title, 40));
    say(bar, format!("Processing song: {}", ellipsize(&title, 50)));
    info!("processing {}", file.display());

    // Decide the cover question up front; a declined replacement skips
    // the file entirely, before any catalog traffic.
    let replace_cover = if tags::has_front_cover(file)? {
        match opts.covers {
            CoverPolicy::Replace => true,
            CoverPolicy::Keep => {
                info!("skipping {} (existing cover image)", file.display());
                say(bar, "--- File skipped (existing cover image).");
                return Ok(false);
            }
            CoverPolicy::Ask => {
                warn!("cover image already exists in {}", file.display());
                let replace = bar
                    .suspend(|| {
                        Confirm::new()
                            .with_prompt(
                                "--- Existing cover image detected. Do you want to replace it?",
                            )
                            .default(false)
                            .interact()
                    })
                    .context("Failed to read confirmation")?;
                if !replace {
                    info!("skipping {} (user kept existing cover)", file.display());
                    say(bar, "--- File skipped.");
                    return Ok(false);
                }
                info!("replacing the existing cover image in {}", file.display());
                true
            }
        }
    } else {
        false
    };

    let seed_artist = opts.artist.as_deref().unwrap_or("");
    let hit = resolve_track(api, &title, seed_artist, bar)?;
    info!("matched {:?} to track {}", title, hit.id);

    let track = api.track(&hit.id)?;

    let cover = match track.album.images.first() {
        Some(image) => Some(api.fetch_image(&image.url)?),
        None => {
            warn!("no cover image in catalog for track {}", hit.id);
            say(
                bar,
                format!(
                    "--- WARNING: No cover image available for {}.",
                    ellipsize(&track.name, 50)
                )
                .yellow()
                .to_string(),
            );
            None
        }
    };

    let genre = track
        .album
        .genres
        .first()
        .cloned()
        .or_else(|| artist_genre(api, &track));
    let year = track
        .album
        .release_date
        .as_deref()
        .and_then(tags::year_from_release_date);

    let track_tags = TrackTags {
        title: track.name.clone(),
        artists: track.artists.iter().map(|a| a.name.clone()).collect(),
        album: track.album.name.clone(),
        track_number: Some(track.track_number),
        genre,
        year,
        cover,
    };

    tags::write_tags(file, &track_tags, replace_cover)?;
    info!("tagged {}", file.display());
    Ok(true)
}

/// Resolve a search title to a track id. On an empty result set the
/// user is warned and asked to retype the song and artist name until
/// the catalog returns a hit.
fn resolve_track(
    api: &ApiClient,
    title: &str,
    artist: &str,
    bar: &ProgressBar,
) -> Result<TrackSummary> {
    let mut title = title.to_string();
    let mut artist = artist.to_string();
    loop {
        if let Some(hit) = api.search_track(&title, &artist)? {
            return Ok(hit);
        }
        warn!("no results found for {:?}", title);
        say(
            bar,
            format!("--- WARNING: No results found for {}.", ellipsize(&title, 50))
                .yellow()
                .to_string(),
        );
        let (t, a) = bar.suspend(prompt_manual_query)?;
        title = t;
        artist = a;
    }
}

/// Ask for a manually typed song name (non-empty) and artist name
/// (optional) to retry a search with.
fn prompt_manual_query() -> Result<(String, String)> {
    let title: String = Input::new()
        .with_prompt("--- Enter the song name manually")
        .validate_with(|s: &String| -> Result<(), &str> {
            if s.trim().is_empty() {
                Err("song name cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()
        .context("Failed to read song name")?;
    let artist: String = Input::new()
        .with_prompt("--- Enter the artist name manually")
        .allow_empty(true)
        .interact_text()
        .context("Failed to read artist name")?;
    Ok((title, artist))
}

/// Collect catalog credentials interactively when the environment does
/// not provide them. `Password` hides the secret in the terminal.
fn prompt_credentials() -> Result<(String, String)> {
    println!(
        "{}",
        "Catalog API credentials are not configured.".yellow()
    );
    let id: String = Input::new()
        .with_prompt("Client ID")
        .interact_text()
        .context("Failed to read client id")?;
    let secret: String = Password::new()
        .with_prompt("Client secret")
        .interact()
        .context("Failed to read client secret")?;
    Ok((id, secret))
}

/// Best-effort genre from the track's primary artist; failures only
/// cost the genre frame, never the file.
fn artist_genre(api: &ApiClient, track: &Track) -> Option<String> {
    let primary = track.artists.first()?;
    match api.artist(&primary.id) {
        Ok(artist) => artist.genres.into_iter().next(),
        Err(e) => {
            warn!("artist lookup for {} failed: {:#}", primary.name, e);
            None
        }
    }
}

/// Print a console line above the progress bar; with `--quiet` the bar
/// is hidden and the line goes straight to stdout.
fn say(bar: &ProgressBar, msg: impl AsRef<str>) {
    if bar.is_hidden() {
        println!("{}", msg.as_ref());
    } else {
        bar.println(msg);
    }
}

/// Console lines truncate long titles and paths.
fn ellipsize(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max).collect();
        format!("{}...", cut)
    }
}
