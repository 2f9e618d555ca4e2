// Command line arguments.

use clap::Parser;
use std::path::PathBuf;

/// tunetag - batch-tag audio files from a music catalog
///
/// Scans a folder for MP3/FLAC files, matches each one against the
/// catalog by its filename, and writes title, artist, album, track
/// number, genre, year and the album cover into the file.
#[derive(Parser, Debug)]
#[command(name = "tunetag", version, about, long_about = None)]
#[command(
    after_help = "Catalog credentials are read from the CLIENT_ID and CLIENT_SECRET \
environment variables; a .env file in the working directory is honored."
)]
pub struct Cli {
    /// Folder to scan for audio files
    #[arg(value_name = "FOLDER", default_value = ".")]
    pub folder: PathBuf,

    /// Scan subdirectories recursively
    #[arg(short, long)]
    pub recursive: bool,

    /// Replace existing cover images without asking
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Leave files that already have a cover image untouched
    #[arg(long, conflicts_with = "yes")]
    pub skip_existing: bool,

    /// Artist name attached to every search query
    #[arg(long, value_name = "NAME")]
    pub artist: Option<String>,

    /// Suppress the progress bar
    #[arg(short, long)]
    pub quiet: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_to_current_directory() {
        let cli = Cli::parse_from(["tunetag"]);
        assert_eq!(cli.folder, PathBuf::from("."));
        assert!(!cli.recursive);
        assert!(!cli.yes);
        assert!(!cli.skip_existing);
    }

    #[test]
    fn yes_conflicts_with_skip_existing() {
        let res = Cli::try_parse_from(["tunetag", "--yes", "--skip-existing"]);
        assert!(res.is_err());
    }
}
