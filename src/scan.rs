// File discovery: collects the audio files a run will process and
// derives the best-guess song title from each filename.

use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Formats the tag-writing library supports for this tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupportedFormat {
    Mp3,
    Flac,
}

impl SupportedFormat {
    /// Match on the file extension, case-insensitively.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "mp3" => Some(SupportedFormat::Mp3),
            "flac" => Some(SupportedFormat::Flac),
            _ => None,
        }
    }
}

/// Collect supported audio files under `folder`, sorted for a
/// deterministic processing order. Unless `recursive` is set only the
/// folder itself is listed.
pub fn scan(folder: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    anyhow::ensure!(folder.is_dir(), "{} is not a directory", folder.display());

    let walker = if recursive {
        WalkDir::new(folder)
    } else {
        WalkDir::new(folder).max_depth(1)
    };

    let mut files = Vec::new();
    for entry in walker.into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if SupportedFormat::from_path(path).is_some() {
            files.push(path.to_path_buf());
        } else {
            debug!("skipping unsupported file {}", path.display());
        }
    }
    files.sort();
    Ok(files)
}

/// The filename stem is the best guess for the song title; the catalog
/// search (plus the manual retype fallback) does the rest.
pub fn song_title_from_path(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_fake_library(dir: &TempDir) {
        fs::write(dir.path().join("Mysterons.mp3"), b"FAKE").unwrap();
        fs::write(dir.path().join("Kitchen Sink.FLAC"), b"FAKE").unwrap();
        fs::write(dir.path().join("notes.txt"), b"FAKE").unwrap();
        fs::write(dir.path().join("cover.jpg"), b"FAKE").unwrap();

        let sub = dir.path().join("b-sides");
        fs::create_dir_all(&sub).unwrap();
        fs::write(sub.join("Roads.flac"), b"FAKE").unwrap();
    }

    #[test]
    fn scan_finds_supported_files_in_folder() {
        let tmp = TempDir::new().unwrap();
        create_fake_library(&tmp);
        let files = scan(tmp.path(), false).unwrap();
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn scan_descends_when_recursive() {
        let tmp = TempDir::new().unwrap();
        create_fake_library(&tmp);
        let files = scan(tmp.path(), true).unwrap();
        assert_eq!(files.len(), 3);
        assert!(files.iter().any(|p| p.ends_with("b-sides/Roads.flac")));
    }

    #[test]
    fn scan_output_is_sorted() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("b.mp3"), b"FAKE").unwrap();
        fs::write(tmp.path().join("a.mp3"), b"FAKE").unwrap();
        fs::write(tmp.path().join("c.mp3"), b"FAKE").unwrap();
        let files = scan(tmp.path(), false).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, ["a.mp3", "b.mp3", "c.mp3"]);
    }

    #[test]
    fn scan_rejects_missing_folder() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope");
        assert!(scan(&missing, false).is_err());
    }

    #[test]
    fn format_matches_extension_case_insensitively() {
        assert_eq!(
            SupportedFormat::from_path(Path::new("x/y/Song.Mp3")),
            Some(SupportedFormat::Mp3)
        );
        assert_eq!(
            SupportedFormat::from_path(Path::new("Song.FLAC")),
            Some(SupportedFormat::Flac)
        );
        assert_eq!(SupportedFormat::from_path(Path::new("Song.ogg")), None);
        assert_eq!(SupportedFormat::from_path(Path::new("Song")), None);
    }

    #[test]
    fn title_is_the_filename_stem() {
        assert_eq!(
            song_title_from_path(Path::new("/music/What a Wonderful World.mp3")),
            "What a Wonderful World"
        );
        assert_eq!(
            song_title_from_path(Path::new("Sade - Smooth Operator.flac")),
            "Sade - Smooth Operator"
        );
    }
}
