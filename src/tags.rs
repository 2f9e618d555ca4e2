// Tag writing: everything about the container format (ID3v2 for MP3,
// Vorbis comments for FLAC) is delegated to lofty. This module only
// maps catalog metadata onto the generic tag fields and embeds the
// cover as a front-cover picture.

use anyhow::{Context, Result};
use lofty::config::WriteOptions;
use lofty::picture::{MimeType, Picture, PictureType};
use lofty::prelude::{Accessor, AudioFile, TaggedFileExt};
use lofty::tag::Tag;
use std::path::Path;
use tracing::debug;

/// Metadata destined for one file.
#[derive(Debug, Clone)]
pub struct TrackTags {
    pub title: String,
    pub artists: Vec<String>,
    pub album: String,
    pub track_number: Option<u32>,
    pub genre: Option<String>,
    pub year: Option<u32>,
    /// Raw image bytes; the mime type is sniffed from the data.
    pub cover: Option<Vec<u8>>,
}

/// Returns whether the file already carries a front-cover picture.
pub fn has_front_cover(path: &Path) -> Result<bool> {
    let tagged = lofty::read_from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) else {
        return Ok(false);
    };
    Ok(tag
        .pictures()
        .iter()
        .any(|p| p.pic_type() == PictureType::CoverFront))
}

/// Write `tags` into the file at `path`, creating a tag of the format's
/// primary type when none exists. Metadata fields are always imposed;
/// an existing front cover is only swapped out when `replace_cover` is
/// set, otherwise it is left alone.
pub fn write_tags(path: &Path, tags: &TrackTags, replace_cover: bool) -> Result<()> {
    let mut tagged = lofty::read_from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let tag = match tagged.primary_tag_mut() {
        Some(tag) => tag,
        None => {
            let tag_type = tagged.primary_tag_type();
            debug!("no existing tag in {}, creating {:?}", path.display(), tag_type);
            tagged.insert_tag(Tag::new(tag_type));
            tagged.primary_tag_mut().unwrap()
        }
    };

    tag.set_title(tags.title.clone());
    tag.set_artist(tags.artists.join(", "));
    tag.set_album(tags.album.clone());
    if let Some(n) = tags.track_number {
        tag.set_track(n);
    }
    if let Some(genre) = &tags.genre {
        tag.set_genre(genre.clone());
    }
    if let Some(year) = tags.year {
        tag.set_year(year);
    }

    if let Some(data) = &tags.cover {
        let existing = tag
            .pictures()
            .iter()
            .any(|p| p.pic_type() == PictureType::CoverFront);
        if existing && replace_cover {
            tag.remove_picture_type(PictureType::CoverFront);
        }
        if !existing || replace_cover {
            let mime = sniff_image_mime(data);
            tag.push_picture(Picture::new_unchecked(
                PictureType::CoverFront,
                Some(mime),
                Some("Cover".to_string()),
                data.clone(),
            ));
        }
    }

    tagged
        .save_to_path(path, WriteOptions::default())
        .with_context(|| format!("Failed to write tags to {}", path.display()))?;
    Ok(())
}

/// Catalog release dates come as "YYYY", "YYYY-MM" or "YYYY-MM-DD";
/// the year is the leading four digits.
pub fn year_from_release_date(date: &str) -> Option<u32> {
    let head = date.get(..4)?;
    if !head.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    head.parse().ok()
}

/// Sniff the image mime from magic bytes. Catalogs serve JPEG almost
/// exclusively, so that is also the fallback.
fn sniff_image_mime(bytes: &[u8]) -> MimeType {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return MimeType::Jpeg;
    }
    if bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return MimeType::Png;
    }
    MimeType::Jpeg
}
