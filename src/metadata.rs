//! Track metadata extraction
//!
//! Reads tags and audio properties with lofty. Tag lookup failure is never
//! fatal to the display path: `song_info` degrades to the filename stem.
//! The sample rate, however, gates playback — a file whose properties cannot
//! be read is treated as unplayable and skipped by the transport.

use std::path::Path;

use lofty::prelude::{Accessor, AudioFile, TaggedFileExt};
use tracing::debug;

use crate::error::{Error, Result};

/// Tags and properties for one track
#[derive(Debug, Clone, Default)]
pub struct TrackInfo {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub track: Option<u32>,
    pub track_total: Option<u32>,
    pub sample_rate: Option<u32>,
}

impl TrackInfo {
    /// Read tags and properties from a file.
    ///
    /// Fails with [`Error::MetadataUnavailable`] when the file cannot be
    /// probed at all (not an audio file, unreadable, corrupt container).
    pub fn read(path: &Path) -> Result<Self> {
        let tagged_file = lofty::read_from_path(path).map_err(|e| Error::MetadataUnavailable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let tag = tagged_file.primary_tag().or(tagged_file.first_tag());
        let properties = tagged_file.properties();

        Ok(Self {
            title: tag.and_then(|t| t.title().map(|s| s.to_string())),
            artist: tag.and_then(|t| t.artist().map(|s| s.to_string())),
            album: tag.and_then(|t| t.album().map(|s| s.to_string())),
            track: tag.and_then(|t| t.track()),
            track_total: tag.and_then(|t| t.track_total()),
            sample_rate: properties.sample_rate(),
        })
    }

    /// Human-readable description of the track.
    ///
    /// Makes several attempts at picking fewer tags before finally falling
    /// back to the filename.
    pub fn display_line(&self, path: &Path) -> String {
        let Some(title) = self.title.as_deref() else {
            return file_stem_name(path);
        };
        match (&self.artist, &self.album, self.track) {
            (Some(artist), Some(album), Some(_)) => {
                format!(
                    "{} by {}, track {} from the album {}.",
                    title,
                    artist,
                    self.track_number(),
                    album
                )
            }
            (Some(artist), _, _) => format!("{} by {}", title, artist),
            _ => title.to_string(),
        }
    }

    /// The track number, with the total when it is known
    fn track_number(&self) -> String {
        match (self.track, self.track_total) {
            (Some(n), Some(total)) => format!("{} out of {}", n, total),
            (Some(n), None) => n.to_string(),
            _ => String::new(),
        }
    }
}

/// Describe a track, degrading to the filename when tags are unreadable.
pub fn describe(path: &Path) -> String {
    match TrackInfo::read(path) {
        Ok(info) => info.display_line(path),
        Err(e) => {
            debug!("tag lookup failed, using filename: {}", e);
            file_stem_name(path)
        }
    }
}

/// The filename without its path or extension
pub fn file_stem_name(path: &Path) -> String {
    path.file_stem()
        .or_else(|| path.file_name())
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}
