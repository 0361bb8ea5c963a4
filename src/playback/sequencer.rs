//! Shuffled track sequencer
//!
//! Enumerates every regular file under the shuffle folder, applies one uniform
//! random permutation, and exposes a cursor with forward/back navigation. The
//! order is fixed for the lifetime of the session: a true shuffle with no
//! repeats, so a fully-played list ends the session rather than wrapping.
//!
//! The cursor is "one past the last returned track": `current()` is
//! `tracks[cursor - 1]` and is an error until the first `advance()`.

use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Get a list of all regular files in a folder and its subfolders.
///
/// A readable non-directory path yields that single file (single-file mode).
fn list_recursively(root: &Path) -> Result<Vec<PathBuf>> {
    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }
    if !root.is_dir() {
        return Err(Error::InvalidFolder(root.to_path_buf()));
    }
    // Probe readability up front so an unreadable directory fails at
    // construction instead of producing an empty shuffle.
    std::fs::read_dir(root).map_err(|_| Error::InvalidFolder(root.to_path_buf()))?;

    let files = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect();
    Ok(files)
}

/// All of the files in the shuffle folder, in a shuffled order
#[derive(Debug)]
pub struct Sequencer {
    tracks: Vec<PathBuf>,
    cursor: usize,
}

impl Sequencer {
    /// Enumerate and shuffle the folder. Fails with [`Error::InvalidFolder`]
    /// if `root` is neither a readable directory nor a file.
    pub fn new(root: &Path) -> Result<Self> {
        let mut tracks = list_recursively(root)?;
        tracks.shuffle(&mut rand::thread_rng());
        debug!("shuffled {} tracks under {}", tracks.len(), root.display());
        Ok(Self { tracks, cursor: 0 })
    }

    /// Move to the next track and return it; [`Error::Exhausted`] at the end
    /// of the list (no wraparound).
    pub fn advance(&mut self) -> Result<&Path> {
        if self.cursor < self.tracks.len() {
            self.cursor += 1;
            Ok(&self.tracks[self.cursor - 1])
        } else {
            Err(Error::Exhausted)
        }
    }

    /// Move back to the prior track and return it.
    ///
    /// Fails with [`Error::AtStart`] when there is no prior track to return
    /// to; that includes the first track, since retreating off it would leave
    /// the cursor with no current track.
    pub fn retreat(&mut self) -> Result<&Path> {
        if self.cursor > 1 {
            self.cursor -= 1;
            Ok(&self.tracks[self.cursor - 1])
        } else {
            Err(Error::AtStart)
        }
    }

    /// The track at the cursor, without moving it.
    pub fn current(&self) -> Result<&Path> {
        if self.cursor == 0 {
            Err(Error::NotStarted)
        } else {
            Ok(&self.tracks[self.cursor - 1])
        }
    }

    /// One-position lookahead; `None` at the end of the list.
    pub fn future(&self) -> Option<&Path> {
        self.tracks.get(self.cursor).map(PathBuf::as_path)
    }

    /// One-position lookbehind; `None` before the second track.
    pub fn past(&self) -> Option<&Path> {
        if self.cursor >= 2 {
            self.tracks.get(self.cursor - 2).map(PathBuf::as_path)
        } else {
            None
        }
    }

    /// Number of tracks in the shuffle
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Cursor position (tracks returned so far)
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// All tracks in shuffled order
    pub fn tracks(&self) -> &[PathBuf] {
        &self.tracks
    }
}
