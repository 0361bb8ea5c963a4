//! Audio playback engine boundary
//!
//! The transport drives playback through [`AudioBackend`], a deliberately
//! small surface over an opaque engine: load a resource, start/pause/stop it,
//! seek to the start, report elapsed position, accept a volume. Decode and
//! mixing internals live behind this trait and are not this crate's concern.

use std::path::Path;

use crate::error::Result;

pub mod output;

pub use output::RodioBackend;

/// Elapsed-position sentinel: no resource loaded or the stream has ended.
/// Callers must treat this as "needs a skip", never as a valid time.
pub const POSITION_UNAVAILABLE: i64 = -1;

/// Single-resource playback engine
pub trait AudioBackend: Send {
    /// Load a resource and start playing it from the beginning.
    /// Fails with [`crate::Error::EngineRejected`] for unsupported or corrupt
    /// files; the previous resource is discarded either way.
    fn load(&mut self, path: &Path) -> Result<()>;

    fn pause(&mut self);

    fn resume(&mut self);

    /// Stop and discard the current resource
    fn stop(&mut self);

    /// Seek the current resource back to position 0
    fn seek_to_start(&mut self) -> Result<()>;

    /// Elapsed playback position in whole milliseconds, or
    /// [`POSITION_UNAVAILABLE`]
    fn position_ms(&mut self) -> i64;

    /// Apply a volume level in `[0.0, 1.0]`
    fn set_volume(&mut self, volume: f32);
}
