//! Transport controller
//!
//! The single owner of mutable playback state: one active track, the paused
//! flag, the clamped volume, and the stall watchdog. Drives the sequencer and
//! the audio backend together and exposes the command surface used by every
//! front end.
//!
//! Error policy: unplayable tracks (engine rejection, unreadable properties)
//! are absorbed by skipping to the next candidate; `previous` at the start of
//! the list degrades to a restart. Only an exhausted track list ends the
//! session, and it does so for every caller.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::audio::{AudioBackend, POSITION_UNAVAILABLE};
use crate::error::{Error, Result};
use crate::events::{EventBus, PlayerEvent};
use crate::metadata::{self, TrackInfo};
use crate::playback::sequencer::Sequencer;
use crate::playback::watchdog::StallWatchdog;

/// Volume change applied by one volume_up/volume_down step
pub const VOLUME_STEP: f32 = 0.05;

/// Below this elapsed time, `previous` restarts the current track instead of
/// moving the cursor back
pub const PREVIOUS_RESTART_WINDOW_MS: i64 = 5000;

/// A transport shared between front ends and the monitor tasks; all mutation
/// is serialized through this one lock
pub type SharedTransport = Arc<tokio::sync::Mutex<Transport>>;

/// Screen coordinates for one line of display text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TextPosition {
    pub x: u16,
    pub y: u16,
}

pub struct Transport {
    sequencer: Sequencer,
    backend: Box<dyn AudioBackend>,
    events: EventBus,
    watchdog: StallWatchdog,
    active_track: Option<PathBuf>,
    paused: bool,
    stopped: bool,
    volume: f32,
}

impl Transport {
    pub fn new(
        sequencer: Sequencer,
        backend: Box<dyn AudioBackend>,
        events: EventBus,
        stall_threshold: u32,
        initial_volume: f32,
    ) -> Self {
        Self {
            sequencer,
            backend,
            events,
            watchdog: StallWatchdog::new(stall_threshold),
            active_track: None,
            paused: false,
            stopped: false,
            volume: initial_volume.clamp(0.0, 1.0),
        }
    }

    /// Draw the first track and begin playback. Called once per session.
    pub fn start(&mut self) -> Result<()> {
        self.advance_or_fail()?;
        self.begin_playback()
    }

    /// Advance the sequencer, ending the session on exhaustion
    fn advance_or_fail(&mut self) -> Result<()> {
        match self.sequencer.advance() {
            Ok(_) => Ok(()),
            Err(e) => Err(self.fail_session(e)),
        }
    }

    /// Load the sequencer's current track into the backend and start it.
    ///
    /// A rejected resource or a track without usable audio properties is
    /// recoverable: advance and try the next candidate. The loop is bounded
    /// by a visited count equal to the playlist length; in practice the
    /// sequencer exhausts first, which is fatal for the session.
    pub fn begin_playback(&mut self) -> Result<()> {
        if self.stopped {
            return Ok(());
        }
        let mut attempts = 0usize;
        let limit = self.sequencer.len();
        loop {
            let track = self.sequencer.current()?.to_path_buf();
            match self.try_start(&track) {
                Ok(info) => {
                    self.active_track = Some(track.clone());
                    self.paused = false;
                    self.watchdog.reset();
                    self.events.emit(PlayerEvent::TrackStarted {
                        file: track.display().to_string(),
                        info: info.display_line(&track),
                    });
                    return Ok(());
                }
                Err(err) if err.is_recoverable() => {
                    info!("skipping unplayable track {}: {}", track.display(), err);
                    attempts += 1;
                    if attempts >= limit {
                        return Err(self.fail_session(Error::Exhausted));
                    }
                    self.advance_or_fail()?;
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn try_start(&mut self, track: &Path) -> Result<TrackInfo> {
        let info = TrackInfo::read(track)?;
        if info.sample_rate.is_none() {
            return Err(Error::MetadataUnavailable {
                path: track.to_path_buf(),
                reason: "unable to determine sample rate".to_string(),
            });
        }
        debug!("attempting to begin playback of {}", track.display());
        self.backend.load(track)?;
        self.backend.set_volume(self.volume);
        Ok(info)
    }

    /// Skip to the next track. An exhausted list ends the session.
    pub fn skip(&mut self) -> Result<()> {
        if self.stopped {
            return Ok(());
        }
        debug!(
            "skip: current {:?}, next {:?}",
            self.sequencer.current().ok(),
            self.sequencer.future()
        );
        self.advance_or_fail()?;
        self.begin_playback()
    }

    /// Go back to the previous track, or restart the current one.
    ///
    /// Within the first five seconds of a track this restarts it; past that
    /// it moves the cursor back, degrading to a restart at the start of the
    /// list. Never fails at this level.
    pub fn previous(&mut self) -> Result<()> {
        if self.stopped {
            return Ok(());
        }
        if self.current_position() < PREVIOUS_RESTART_WINDOW_MS {
            return self.restart();
        }
        match self.sequencer.retreat() {
            Ok(_) => self.begin_playback(),
            Err(Error::AtStart) => self.restart(),
            Err(e) => Err(e),
        }
    }

    /// Restart the currently playing track from position 0
    pub fn restart(&mut self) -> Result<()> {
        if self.stopped {
            return Ok(());
        }
        if self.backend.seek_to_start().is_err() {
            // The stream is beyond seeking; reload the track instead.
            return self.begin_playback();
        }
        self.watchdog.reset();
        if let Some(track) = &self.active_track {
            self.events.emit(PlayerEvent::TrackRestarted {
                file: track.display().to_string(),
            });
        }
        Ok(())
    }

    /// Pause playing playback, or unpause if paused
    pub fn pause_unpause(&mut self) -> Result<()> {
        if self.stopped {
            return Ok(());
        }
        if self.paused {
            debug!("resuming playback");
            self.backend.resume();
            self.paused = false;
            self.events.emit(PlayerEvent::PlaybackResumed);
        } else {
            debug!("pausing playback at {} ms", self.current_position());
            self.backend.pause();
            self.paused = true;
            self.events.emit(PlayerEvent::PlaybackPaused);
        }
        Ok(())
    }

    pub fn volume_up(&mut self) -> Result<()> {
        self.set_volume(self.volume + VOLUME_STEP);
        Ok(())
    }

    pub fn volume_down(&mut self) -> Result<()> {
        self.set_volume(self.volume - VOLUME_STEP);
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        self.backend.set_volume(self.volume);
        self.events.emit(PlayerEvent::VolumeChanged {
            volume: self.volume,
        });
    }

    /// Stop playback and end the session; no further commands are valid.
    pub fn stop(&mut self) -> Result<()> {
        if !self.stopped {
            debug!("stopping and exiting");
            self.backend.stop();
            self.stopped = true;
            self.events.emit(PlayerEvent::SessionEnded);
        }
        Ok(())
    }

    /// Mark the session over on a fatal sequencer failure
    fn fail_session(&mut self, err: Error) -> Error {
        if matches!(err, Error::Exhausted) && !self.stopped {
            info!("track list has been exhausted, ending session");
            self.backend.stop();
            self.stopped = true;
            self.events.emit(PlayerEvent::SessionEnded);
        }
        err
    }

    // ------------------------------------------------------------------
    // Watchdog orchestration
    // ------------------------------------------------------------------

    /// Feed one position sample to the stall watchdog. Detection is disabled
    /// while paused (a deliberately paused track is not frozen) and after the
    /// session ends.
    pub fn stall_check(&mut self, position_ms: i64) -> bool {
        if self.paused || self.stopped {
            return false;
        }
        self.watchdog.check(position_ms)
    }

    /// Corrective skip off a dead or frozen track: skip, begin playback,
    /// reset the watchdog — in that order.
    pub fn recover(&mut self) -> Result<()> {
        let from = self.active_track.clone();
        self.skip()?;
        self.watchdog.reset();
        if let Some(track) = from {
            self.events.emit(PlayerEvent::StallRecovered {
                file: track.display().to_string(),
            });
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Query surface
    // ------------------------------------------------------------------

    /// Elapsed playback position in ms, or -1 when nothing is playing.
    /// -1 means the track needs a skip, never a valid elapsed time.
    pub fn current_position(&mut self) -> i64 {
        if self.stopped || self.active_track.is_none() {
            return POSITION_UNAVAILABLE;
        }
        self.backend.position_ms()
    }

    pub fn current_volume(&self) -> f32 {
        self.volume
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_playing(&self) -> bool {
        !self.paused && !self.stopped && self.active_track.is_some()
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Path of the track currently loaded into the backend
    pub fn current_file(&self) -> Option<&Path> {
        self.active_track.as_deref()
    }

    /// Display string for the current track, falling back to the filename
    /// when tags are unreadable
    pub fn song_info(&self) -> String {
        match &self.active_track {
            Some(track) => metadata::describe(track),
            None => String::new(),
        }
    }

    /// Compose the text to display and where to display it: the song info
    /// word-wrapped to one third of the width and centered, an elapsed-time
    /// readout bottom-left, and a volume readout bottom-right.
    pub fn displayed_text(&mut self, max_columns: u16, max_lines: u16) -> HashMap<String, TextPosition> {
        let mut text = HashMap::new();

        let song_lines = wrap_text(&self.song_info(), (max_columns / 3).max(1) as usize);
        let block_top = (max_lines as usize).saturating_sub(song_lines.len()) / 2;
        for (lineno, line) in song_lines.into_iter().enumerate() {
            let x = (max_columns as usize).saturating_sub(line.len()) / 2;
            text.insert(
                line,
                TextPosition {
                    x: x as u16,
                    y: (block_top + lineno).min(max_lines.saturating_sub(1) as usize) as u16,
                },
            );
        }

        let seconds = self.current_position().max(0) / 1000;
        text.insert(
            format!("{} seconds", seconds),
            TextPosition {
                x: 2,
                y: max_lines.saturating_sub(1),
            },
        );
        text.insert(
            format!("VOL: {:.1}%", self.volume * 100.0),
            TextPosition {
                x: max_columns.saturating_sub(17),
                y: max_lines.saturating_sub(1),
            },
        );
        text
    }
}

/// Greedy word wrap; a word longer than `width` gets its own line.
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        if line.is_empty() {
            line.push_str(word);
        } else if line.len() + 1 + word.len() <= width {
            line.push(' ');
            line.push_str(word);
        } else {
            lines.push(std::mem::take(&mut line));
            line.push_str(word);
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::fs;
    use tempfile::TempDir;

    /// Backend double: records calls, scripts positions and rejections
    struct FakeBackend {
        loaded: Vec<PathBuf>,
        position: i64,
        volume: f32,
        seeks: u32,
        stopped: bool,
        reject: HashSet<String>,
    }

    impl FakeBackend {
        fn new() -> Self {
            Self {
                loaded: Vec::new(),
                position: 0,
                volume: 1.0,
                seeks: 0,
                stopped: false,
                reject: HashSet::new(),
            }
        }
    }

    /// Shared handle so tests can script the backend after the transport
    /// takes ownership
    #[derive(Clone)]
    struct FakeHandle(Arc<std::sync::Mutex<FakeBackend>>);

    impl FakeHandle {
        fn new() -> Self {
            Self(Arc::new(std::sync::Mutex::new(FakeBackend::new())))
        }

        fn set_position(&self, ms: i64) {
            self.0.lock().unwrap().position = ms;
        }

        fn reject(&self, file_name: &str) {
            self.0.lock().unwrap().reject.insert(file_name.to_string());
        }

        fn loaded(&self) -> Vec<PathBuf> {
            self.0.lock().unwrap().loaded.clone()
        }

        fn seeks(&self) -> u32 {
            self.0.lock().unwrap().seeks
        }

        fn volume(&self) -> f32 {
            self.0.lock().unwrap().volume
        }
    }

    impl AudioBackend for FakeHandle {
        fn load(&mut self, path: &Path) -> Result<()> {
            let mut inner = self.0.lock().unwrap();
            let name = path.file_name().unwrap().to_string_lossy().to_string();
            if inner.reject.contains(&name) {
                return Err(Error::EngineRejected {
                    path: path.to_path_buf(),
                    reason: "scripted rejection".to_string(),
                });
            }
            inner.loaded.push(path.to_path_buf());
            inner.position = 0;
            Ok(())
        }

        fn pause(&mut self) {}

        fn resume(&mut self) {}

        fn stop(&mut self) {
            self.0.lock().unwrap().stopped = true;
        }

        fn seek_to_start(&mut self) -> Result<()> {
            let mut inner = self.0.lock().unwrap();
            inner.seeks += 1;
            inner.position = 0;
            Ok(())
        }

        fn position_ms(&mut self) -> i64 {
            self.0.lock().unwrap().position
        }

        fn set_volume(&mut self, volume: f32) {
            self.0.lock().unwrap().volume = volume;
        }
    }

    fn write_wav(path: &Path) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 44100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for i in 0..441 {
            writer.write_sample(((i as f32 * 0.1).sin() * 5000.0) as i16).unwrap();
        }
        writer.finalize().unwrap();
    }

    fn music_folder(names: &[&str]) -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        for name in names {
            write_wav(&dir.path().join(name));
        }
        dir
    }

    fn transport_over(dir: &TempDir) -> (Transport, FakeHandle) {
        let handle = FakeHandle::new();
        let transport = Transport::new(
            Sequencer::new(dir.path()).unwrap(),
            Box::new(handle.clone()),
            EventBus::new(16),
            5,
            0.75,
        );
        (transport, handle)
    }

    #[test]
    fn start_loads_the_first_track() {
        let dir = music_folder(&["a.wav", "b.wav"]);
        let (mut transport, handle) = transport_over(&dir);
        transport.start().unwrap();
        assert_eq!(handle.loaded().len(), 1);
        assert!(transport.is_playing());
        assert_eq!(transport.current_file(), Some(handle.loaded()[0].as_path()));
    }

    #[test]
    fn skip_through_three_tracks_then_exhausted_ends_the_session() {
        let dir = music_folder(&["a.wav", "b.wav", "c.wav"]);
        let (mut transport, _handle) = transport_over(&dir);
        transport.start().unwrap();
        transport.skip().unwrap();
        transport.skip().unwrap();
        assert!(matches!(transport.skip().unwrap_err(), Error::Exhausted));
        assert!(transport.is_stopped());
        // Further commands are no-ops, not errors.
        transport.skip().unwrap();
        transport.pause_unpause().unwrap();
    }

    #[test]
    fn previous_within_the_grace_window_restarts() {
        let dir = music_folder(&["a.wav", "b.wav"]);
        let (mut transport, handle) = transport_over(&dir);
        transport.start().unwrap();
        transport.skip().unwrap();

        handle.set_position(4999);
        transport.previous().unwrap();
        assert_eq!(handle.seeks(), 1);
        assert_eq!(handle.loaded().len(), 2); // no reload, same track
    }

    #[test]
    fn previous_past_the_grace_window_returns_to_the_prior_track() {
        let dir = music_folder(&["a.wav", "b.wav"]);
        let (mut transport, handle) = transport_over(&dir);
        transport.start().unwrap();
        let first = handle.loaded()[0].clone();
        transport.skip().unwrap();

        handle.set_position(5000);
        transport.previous().unwrap();
        assert_eq!(handle.seeks(), 0);
        assert_eq!(handle.loaded().last().unwrap(), &first);
        assert_eq!(transport.current_file(), Some(first.as_path()));
    }

    #[test]
    fn previous_at_the_start_of_the_list_degrades_to_restart() {
        let dir = music_folder(&["a.wav"]);
        let (mut transport, handle) = transport_over(&dir);
        transport.start().unwrap();
        handle.set_position(60_000);
        transport.previous().unwrap();
        assert_eq!(handle.seeks(), 1);
        assert!(!transport.is_stopped());
    }

    #[test]
    fn volume_up_then_down_returns_to_the_prior_value() {
        let dir = music_folder(&["a.wav"]);
        let (mut transport, handle) = transport_over(&dir);
        transport.start().unwrap();
        let before = transport.current_volume();
        transport.volume_up().unwrap();
        transport.volume_down().unwrap();
        assert!((transport.current_volume() - before).abs() < f32::EPSILON);
        assert!((handle.volume() - before).abs() < f32::EPSILON);
    }

    #[test]
    fn volume_clamps_at_both_boundaries() {
        let dir = music_folder(&["a.wav"]);
        let (mut transport, _handle) = transport_over(&dir);
        transport.start().unwrap();
        for _ in 0..40 {
            transport.volume_up().unwrap();
        }
        assert_eq!(transport.current_volume(), 1.0);
        for _ in 0..40 {
            transport.volume_down().unwrap();
        }
        assert_eq!(transport.current_volume(), 0.0);
    }

    #[test]
    fn pause_unpause_toggles() {
        let dir = music_folder(&["a.wav"]);
        let (mut transport, _handle) = transport_over(&dir);
        transport.start().unwrap();
        assert!(transport.is_playing());
        transport.pause_unpause().unwrap();
        assert!(transport.is_paused());
        assert!(!transport.is_playing());
        transport.pause_unpause().unwrap();
        assert!(transport.is_playing());
    }

    #[test]
    fn rejected_tracks_are_skipped_during_begin_playback() {
        let dir = music_folder(&["a.wav", "b.wav", "c.wav"]);
        let (mut transport, handle) = transport_over(&dir);
        // Whatever shuffles first and second, reject them both.
        let mut order: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        order.sort();
        handle.reject(&order[0]);
        handle.reject(&order[1]);

        transport.start().unwrap();
        let played = transport.current_file().unwrap().file_name().unwrap();
        assert_eq!(played.to_string_lossy(), order[2]);
    }

    #[test]
    fn non_audio_files_are_skipped_during_begin_playback() {
        let dir = music_folder(&["a.wav"]);
        fs::write(dir.path().join("cover.txt"), b"not audio").unwrap();
        let (mut transport, _handle) = transport_over(&dir);
        transport.start().unwrap();
        assert_eq!(
            transport.current_file().unwrap().extension().unwrap(),
            "wav"
        );
    }

    #[test]
    fn all_tracks_unplayable_is_exhausted() {
        let dir = music_folder(&["a.wav", "b.wav"]);
        let (mut transport, handle) = transport_over(&dir);
        handle.reject("a.wav");
        handle.reject("b.wav");
        assert!(matches!(transport.start().unwrap_err(), Error::Exhausted));
        assert!(transport.is_stopped());
    }

    #[test]
    fn stall_check_trips_after_threshold_identical_samples() {
        let dir = music_folder(&["a.wav", "b.wav"]);
        let (mut transport, _handle) = transport_over(&dir);
        transport.start().unwrap();
        for _ in 0..4 {
            assert!(!transport.stall_check(1000));
        }
        assert!(transport.stall_check(1000));
    }

    #[test]
    fn stall_check_is_disabled_while_paused() {
        let dir = music_folder(&["a.wav"]);
        let (mut transport, _handle) = transport_over(&dir);
        transport.start().unwrap();
        transport.pause_unpause().unwrap();
        for _ in 0..20 {
            assert!(!transport.stall_check(1000));
        }
    }

    #[test]
    fn recover_skips_and_resets_the_watchdog() {
        let dir = music_folder(&["a.wav", "b.wav"]);
        let (mut transport, handle) = transport_over(&dir);
        transport.start().unwrap();
        for _ in 0..5 {
            transport.stall_check(1000);
        }
        transport.recover().unwrap();
        assert_eq!(handle.loaded().len(), 2);
        // A fresh run of stale samples is needed to trip again.
        for _ in 0..4 {
            assert!(!transport.stall_check(1000));
        }
        assert!(transport.stall_check(1000));
    }

    #[test]
    fn position_reports_the_sentinel_after_stop() {
        let dir = music_folder(&["a.wav"]);
        let (mut transport, handle) = transport_over(&dir);
        transport.start().unwrap();
        handle.set_position(1234);
        assert_eq!(transport.current_position(), 1234);
        transport.stop().unwrap();
        assert_eq!(transport.current_position(), POSITION_UNAVAILABLE);
    }

    #[test]
    fn displayed_text_places_the_fixed_readouts() {
        let dir = music_folder(&["a.wav"]);
        let (mut transport, handle) = transport_over(&dir);
        transport.start().unwrap();
        handle.set_position(42_500);

        let text = transport.displayed_text(80, 24);
        assert_eq!(text.get("42 seconds"), Some(&TextPosition { x: 2, y: 23 }));
        let vol = format!("VOL: {:.1}%", transport.current_volume() * 100.0);
        assert_eq!(text.get(&vol), Some(&TextPosition { x: 63, y: 23 }));
    }

    #[test]
    fn displayed_text_wraps_and_centers_the_song_info() {
        let dir = music_folder(&["a.wav"]);
        let (mut transport, _handle) = transport_over(&dir);
        transport.start().unwrap();

        let text = transport.displayed_text(60, 24);
        // Song info is the filename stem "a"; one centered line.
        let pos = text.get("a").expect("song info line present");
        assert_eq!(pos.x, (60 - 1) / 2);
    }

    #[test]
    fn wrap_text_honors_the_width() {
        let lines = wrap_text("one two three four five", 9);
        assert_eq!(lines, vec!["one two", "three", "four five"]);
        for line in &lines {
            assert!(line.len() <= 9);
        }
    }

    #[test]
    fn wrap_text_of_empty_input_is_empty() {
        assert!(wrap_text("", 10).is_empty());
    }
}
