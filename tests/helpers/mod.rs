//! Shared test helpers: a scripted audio backend and track fixtures
#![allow(dead_code)]

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tempfile::TempDir;

use shufflebox::audio::AudioBackend;
use shufflebox::error::{Error, Result};
use shufflebox::events::EventBus;
use shufflebox::playback::{Sequencer, SharedTransport, Transport};

#[derive(Default)]
struct BackendState {
    loaded: Vec<PathBuf>,
    position: i64,
    volume: f32,
    seeks: u32,
    reject: HashSet<String>,
}

/// Scripted stand-in for the audio engine; cloneable handle so tests can
/// inspect and steer it after the transport takes ownership
#[derive(Clone, Default)]
pub struct ScriptedBackend(Arc<Mutex<BackendState>>);

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_position(&self, ms: i64) {
        self.0.lock().unwrap().position = ms;
    }

    pub fn reject(&self, file_name: &str) {
        self.0.lock().unwrap().reject.insert(file_name.to_string());
    }

    pub fn loaded(&self) -> Vec<PathBuf> {
        self.0.lock().unwrap().loaded.clone()
    }

    pub fn seeks(&self) -> u32 {
        self.0.lock().unwrap().seeks
    }

    pub fn volume(&self) -> f32 {
        self.0.lock().unwrap().volume
    }
}

impl AudioBackend for ScriptedBackend {
    fn load(&mut self, path: &Path) -> Result<()> {
        let mut state = self.0.lock().unwrap();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        if state.reject.contains(&name) {
            return Err(Error::EngineRejected {
                path: path.to_path_buf(),
                reason: "scripted rejection".to_string(),
            });
        }
        state.loaded.push(path.to_path_buf());
        state.position = 0;
        Ok(())
    }

    fn pause(&mut self) {}

    fn resume(&mut self) {}

    fn stop(&mut self) {}

    fn seek_to_start(&mut self) -> Result<()> {
        let mut state = self.0.lock().unwrap();
        state.seeks += 1;
        state.position = 0;
        Ok(())
    }

    fn position_ms(&mut self) -> i64 {
        self.0.lock().unwrap().position
    }

    fn set_volume(&mut self, volume: f32) {
        self.0.lock().unwrap().volume = volume;
    }
}

/// Write a small valid WAV file so tag probing finds a sample rate
pub fn write_wav(path: &Path) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 44100,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for i in 0..441 {
        writer
            .write_sample(((i as f32 * 0.1).sin() * 5000.0) as i16)
            .unwrap();
    }
    writer.finalize().unwrap();
}

/// A temp folder holding WAV fixtures with the given names
pub fn music_folder(names: &[&str]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for name in names {
        write_wav(&dir.path().join(name));
    }
    dir
}

/// A started transport over the folder, with its backend handle and bus
pub fn started_transport(dir: &TempDir) -> (SharedTransport, ScriptedBackend, EventBus) {
    let backend = ScriptedBackend::new();
    let events = EventBus::new(64);
    let mut transport = Transport::new(
        Sequencer::new(dir.path()).unwrap(),
        Box::new(backend.clone()),
        events.clone(),
        5,
        0.75,
    );
    transport.start().unwrap();
    (
        Arc::new(tokio::sync::Mutex::new(transport)),
        backend,
        events,
    )
}
