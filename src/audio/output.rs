//! Rodio-backed audio output
//!
//! Runs the output stream and sink on a dedicated thread, accepting commands
//! over crossbeam channels. The stream must live on its own thread because
//! platform audio streams are not `Send`; the handle implements
//! [`AudioBackend`] by bridging calls into that thread.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use rodio::{Decoder, OutputStreamBuilder, Sink};
use tracing::{debug, warn};

use super::{AudioBackend, POSITION_UNAVAILABLE};
use crate::error::{Error, Result};

enum OutputCommand {
    Load(PathBuf, Sender<std::result::Result<(), String>>),
    Pause,
    Resume,
    Stop,
    SeekToStart(Sender<std::result::Result<(), String>>),
    Position(Sender<i64>),
    SetVolume(f32),
    Shutdown,
}

/// Handle to the audio output thread
pub struct RodioBackend {
    cmd_tx: Sender<OutputCommand>,
    thread: Option<JoinHandle<()>>,
}

impl RodioBackend {
    /// Open the default output device. Blocks until the stream is
    /// initialized on the output thread (or fails).
    pub fn new() -> Result<Self> {
        let (cmd_tx, cmd_rx) = unbounded::<OutputCommand>();
        let (init_tx, init_rx) = bounded::<std::result::Result<(), String>>(1);

        let thread = thread::Builder::new()
            .name("audio-output".to_string())
            .spawn(move || run(cmd_rx, init_tx))
            .map_err(|e| Error::AudioOutput(format!("failed to spawn audio thread: {}", e)))?;

        init_rx
            .recv()
            .map_err(|_| Error::AudioOutput("audio thread terminated during init".to_string()))?
            .map_err(Error::AudioOutput)?;

        Ok(Self {
            cmd_tx,
            thread: Some(thread),
        })
    }

    fn send(&self, cmd: OutputCommand) {
        let _ = self.cmd_tx.send(cmd);
    }
}

impl AudioBackend for RodioBackend {
    fn load(&mut self, path: &Path) -> Result<()> {
        let (reply_tx, reply_rx) = bounded(1);
        self.send(OutputCommand::Load(path.to_path_buf(), reply_tx));
        match reply_rx.recv() {
            Ok(Ok(())) => Ok(()),
            Ok(Err(reason)) => Err(Error::EngineRejected {
                path: path.to_path_buf(),
                reason,
            }),
            Err(_) => Err(Error::AudioOutput("audio thread is gone".to_string())),
        }
    }

    fn pause(&mut self) {
        self.send(OutputCommand::Pause);
    }

    fn resume(&mut self) {
        self.send(OutputCommand::Resume);
    }

    fn stop(&mut self) {
        self.send(OutputCommand::Stop);
    }

    fn seek_to_start(&mut self) -> Result<()> {
        let (reply_tx, reply_rx) = bounded(1);
        self.send(OutputCommand::SeekToStart(reply_tx));
        match reply_rx.recv() {
            Ok(Ok(())) => Ok(()),
            Ok(Err(reason)) => Err(Error::AudioOutput(reason)),
            Err(_) => Err(Error::AudioOutput("audio thread is gone".to_string())),
        }
    }

    fn position_ms(&mut self) -> i64 {
        let (reply_tx, reply_rx) = bounded(1);
        self.send(OutputCommand::Position(reply_tx));
        reply_rx.recv().unwrap_or(POSITION_UNAVAILABLE)
    }

    fn set_volume(&mut self, volume: f32) {
        self.send(OutputCommand::SetVolume(volume));
    }
}

impl Drop for RodioBackend {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(OutputCommand::Shutdown);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn open_decoder(path: &Path) -> std::result::Result<Decoder<BufReader<File>>, String> {
    let file = File::open(path).map_err(|e| e.to_string())?;
    Decoder::new(BufReader::new(file)).map_err(|e| e.to_string())
}

/// The output thread's main loop. The stream is created here because it may
/// not be moved across threads.
fn run(cmd_rx: Receiver<OutputCommand>, init_tx: Sender<std::result::Result<(), String>>) {
    let stream = match OutputStreamBuilder::from_default_device()
        .and_then(|builder| builder.open_stream_or_fallback())
    {
        Ok(s) => s,
        Err(e) => {
            let _ = init_tx.send(Err(format!("failed to open audio output: {}", e)));
            return;
        }
    };
    let _ = init_tx.send(Ok(()));

    let mut sink: Option<Sink> = None;
    let mut current: Option<PathBuf> = None;
    let mut volume: f32 = 1.0;
    let mut paused = false;

    while let Ok(cmd) = cmd_rx.recv() {
        match cmd {
            OutputCommand::Load(path, reply) => {
                let result = open_decoder(&path).map(|source| {
                    if let Some(old) = sink.take() {
                        old.stop();
                    }
                    let new_sink = Sink::connect_new(stream.mixer());
                    new_sink.set_volume(volume);
                    new_sink.append(source);
                    new_sink.play();
                    sink = Some(new_sink);
                    current = Some(path.clone());
                    paused = false;
                    debug!("loaded {}", path.display());
                });
                let _ = reply.send(result);
            }
            OutputCommand::Pause => {
                if let Some(ref s) = sink {
                    s.pause();
                    paused = true;
                }
            }
            OutputCommand::Resume => {
                if let Some(ref s) = sink {
                    s.play();
                    paused = false;
                }
            }
            OutputCommand::Stop => {
                if let Some(s) = sink.take() {
                    s.stop();
                }
                current = None;
                paused = false;
            }
            OutputCommand::SeekToStart(reply) => {
                let result = match sink.as_ref() {
                    Some(s) if s.try_seek(Duration::ZERO).is_ok() => Ok(()),
                    _ => {
                        // Seek unsupported or the stream already drained:
                        // reload the resource, preserving the paused state.
                        match current.clone() {
                            Some(path) => match open_decoder(&path) {
                                Ok(source) => {
                                    if let Some(old) = sink.take() {
                                        old.stop();
                                    }
                                    let new_sink = Sink::connect_new(stream.mixer());
                                    new_sink.set_volume(volume);
                                    new_sink.append(source);
                                    if paused {
                                        new_sink.pause();
                                    } else {
                                        new_sink.play();
                                    }
                                    sink = Some(new_sink);
                                    Ok(())
                                }
                                Err(e) => {
                                    warn!("reload for restart failed: {}", e);
                                    Err(e)
                                }
                            },
                            None => Err("no resource loaded".to_string()),
                        }
                    }
                };
                let _ = reply.send(result);
            }
            OutputCommand::Position(reply) => {
                let position = match sink.as_ref() {
                    Some(s) if !s.empty() => s.get_pos().as_millis() as i64,
                    _ => POSITION_UNAVAILABLE,
                };
                let _ = reply.send(position);
            }
            OutputCommand::SetVolume(v) => {
                volume = v;
                if let Some(ref s) = sink {
                    s.set_volume(volume);
                }
            }
            OutputCommand::Shutdown => break,
        }
    }

    if let Some(s) = sink.take() {
        s.stop();
    }
}
