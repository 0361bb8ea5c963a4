//! Player event bus
//!
//! One-to-many broadcasting over `tokio::sync::broadcast`. The transport emits
//! events as side effects of command handling; subscribers are the SSE stream,
//! the terminal front end, and the session shutdown future in `main`.

use serde::Serialize;
use tokio::sync::broadcast;

/// Events emitted by the transport during a playback session
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum PlayerEvent {
    /// A track was loaded and started
    TrackStarted { file: String, info: String },

    /// Playback paused by a front end
    PlaybackPaused,

    /// Playback resumed by a front end
    PlaybackResumed,

    /// The current track was restarted from position 0
    TrackRestarted { file: String },

    /// Master volume changed
    VolumeChanged { volume: f32 },

    /// The watchdog forced a skip off a frozen track
    StallRecovered { file: String },

    /// Periodic position report while the session is live
    PlaybackProgress {
        position_ms: i64,
        volume: f32,
        playing: bool,
    },

    /// The session is over (stop command or exhausted track list);
    /// no further commands are valid
    SessionEnded,
}

impl PlayerEvent {
    /// Event name used for the SSE `event:` field
    pub fn event_type(&self) -> &'static str {
        match self {
            PlayerEvent::TrackStarted { .. } => "track_started",
            PlayerEvent::PlaybackPaused => "playback_paused",
            PlayerEvent::PlaybackResumed => "playback_resumed",
            PlayerEvent::TrackRestarted { .. } => "track_restarted",
            PlayerEvent::VolumeChanged { .. } => "volume_changed",
            PlayerEvent::StallRecovered { .. } => "stall_recovered",
            PlayerEvent::PlaybackProgress { .. } => "playback_progress",
            PlayerEvent::SessionEnded => "session_ended",
        }
    }
}

/// Broadcast bus for [`PlayerEvent`]
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<PlayerEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Broadcast an event, ignoring the no-receivers case
    pub fn emit(&self, event: PlayerEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(100)
    }
}
