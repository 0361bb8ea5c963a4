//! Symbolic command set and dispatch
//!
//! Every front end — the terminal key table and the HTTP route table —
//! resolves into this one command set and the single [`apply`] dispatch
//! point, so behavior is identical regardless of origin. The mapping is
//! total: an unrecognized command name parses to `None` and callers log and
//! ignore it.

use tracing::info;

use crate::error::{Error, Result};
use crate::playback::transport::Transport;

/// The playback control verbs exposed to front ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    PauseUnpause,
    Skip,
    Previous,
    Restart,
    VolumeUp,
    VolumeDown,
    Stop,
}

impl Command {
    /// All commands, in route-table order
    pub const ALL: [Command; 7] = [
        Command::PauseUnpause,
        Command::Skip,
        Command::Previous,
        Command::Restart,
        Command::VolumeUp,
        Command::VolumeDown,
        Command::Stop,
    ];

    /// The symbolic name used on the wire and in logs
    pub fn name(&self) -> &'static str {
        match self {
            Command::PauseUnpause => "pause_unpause",
            Command::Skip => "skip",
            Command::Previous => "previous",
            Command::Restart => "restart",
            Command::VolumeUp => "volume_up",
            Command::VolumeDown => "volume_down",
            Command::Stop => "stop",
        }
    }

    /// Resolve a symbolic name; `None` for anything unrecognized
    pub fn parse(name: &str) -> Option<Command> {
        Command::ALL.iter().copied().find(|c| c.name() == name)
    }
}

/// Apply one command to the transport.
///
/// Recoverable playback conditions are already absorbed inside the transport;
/// the only error that escapes is [`Error::Exhausted`], which callers report
/// as the end of the session rather than a failure.
pub fn apply(transport: &mut Transport, command: Command) -> Result<()> {
    match command {
        Command::PauseUnpause => transport.pause_unpause(),
        Command::Skip => transport.skip(),
        Command::Previous => transport.previous(),
        Command::Restart => transport.restart(),
        Command::VolumeUp => transport.volume_up(),
        Command::VolumeDown => transport.volume_down(),
        Command::Stop => transport.stop(),
    }
}

/// Apply a command, treating the end of the playlist as session news rather
/// than an error. Used by both front ends.
pub fn apply_logged(transport: &mut Transport, command: Command) {
    match apply(transport, command) {
        Ok(()) => {}
        Err(Error::Exhausted) => info!("session over: track list exhausted"),
        Err(e) => info!("command {} failed: {}", command.name(), e),
    }
}
