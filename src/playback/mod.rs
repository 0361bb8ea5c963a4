//! Playback control
//!
//! - `sequencer`: shuffled track order and cursor
//! - `transport`: the controller owning playback state and the command surface
//! - `watchdog`: stall detection over position samples
//! - `monitor`: background tasks sampling the transport

pub mod monitor;
pub mod sequencer;
pub mod transport;
pub mod watchdog;

pub use sequencer::Sequencer;
pub use transport::{SharedTransport, Transport};
pub use watchdog::StallWatchdog;
