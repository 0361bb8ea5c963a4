//! # shufflebox
//!
//! Shuffles a folder of music and plays it. A true shuffle of all of the
//! songs in the folder, without repeats; a finished shuffle ends the session.
//!
//! **Architecture:** a shuffled-order [`playback::Sequencer`], a
//! [`playback::Transport`] controller owning playback state and the command
//! surface, and a stall watchdog that recovers from stuck playback — driven
//! by two front ends (terminal keys and HTTP routes) that resolve into the
//! same symbolic [`commands::Command`] set.

pub mod api;
pub mod audio;
pub mod commands;
pub mod config;
pub mod error;
pub mod events;
pub mod metadata;
pub mod playback;
pub mod ui;

pub use error::{Error, Result};
