//! Background monitoring tasks for playback
//!
//! Two interval tasks sample the transport on independent cadences:
//!
//! - the watchdog task detects dead streams (position sentinel) and frozen
//!   ones (stall watchdog) and performs the corrective skip;
//! - the progress task broadcasts a periodic position report for the SSE
//!   stream.
//!
//! Both serialize through the transport lock, so a corrective skip and a
//! user-triggered skip can never advance the cursor twice for one event.

use std::time::Duration;

use tokio::time;
use tracing::{debug, info, warn};

use crate::audio::POSITION_UNAVAILABLE;
use crate::error::Error;
use crate::events::{EventBus, PlayerEvent};
use crate::playback::transport::SharedTransport;

/// Start background monitoring tasks
pub fn start_monitoring(
    transport: SharedTransport,
    events: EventBus,
    watchdog_interval: Duration,
    progress_interval: Duration,
) {
    tokio::spawn(watchdog_task(transport.clone(), watchdog_interval));
    tokio::spawn(progress_task(transport, events, progress_interval));
}

/// Watchdog task: samples the playback position and recovers from dead or
/// frozen streams by skipping to the next track.
async fn watchdog_task(transport: SharedTransport, poll: Duration) {
    let mut interval = time::interval(poll);
    info!("watchdog task started ({}ms interval)", poll.as_millis());

    loop {
        interval.tick().await;

        let mut t = transport.lock().await;
        if t.is_stopped() {
            break;
        }
        if t.is_paused() {
            continue;
        }

        let position = t.current_position();
        if position == POSITION_UNAVAILABLE {
            // End of stream (or a track that never produced audio). A plain
            // skip; begin_playback resets the stall state.
            debug!("stream ended, moving to the next track");
            match t.skip() {
                Ok(()) => {}
                Err(Error::Exhausted) => break,
                Err(e) => warn!("skip after stream end failed: {}", e),
            }
            continue;
        }

        if t.stall_check(position) {
            warn!("playback position frozen at {} ms, skipping", position);
            match t.recover() {
                Ok(()) => {}
                Err(Error::Exhausted) => break,
                Err(e) => warn!("recovery failed: {}", e),
            }
        }
    }

    info!("watchdog task finished");
}

/// Progress task: periodic position/volume report for subscribers
async fn progress_task(transport: SharedTransport, events: EventBus, interval: Duration) {
    let mut ticker = time::interval(interval);

    loop {
        ticker.tick().await;

        let mut t = transport.lock().await;
        if t.is_stopped() {
            break;
        }
        events.emit(PlayerEvent::PlaybackProgress {
            position_ms: t.current_position(),
            volume: t.current_volume(),
            playing: t.is_playing(),
        });
    }
}
