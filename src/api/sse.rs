//! SSE stream of player events

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{Stream, StreamExt};
use tokio_stream::wrappers::BroadcastStream;
use tracing::{info, warn};

use crate::api::server::AppContext;

/// GET /events - subscribe to the player event stream
pub async fn event_stream(
    State(ctx): State<AppContext>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!(
        "new SSE client connected, total subscribers: {}",
        ctx.events.subscriber_count() + 1
    );

    let rx = ctx.events.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|result| async move {
        match result {
            Ok(player_event) => Event::default()
                .event(player_event.event_type())
                .json_data(&player_event)
                .ok()
                .map(Ok),
            Err(e) => {
                // Lagging receiver; drop the gap and continue.
                warn!("SSE client error: {:?}", e);
                None
            }
        }
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(30))
            .text("keep-alive"),
    )
}
