use std::convert::Infallible;

use axum::{
    Router,
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
};
use tokio_stream::{Stream, StreamExt, wrappers::BroadcastStream};

use crate::{events, middleware::auth::AuthUser, state::AppState};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(stream_events))
}

/// Subscribe the caller to their channel set and relay matching envelopes as
/// server-sent events. Lagged receivers skip messages rather than stall the
/// bus; delivery is at-most-once.
pub async fn stream_events(
    State(state): State<AppState>,
    user: AuthUser,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let channels = events::channels_for(&user);
    let rx = state.events.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(move |result| {
        let envelope = match result {
            Ok(envelope) => envelope,
            Err(_) => return None,
        };
        if !channels.contains(&envelope.channel) {
            return None;
        }
        let event = Event::default()
            .event(envelope.payload.kind.as_str())
            .json_data(&envelope.payload)
            .ok()?;
        Some(Ok::<_, Infallible>(event))
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
