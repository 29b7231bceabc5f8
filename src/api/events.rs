//! Server-sent events feed of stream notifications.

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::Stream;
use futures::StreamExt;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;

use crate::server::AppState;
use crate::twitter::StreamNotification;

const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(30);

/// GET /api/v1/twitter/events
///
/// Emits `tweet`, `limit` and `error` events. Slow consumers that fall
/// behind the broadcast buffer get a `lagged` event with the skip count.
#[tracing::instrument(name = "sse.twitter_events", skip(state))]
pub async fn twitter_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let receiver = state.twitter.events().subscribe();
    tracing::info!(
        subscribers = state.twitter.events().subscriber_count(),
        "SSE subscriber attached"
    );

    Sse::new(notification_stream(BroadcastStream::new(receiver)))
        .keep_alive(KeepAlive::new().interval(KEEP_ALIVE_INTERVAL).text("heartbeat"))
}

fn notification_stream(
    notifications: BroadcastStream<StreamNotification>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    async_stream::stream! {
        yield Ok(Event::default().event("connected").data("{}"));

        let mut notifications = notifications;
        while let Some(item) = notifications.next().await {
            match item {
                Ok(notification) => match serde_json::to_string(&notification) {
                    Ok(json) => yield Ok(Event::default().event(notification.event_name()).data(json)),
                    Err(e) => tracing::error!(error = %e, "Failed to serialize notification"),
                },
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "SSE subscriber lagged behind");
                    yield Ok(Event::default().event("lagged").data(skipped.to_string()));
                }
            }
        }

        tracing::info!("SSE subscriber detached");
    }
}
