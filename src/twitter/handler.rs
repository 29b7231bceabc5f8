//! Process-wide handlers for stream events.

use serde::Serialize;
use tokio::sync::broadcast;

use crate::metrics::StreamMetrics;

use super::error::TwitterError;
use super::types::{LimitNotice, Tweet};

/// Receives events routed out of every open stream.
///
/// Called from the stream pump tasks; implementations must not block.
pub trait StreamHandler: Send + Sync {
    fn on_tweet(&self, stream_id: &str, tweet: Tweet);

    fn on_limit(&self, stream_id: &str, notice: LimitNotice);

    fn on_error(&self, stream_id: &str, error: TwitterError);

    /// A tweet handed in through `receive` rather than read off a stream
    fn on_receive(&self, tweet: Tweet);
}

/// Event published to downstream consumers
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamNotification {
    Tweet {
        #[serde(skip_serializing_if = "Option::is_none")]
        stream_id: Option<String>,
        tweet: Tweet,
    },
    Limit {
        stream_id: String,
        notice: LimitNotice,
    },
    Error {
        stream_id: String,
        code: &'static str,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        service_code: Option<i64>,
    },
}

impl StreamNotification {
    /// SSE event name
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::Tweet { .. } => "tweet",
            Self::Limit { .. } => "limit",
            Self::Error { .. } => "error",
        }
    }
}

/// Default handler: logs every event and fans it out on a broadcast channel
#[derive(Clone)]
pub struct EventHub {
    sender: broadcast::Sender<StreamNotification>,
}

impl EventHub {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StreamNotification> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Publish to current subscribers; returns how many received it
    pub fn publish(&self, notification: StreamNotification) -> usize {
        // No subscribers is not an error
        self.sender.send(notification).unwrap_or(0)
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl StreamHandler for EventHub {
    fn on_tweet(&self, stream_id: &str, tweet: Tweet) {
        StreamMetrics::record_tweet();
        tracing::info!(
            stream_id = %stream_id,
            tweet_id = tweet.id,
            user = %tweet.user.screen_name,
            "Received tweet"
        );
        self.publish(StreamNotification::Tweet {
            stream_id: Some(stream_id.to_string()),
            tweet,
        });
    }

    fn on_limit(&self, stream_id: &str, notice: LimitNotice) {
        StreamMetrics::record_limit();
        tracing::warn!(stream_id = %stream_id, track = notice.track, "Stream rate limit notice");
        self.publish(StreamNotification::Limit {
            stream_id: stream_id.to_string(),
            notice,
        });
    }

    fn on_receive(&self, tweet: Tweet) {
        tracing::info!(tweet_id = tweet.id, user = %tweet.user.screen_name, "Received tweet");
        self.publish(StreamNotification::Tweet {
            stream_id: None,
            tweet,
        });
    }

    fn on_error(&self, stream_id: &str, error: TwitterError) {
        StreamMetrics::record_error();
        tracing::error!(stream_id = %stream_id, error = %error, "Stream error");
        tracing::debug!(stream_id = %stream_id, detail = ?error, "Stream error detail");

        let service_code = match &error {
            TwitterError::ExternalService { code, .. } => *code,
            _ => None,
        };
        self.publish(StreamNotification::Error {
            stream_id: stream_id.to_string(),
            code: error.code(),
            message: error.to_string(),
            service_code,
        });
    }
}
