//! Stream entries: opening a subscription, pumping its events to the
//! handler, and tearing it down.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::client::{ClientResult, StreamEvent, SubscriptionHandle, TwitterClient};

use super::error::{TwitterError, TwitterResult};
use super::handler::StreamHandler;
use super::types::{StreamId, StreamInfo, StreamParams, StreamSpec, Tweet};

/// One open subscription, owned by its connection
pub struct StreamEntry {
    id: StreamId,
    owner: String,
    spec: StreamSpec,
    params: StreamParams,
    opened_at: DateTime<Utc>,
    handle: Box<dyn SubscriptionHandle>,
    pump: JoinHandle<()>,
    /// Set while a teardown owns this entry
    closing: AtomicBool,
}

impl StreamEntry {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_closing(&self) -> bool {
        self.closing.load(Ordering::Acquire)
    }

    pub fn info(&self) -> StreamInfo {
        StreamInfo {
            stream_id: self.id.clone(),
            user: self.owner.clone(),
            method: self.spec.method.clone(),
            params: self.params.clone(),
            stream: self.spec.clone(),
            opened_at: self.opened_at,
        }
    }

    /// Take ownership of the teardown. Only one caller wins.
    pub(crate) fn claim(&self) -> bool {
        !self.closing.swap(true, Ordering::AcqRel)
    }

    /// Give a failed teardown back so the stream can be removed again
    pub(crate) fn release(&self) {
        self.closing.store(false, Ordering::Release);
    }

    /// Ask the service to close the subscription and wait for confirmation.
    ///
    /// The pump is stopped only after the service confirmed.
    pub(crate) async fn destroy(&self, limit: Option<Duration>) -> TwitterResult<()> {
        confirm("stream teardown", limit, self.handle.destroy()).await?;
        self.pump.abort();
        Ok(())
    }
}

impl Drop for StreamEntry {
    fn drop(&mut self) {
        self.pump.abort();
    }
}

impl std::fmt::Debug for StreamEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamEntry")
            .field("id", &self.id)
            .field("owner", &self.owner)
            .field("spec", &self.spec)
            .field("opened_at", &self.opened_at)
            .field("closing", &self.is_closing())
            .finish()
    }
}

/// Fresh identifier; the UUID suffix keeps ids unique across removals
pub fn new_stream_id(method: &str) -> StreamId {
    format!("{}-{}", method, Uuid::new_v4())
}

/// Open a subscription of kind `spec.method` and start routing its events.
pub(crate) async fn open_stream(
    client: &dyn TwitterClient,
    owner: &str,
    spec: StreamSpec,
    handler: Arc<dyn StreamHandler>,
    limit: Option<Duration>,
) -> TwitterResult<Arc<StreamEntry>> {
    if spec.method.trim().is_empty() {
        return Err(TwitterError::InvalidRequest(
            "stream method is required".to_string(),
        ));
    }

    let params = spec.filter_params();
    let subscription = confirm("stream open", limit, client.open_stream(&spec.method, &params)).await?;

    let id = new_stream_id(&spec.method);
    let pump = tokio::spawn(pump_events(id.clone(), subscription.events, handler));

    tracing::info!(
        stream_id = %id,
        user = %owner,
        method = %spec.method,
        params = ?params,
        "Stream opened"
    );

    Ok(Arc::new(StreamEntry {
        id,
        owner: owner.to_string(),
        spec,
        params,
        opened_at: Utc::now(),
        handle: subscription.handle,
        pump,
        closing: AtomicBool::new(false),
    }))
}

/// Route raw events to the handler until the feed closes
async fn pump_events(
    stream_id: StreamId,
    mut events: mpsc::Receiver<StreamEvent>,
    handler: Arc<dyn StreamHandler>,
) {
    while let Some(event) = events.recv().await {
        match event {
            StreamEvent::Data(payload) => match Tweet::from_payload(payload) {
                Ok(tweet) => handler.on_tweet(&stream_id, tweet),
                Err(e) => handler.on_error(
                    &stream_id,
                    TwitterError::ExternalService {
                        message: format!("Malformed stream payload: {}", e),
                        code: None,
                    },
                ),
            },
            StreamEvent::Limit(notice) => handler.on_limit(&stream_id, notice),
            StreamEvent::Error { message, code } => {
                handler.on_error(&stream_id, TwitterError::from_stream_error(message, code))
            }
        }
    }

    tracing::debug!(stream_id = %stream_id, "Stream event feed closed");
}

/// Await a client confirmation, bounded by `limit` when set
pub(crate) async fn confirm<T, F>(
    operation: &'static str,
    limit: Option<Duration>,
    fut: F,
) -> TwitterResult<T>
where
    F: Future<Output = ClientResult<T>>,
{
    let result = match limit {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| TwitterError::Timeout { operation })?,
        None => fut.await,
    };
    result.map_err(TwitterError::from)
}
