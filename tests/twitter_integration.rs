//! Connection registry and stream lifecycle integration tests
//!
//! Everything runs against the in-memory sandbox backend, which behaves
//! like the real service: subscriptions are live channels and faults can
//! be injected per stream kind.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::broadcast;
use tokio_test::{assert_err, assert_ok};

use twitter_resource::client::memory::{Action, MemoryClient};
use twitter_resource::client::{
    ClientError, ClientFactory, ClientResult, MemoryClientFactory, MemoryTwitter, StreamEvent,
    Subscription, SubscriptionHandle, TwitterClient,
};
use twitter_resource::config::TwitterConfig;
use twitter_resource::twitter::{
    Credentials, LimitNotice, Profile, StreamNotification, StreamParams, StreamSpec, TwitterError,
    TwitterService, UserRef,
};

const JACK_ID: u64 = 12;

fn credentials(token: &str) -> Credentials {
    Credentials {
        consumer_key: "consumer-key".to_string(),
        consumer_secret: "consumer-secret".to_string(),
        access_token_key: token.to_string(),
        access_token_secret: "token-secret".to_string(),
    }
}

/// Service wired to a sandbox that knows @jack and @biz
fn create_test_environment() -> (TwitterService, MemoryTwitter) {
    let sandbox = MemoryTwitter::new();
    sandbox.register_account("token-jack", Profile::new(JACK_ID, "jack"));
    sandbox.register_account("token-biz", Profile::new(13, "biz"));

    let service = TwitterService::new(
        Arc::new(MemoryClientFactory::new(sandbox.clone())),
        &TwitterConfig::default(),
    );
    (service, sandbox)
}

fn jack() -> UserRef {
    UserRef::handle("jack")
}

async fn next_notification(
    rx: &mut broadcast::Receiver<StreamNotification>,
) -> StreamNotification {
    tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("notification within a second")
        .expect("hub open")
}

// =============================================================================
// Connect / Identity Index
// =============================================================================

mod connect_tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_cross_references_identity() {
        let (service, _) = create_test_environment();

        let profile = assert_ok!(service.connect(&credentials("token-jack"), vec![]).await);
        assert_eq!(profile.id, JACK_ID);

        let by_handle = service.identities().resolve(&jack()).unwrap();
        let by_id = service.identities().resolve(&UserRef::id(JACK_ID)).unwrap();
        assert_eq!(by_handle, by_id);
        assert_eq!(by_id.handle, "jack");
        assert!(service.connections().contains("jack"));
        assert!(service.identities().is_consistent());
    }

    #[tokio::test]
    async fn test_connect_opens_requested_streams() {
        let (service, sandbox) = create_test_environment();

        assert_ok!(
            service
                .connect(
                    &credentials("token-jack"),
                    vec![
                        StreamSpec::new("filter").with("track", "rust"),
                        StreamSpec::new("sample"),
                    ],
                )
                .await
        );

        let streams = service.list_streams(&jack()).unwrap();
        assert_eq!(streams.len(), 2);
        assert_eq!(sandbox.subscriptions_for("jack"), 2);
        assert_eq!(sandbox.subscription_params("filter")[0]["track"], "rust");
    }

    #[tokio::test]
    async fn test_failed_stream_open_leaves_nothing_behind() {
        let (service, sandbox) = create_test_environment();
        sandbox.fail_stream_open(
            "filter",
            ClientError::Api {
                message: "Forbidden".to_string(),
                code: Some(403),
            },
        );

        let err = assert_err!(
            service
                .connect(
                    &credentials("token-jack"),
                    vec![StreamSpec::new("sample"), StreamSpec::new("filter")],
                )
                .await
        );

        match err {
            TwitterError::PartialFailure {
                operation,
                failed,
                source,
            } => {
                assert_eq!(operation, "connect");
                assert_eq!(failed, vec!["filter".to_string()]);
                assert!(matches!(
                    *source,
                    TwitterError::ExternalService { code: Some(403), .. }
                ));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        assert!(!service.connections().contains("jack"));
        assert!(service.identities().resolve(&UserRef::id(JACK_ID)).is_none());
        assert_eq!(sandbox.open_subscriptions(), 0);
    }

    #[tokio::test]
    async fn test_rejected_credentials() {
        let (service, _) = create_test_environment();

        let err = assert_err!(service.connect(&credentials("stolen"), vec![]).await);
        assert!(matches!(err, TwitterError::Authentication(_)));
        assert_eq!(err.code(), "AUTHENTICATION_FAILED");
    }

    #[tokio::test]
    async fn test_already_connected_keeps_first_session() {
        let (service, sandbox) = create_test_environment();
        service
            .connect(&credentials("token-jack"), vec![StreamSpec::new("sample")])
            .await
            .unwrap();

        let err = assert_err!(
            service
                .connect(&credentials("token-jack"), vec![StreamSpec::new("filter")])
                .await
        );
        assert!(matches!(err, TwitterError::AlreadyConnected(_)));
        assert_eq!(service.list_streams(&jack()).unwrap().len(), 1);
        assert_eq!(sandbox.open_subscriptions(), 1);
    }
}

// =============================================================================
// Stream Lifecycle
// =============================================================================

mod stream_tests {
    use super::*;

    #[tokio::test]
    async fn test_add_get_remove_scenario() {
        let (service, sandbox) = create_test_environment();
        service
            .connect(&credentials("token-jack"), vec![])
            .await
            .unwrap();

        let info = assert_ok!(
            service
                .add_stream(&jack(), StreamSpec::new("filter").with("track", "rust"))
                .await
        );
        assert!(info.stream_id.starts_with("filter-"));
        assert_eq!(info.params["track"], "rust");

        let fetched = assert_ok!(service.get_stream(&UserRef::id(JACK_ID), &info.stream_id));
        assert_eq!(fetched.stream_id, info.stream_id);

        assert!(assert_ok!(service.remove_stream(&jack(), &info.stream_id).await));
        assert!(matches!(
            service.get_stream(&jack(), &info.stream_id),
            Err(TwitterError::StreamNotFound { .. })
        ));
        assert_eq!(sandbox.open_subscriptions(), 0);
    }

    #[tokio::test]
    async fn test_stream_ids_are_distinct_per_open() {
        let (service, _) = create_test_environment();
        service
            .connect(&credentials("token-jack"), vec![])
            .await
            .unwrap();

        let first = service
            .add_stream(&jack(), StreamSpec::new("filter"))
            .await
            .unwrap();
        let second = service
            .add_stream(&jack(), StreamSpec::new("filter"))
            .await
            .unwrap();

        assert_ne!(first.stream_id, second.stream_id);
        assert_ok!(service.get_stream(&jack(), &first.stream_id));
        assert_ok!(service.get_stream(&jack(), &second.stream_id));
    }

    #[tokio::test]
    async fn test_remove_twice_is_stream_not_found() {
        let (service, _) = create_test_environment();
        service
            .connect(&credentials("token-jack"), vec![])
            .await
            .unwrap();
        let keep = service
            .add_stream(&jack(), StreamSpec::new("sample"))
            .await
            .unwrap();
        let gone = service
            .add_stream(&jack(), StreamSpec::new("filter"))
            .await
            .unwrap();

        service.remove_stream(&jack(), &gone.stream_id).await.unwrap();
        let err = assert_err!(service.remove_stream(&jack(), &gone.stream_id).await);
        assert!(matches!(err, TwitterError::StreamNotFound { .. }));

        let remaining = service.list_streams(&jack()).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].stream_id, keep.stream_id);
    }

    #[tokio::test]
    async fn test_concurrent_removals_only_one_wins() {
        let (service, _) = create_test_environment();
        service
            .connect(&credentials("token-jack"), vec![])
            .await
            .unwrap();
        let info = service
            .add_stream(&jack(), StreamSpec::new("filter"))
            .await
            .unwrap();

        let user = jack();
        let (a, b) = tokio::join!(
            service.remove_stream(&user, &info.stream_id),
            service.remove_stream(&user, &info.stream_id)
        );

        assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
        let loser = if a.is_err() { a } else { b };
        assert!(matches!(loser, Err(TwitterError::StreamNotFound { .. })));
    }

    #[tokio::test]
    async fn test_failed_teardown_keeps_stream_removable() {
        let (service, sandbox) = create_test_environment();
        service
            .connect(&credentials("token-jack"), vec![])
            .await
            .unwrap();
        let info = service
            .add_stream(&jack(), StreamSpec::new("filter"))
            .await
            .unwrap();

        sandbox.fail_stream_destroy("filter", ClientError::Transport("reset by peer".into()));
        let err = assert_err!(service.remove_stream(&jack(), &info.stream_id).await);
        assert!(matches!(err, TwitterError::ExternalService { .. }));
        assert_ok!(service.get_stream(&jack(), &info.stream_id));

        sandbox.clear_failures();
        assert_ok!(service.remove_stream(&jack(), &info.stream_id).await);
        assert_eq!(sandbox.open_subscriptions(), 0);
    }
}

// =============================================================================
// Disconnect
// =============================================================================

mod disconnect_tests {
    use super::*;

    #[tokio::test]
    async fn test_disconnect_without_streams_erases_everything() {
        let (service, _) = create_test_environment();
        service
            .connect(&credentials("token-jack"), vec![])
            .await
            .unwrap();

        assert!(assert_ok!(service.disconnect(&UserRef::id(JACK_ID)).await));
        assert!(!service.connections().contains("jack"));
        assert!(service.identities().is_empty());
    }

    #[tokio::test]
    async fn test_disconnect_tears_down_every_stream() {
        let (service, sandbox) = create_test_environment();
        service
            .connect(
                &credentials("token-jack"),
                vec![StreamSpec::new("filter"), StreamSpec::new("sample")],
            )
            .await
            .unwrap();
        service
            .connect(&credentials("token-biz"), vec![StreamSpec::new("sample")])
            .await
            .unwrap();

        assert_ok!(service.disconnect(&jack()).await);
        assert_eq!(sandbox.subscriptions_for("jack"), 0);
        assert_eq!(sandbox.subscriptions_for("biz"), 1);
        assert_eq!(service.stats().total_connections, 1);
    }

    #[tokio::test]
    async fn test_partial_teardown_failure_is_recoverable() {
        let (service, sandbox) = create_test_environment();
        service
            .connect(
                &credentials("token-jack"),
                vec![StreamSpec::new("filter"), StreamSpec::new("sample")],
            )
            .await
            .unwrap();

        sandbox.fail_stream_destroy(
            "filter",
            ClientError::Api {
                message: "Over capacity".into(),
                code: Some(130),
            },
        );
        let err = assert_err!(service.disconnect(&jack()).await);
        match &err {
            TwitterError::PartialFailure {
                operation, failed, ..
            } => {
                assert_eq!(*operation, "disconnect");
                assert_eq!(failed.len(), 1);
                assert!(failed[0].starts_with("filter-"));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        // The failing stream and the connection survive; the other stream is gone
        let remaining = service.list_streams(&jack()).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].method, "filter");
        assert!(service.identities().resolve(&UserRef::id(JACK_ID)).is_some());

        // New streams may still be opened after a failed disconnect
        assert_ok!(service.add_stream(&jack(), StreamSpec::new("user")).await);

        sandbox.clear_failures();
        assert_ok!(service.disconnect(&jack()).await);
        assert!(service.connections().is_empty());
        assert!(service.identities().is_empty());
        assert_eq!(sandbox.open_subscriptions(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_disconnects() {
        let (service, _) = create_test_environment();
        service
            .connect(&credentials("token-jack"), vec![StreamSpec::new("sample")])
            .await
            .unwrap();

        let user = jack();
        let (a, b) = tokio::join!(service.disconnect(&user), service.disconnect(&user));
        assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
        let loser = if a.is_err() { a } else { b };
        assert!(matches!(loser, Err(TwitterError::ConnectionNotFound(_))));
    }

    #[tokio::test]
    async fn test_reconnect_after_disconnect() {
        let (service, _) = create_test_environment();
        service
            .connect(&credentials("token-jack"), vec![])
            .await
            .unwrap();
        service.disconnect(&jack()).await.unwrap();

        assert_ok!(service.connect(&credentials("token-jack"), vec![]).await);
        assert!(service.identities().is_consistent());
    }

    /// Sandbox client whose stream opens and teardowns take a while
    struct SlowClient {
        inner: MemoryClient,
        open_delay: Duration,
        destroy_delay: Duration,
    }

    struct SlowHandle {
        inner: Box<dyn SubscriptionHandle>,
        delay: Duration,
    }

    #[async_trait]
    impl SubscriptionHandle for SlowHandle {
        async fn destroy(&self) -> ClientResult<()> {
            tokio::time::sleep(self.delay).await;
            self.inner.destroy().await
        }
    }

    #[async_trait]
    impl TwitterClient for SlowClient {
        async fn verify_credentials(&self) -> ClientResult<Profile> {
            self.inner.verify_credentials().await
        }

        async fn open_stream(&self, method: &str, params: &StreamParams) -> ClientResult<Subscription> {
            tokio::time::sleep(self.open_delay).await;
            let subscription = self.inner.open_stream(method, params).await?;
            Ok(Subscription {
                events: subscription.events,
                handle: Box::new(SlowHandle {
                    inner: subscription.handle,
                    delay: self.destroy_delay,
                }),
            })
        }

        async fn update_status(&self, text: &str) -> ClientResult<Value> {
            self.inner.update_status(text).await
        }

        async fn create_friendship(&self, user_id: u64) -> ClientResult<Value> {
            self.inner.create_friendship(user_id).await
        }

        async fn destroy_friendship(&self, user_id: u64) -> ClientResult<Value> {
            self.inner.destroy_friendship(user_id).await
        }

        async fn create_block(&self, user_id: u64) -> ClientResult<Value> {
            self.inner.create_block(user_id).await
        }

        async fn report_spam(&self, user_id: u64) -> ClientResult<Value> {
            self.inner.report_spam(user_id).await
        }
    }

    struct SlowFactory {
        sandbox: MemoryTwitter,
        open_delay: Duration,
        destroy_delay: Duration,
    }

    impl ClientFactory for SlowFactory {
        fn create(&self, credentials: &Credentials) -> Arc<dyn TwitterClient> {
            Arc::new(SlowClient {
                inner: self.sandbox.client(credentials),
                open_delay: self.open_delay,
                destroy_delay: self.destroy_delay,
            })
        }
    }

    fn slow_environment(open_ms: u64, destroy_ms: u64) -> (Arc<TwitterService>, MemoryTwitter) {
        let sandbox = MemoryTwitter::new();
        sandbox.register_account("token-jack", Profile::new(JACK_ID, "jack"));
        let factory = SlowFactory {
            sandbox: sandbox.clone(),
            open_delay: Duration::from_millis(open_ms),
            destroy_delay: Duration::from_millis(destroy_ms),
        };
        let service = TwitterService::new(Arc::new(factory), &TwitterConfig::default());
        (Arc::new(service), sandbox)
    }

    #[tokio::test]
    async fn test_disconnect_waits_for_inflight_add_stream() {
        let (service, sandbox) = slow_environment(100, 0);
        assert_ok!(service.connect(&credentials("token-jack"), vec![]).await);

        let adding = {
            let service = service.clone();
            tokio::spawn(async move { service.add_stream(&jack(), StreamSpec::new("filter")).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_ok!(service.disconnect(&jack()).await);
        assert_ok!(adding.await.unwrap());

        assert!(service.connections().is_empty());
        assert!(service.identities().is_empty());
        assert_eq!(sandbox.open_subscriptions(), 0);
    }

    #[tokio::test]
    async fn test_add_stream_during_disconnect_is_refused() {
        let (service, sandbox) = slow_environment(0, 100);
        assert_ok!(
            service
                .connect(&credentials("token-jack"), vec![StreamSpec::new("sample")])
                .await
        );

        let disconnecting = {
            let service = service.clone();
            tokio::spawn(async move { service.disconnect(&jack()).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        let err = assert_err!(service.add_stream(&jack(), StreamSpec::new("filter")).await);
        assert!(matches!(err, TwitterError::ConnectionNotFound(_)));
        assert_ok!(disconnecting.await.unwrap());

        assert!(service.connections().is_empty());
        assert_eq!(sandbox.open_subscriptions(), 0);
    }

    #[tokio::test]
    async fn test_disconnect_all() {
        let (service, sandbox) = create_test_environment();
        service
            .connect(&credentials("token-jack"), vec![StreamSpec::new("sample")])
            .await
            .unwrap();
        service
            .connect(&credentials("token-biz"), vec![StreamSpec::new("filter")])
            .await
            .unwrap();

        assert_eq!(service.disconnect_all().await, 2);
        assert!(service.connections().is_empty());
        assert_eq!(sandbox.open_subscriptions(), 0);
    }
}

// =============================================================================
// Stream Events
// =============================================================================

mod event_tests {
    use super::*;

    #[tokio::test]
    async fn test_data_event_is_normalized_and_published() {
        let (service, sandbox) = create_test_environment();
        let mut rx = service.events().subscribe();
        service
            .connect(&credentials("token-jack"), vec![StreamSpec::new("filter")])
            .await
            .unwrap();

        let delivered = sandbox.emit(
            "filter",
            StreamEvent::Data(json!({
                "id": 99,
                "text": "hello rust",
                "user": { "id": 7, "screen_name": "ferris" }
            })),
        );
        assert_eq!(delivered, 1);

        match next_notification(&mut rx).await {
            StreamNotification::Tweet { stream_id, tweet } => {
                assert!(stream_id.unwrap().starts_with("filter-"));
                assert_eq!(tweet.message, "hello rust");
                assert_eq!(tweet.text, tweet.message);
                assert_eq!(tweet.user.screen_name, "ferris");
            }
            other => panic!("unexpected notification: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_limit_and_error_events() {
        let (service, sandbox) = create_test_environment();
        let mut rx = service.events().subscribe();
        service
            .connect(&credentials("token-jack"), vec![StreamSpec::new("sample")])
            .await
            .unwrap();

        sandbox.emit(
            "sample",
            StreamEvent::Limit(LimitNotice {
                track: 17,
                ..Default::default()
            }),
        );
        match next_notification(&mut rx).await {
            StreamNotification::Limit { notice, .. } => assert_eq!(notice.track, 17),
            other => panic!("unexpected notification: {other:?}"),
        }

        sandbox.emit(
            "sample",
            StreamEvent::Error {
                message: "Enhance your calm".into(),
                code: Some(420),
            },
        );
        match next_notification(&mut rx).await {
            StreamNotification::Error {
                code,
                message,
                service_code,
                ..
            } => {
                assert_eq!(code, "EXTERNAL_SERVICE_ERROR");
                assert!(message.contains("Enhance your calm 420"));
                assert_eq!(service_code, Some(420));
            }
            other => panic!("unexpected notification: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_removed_stream_stops_delivering() {
        let (service, sandbox) = create_test_environment();
        service
            .connect(&credentials("token-jack"), vec![])
            .await
            .unwrap();
        let info = service
            .add_stream(&jack(), StreamSpec::new("filter"))
            .await
            .unwrap();

        service.remove_stream(&jack(), &info.stream_id).await.unwrap();
        assert_eq!(sandbox.emit("filter", StreamEvent::Data(json!({ "id": 1 }))), 0);
    }
}

// =============================================================================
// Account Operations
// =============================================================================

mod account_tests {
    use super::*;

    #[tokio::test]
    async fn test_send_and_relationships_use_own_client() {
        let (service, sandbox) = create_test_environment();
        service
            .connect(&credentials("token-jack"), vec![])
            .await
            .unwrap();

        let sent = assert_ok!(service.send(&jack(), "just setting up my twttr").await);
        assert_eq!(sent["text"], "just setting up my twttr");

        assert_ok!(service.follow(&jack(), 13).await);
        assert_ok!(service.unfollow(&UserRef::id(JACK_ID), 13).await);
        assert_ok!(service.block(&jack(), 666).await);
        assert_ok!(service.report(&jack(), 666).await);

        assert_eq!(
            sandbox.actions(),
            vec![
                Action::Status {
                    user: "jack".into(),
                    text: "just setting up my twttr".into()
                },
                Action::Follow {
                    user: "jack".into(),
                    target: 13
                },
                Action::Unfollow {
                    user: "jack".into(),
                    target: 13
                },
                Action::Block {
                    user: "jack".into(),
                    target: 666
                },
                Action::Report {
                    user: "jack".into(),
                    target: 666
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_service_errors_are_normalized() {
        let (service, _) = create_test_environment();
        service
            .connect(&credentials("token-jack"), vec![])
            .await
            .unwrap();

        service.send(&jack(), "once").await.unwrap();
        let err = assert_err!(service.send(&jack(), "once").await);
        assert!(matches!(
            err,
            TwitterError::ExternalService {
                code: Some(187),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_relationship_calls_are_counted() {
        let (service, _) = create_test_environment();
        service
            .connect(&credentials("token-jack"), vec![])
            .await
            .unwrap();

        assert_ok!(service.follow(&jack(), 13).await);
        assert_ok!(service.report(&jack(), 13).await);

        let text = twitter_resource::metrics::encode_metrics().unwrap();
        for operation in ["follow", "report"] {
            assert!(
                text.contains(&format!("operation=\"{operation}\",outcome=\"ok\"")),
                "missing {operation} in metrics output"
            );
        }
    }

    #[tokio::test]
    async fn test_over_length_tweet_is_still_sent() {
        let (service, _) = create_test_environment();
        service
            .connect(&credentials("token-jack"), vec![])
            .await
            .unwrap();

        let long = "a".repeat(300);
        assert!(service.tweet_length(&long) > 280);
        assert_ok!(service.send(&jack(), &long).await);
    }

    #[tokio::test]
    async fn test_receive_publishes_normalized_tweet() {
        let (service, _) = create_test_environment();
        let mut rx = service.events().subscribe();

        let tweet = service.receive(serde_json::from_value(json!({ "message": "hi" })).unwrap());
        assert_eq!(tweet.text, "hi");

        match next_notification(&mut rx).await {
            StreamNotification::Tweet { stream_id, tweet } => {
                assert!(stream_id.is_none());
                assert_eq!(tweet.message, "hi");
            }
            other => panic!("unexpected notification: {other:?}"),
        }
    }
}

// =============================================================================
// Confirmation Timeout
// =============================================================================

mod timeout_tests {
    use super::*;

    /// Verifies credentials, then never confirms a stream open
    struct StalledClient;

    #[async_trait]
    impl TwitterClient for StalledClient {
        async fn verify_credentials(&self) -> ClientResult<Profile> {
            Ok(Profile::new(JACK_ID, "jack"))
        }

        async fn open_stream(&self, _method: &str, _params: &StreamParams) -> ClientResult<Subscription> {
            std::future::pending().await
        }

        async fn update_status(&self, _text: &str) -> ClientResult<Value> {
            std::future::pending().await
        }

        async fn create_friendship(&self, _user_id: u64) -> ClientResult<Value> {
            Ok(Value::Null)
        }

        async fn destroy_friendship(&self, _user_id: u64) -> ClientResult<Value> {
            Ok(Value::Null)
        }

        async fn create_block(&self, _user_id: u64) -> ClientResult<Value> {
            Ok(Value::Null)
        }

        async fn report_spam(&self, _user_id: u64) -> ClientResult<Value> {
            Ok(Value::Null)
        }
    }

    struct StalledFactory;

    impl ClientFactory for StalledFactory {
        fn create(&self, _credentials: &Credentials) -> Arc<dyn TwitterClient> {
            Arc::new(StalledClient)
        }
    }

    #[tokio::test]
    async fn test_unconfirmed_open_times_out() {
        let config = TwitterConfig {
            confirmation_timeout_secs: 1,
            ..Default::default()
        };
        let service = TwitterService::new(Arc::new(StalledFactory), &config);

        assert_ok!(service.connect(&credentials("any"), vec![]).await);

        let err = assert_err!(service.add_stream(&jack(), StreamSpec::new("filter")).await);
        assert!(matches!(err, TwitterError::Timeout { .. }));
        assert_eq!(service.stats().total_streams, 0);

        let err = assert_err!(service.send(&jack(), "anyone?").await);
        assert_eq!(err.code(), "TIMEOUT");
    }
}
