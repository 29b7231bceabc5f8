use std::sync::Arc;
use std::time::Instant;

use crate::client::create_client_factory;
use crate::config::Settings;
use crate::resource::ResourceRegistry;
use crate::twitter::{TwitterResource, TwitterService};

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub twitter: Arc<TwitterService>,
    pub resources: Arc<ResourceRegistry>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        let factory = create_client_factory(&settings.twitter);
        let twitter = Arc::new(TwitterService::new(factory, &settings.twitter));
        Self::with_service(settings, twitter)
    }

    /// Build state around an existing service
    pub fn with_service(settings: Settings, twitter: Arc<TwitterService>) -> Self {
        let resources = Arc::new(ResourceRegistry::new());
        resources.register(Arc::new(TwitterResource::new(twitter.clone())));

        Self {
            settings: Arc::new(settings),
            twitter,
            resources,
            start_time: Instant::now(),
        }
    }
}
