//! Twitter accounts: connection registry, identity index and stream manager.

mod error;
mod handler;
mod identity;
mod registry;
mod resource;
mod service;
mod stream;
mod text;
mod types;

pub use error::{TwitterError, TwitterResult};
pub use handler::{EventHub, StreamHandler, StreamNotification};
pub use identity::IdentityIndex;
pub use registry::{ConnectionEntry, ConnectionInfo, ConnectionRegistry, ConnectionStats};
pub use resource::TwitterResource;
pub use service::TwitterService;
pub use stream::{new_stream_id, StreamEntry};
pub use text::{is_valid_length, tweet_length, MAX_TWEET_LENGTH, SHORT_URL_LENGTH};
pub use types::{
    Credentials, Identity, LimitNotice, Profile, StreamId, StreamInfo, StreamParams, StreamSpec,
    Tweet, TweetAuthor, TweetText, UserRef,
};
