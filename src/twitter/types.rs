//! Data types shared by the registry, the stream manager and the resource surface.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// OAuth 1.0a user credentials
#[derive(Clone, Deserialize, Serialize)]
pub struct Credentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token_key: String,
    pub access_token_secret: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"[REDACTED]")
            .field("access_token_key", &self.access_token_key)
            .field("access_token_secret", &"[REDACTED]")
            .finish()
    }
}

/// Reference to a user, either by handle (screen name) or by numeric id
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "UserRefRepr", into = "UserRefRepr")]
pub enum UserRef {
    ByHandle(String),
    ById(u64),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum UserRefRepr {
    Handle {
        #[serde(rename = "screenName")]
        screen_name: String,
    },
    Id {
        id: u64,
    },
}

impl From<UserRefRepr> for UserRef {
    fn from(repr: UserRefRepr) -> Self {
        match repr {
            UserRefRepr::Handle { screen_name } => UserRef::ByHandle(screen_name),
            UserRefRepr::Id { id } => UserRef::ById(id),
        }
    }
}

impl From<UserRef> for UserRefRepr {
    fn from(user: UserRef) -> Self {
        match user {
            UserRef::ByHandle(screen_name) => UserRefRepr::Handle { screen_name },
            UserRef::ById(id) => UserRefRepr::Id { id },
        }
    }
}

impl UserRef {
    pub fn handle(handle: impl Into<String>) -> Self {
        UserRef::ByHandle(handle.into())
    }

    pub fn id(id: u64) -> Self {
        UserRef::ById(id)
    }
}

impl fmt::Display for UserRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRef::ByHandle(handle) => write!(f, "@{}", handle),
            UserRef::ById(id) => write!(f, "user id {}", id),
        }
    }
}

/// A fully resolved handle/id pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub handle: String,
    pub id: u64,
}

/// Verified account data returned by credential verification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: u64,
    #[serde(rename = "screenName", alias = "screen_name")]
    pub screen_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Any other service-supplied metadata
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl Profile {
    pub fn new(id: u64, screen_name: impl Into<String>) -> Self {
        Self {
            id,
            screen_name: screen_name.into(),
            name: None,
            metadata: Map::new(),
        }
    }

    pub fn identity(&self) -> Identity {
        Identity {
            handle: self.screen_name.clone(),
            id: self.id,
        }
    }
}

/// Stream identifier of the form `<method>-<uuid>`
pub type StreamId = String;

/// Filter parameters handed to the client when opening a stream
pub type StreamParams = BTreeMap<String, String>;

/// Options that open a stream: a stream kind plus its filter terms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamSpec {
    /// Stream kind, e.g. `filter`, `sample`, `user`
    pub method: String,
    /// Filter terms such as `track`, `follow`, `locations`
    #[serde(flatten)]
    pub options: Map<String, Value>,
}

impl StreamSpec {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            options: Map::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), Value::String(value.into()));
        self
    }

    /// Filter parameters for the client: everything except `method` and `user`.
    ///
    /// Arrays are joined with commas, the form the streaming endpoints expect.
    pub fn filter_params(&self) -> StreamParams {
        self.options
            .iter()
            .filter(|(key, _)| key.as_str() != "method" && key.as_str() != "user")
            .filter_map(|(key, value)| {
                let value = match value {
                    Value::Null => return None,
                    Value::String(s) => s.clone(),
                    Value::Array(items) => items
                        .iter()
                        .map(|item| match item {
                            Value::String(s) => s.clone(),
                            other => other.to_string(),
                        })
                        .collect::<Vec<_>>()
                        .join(","),
                    other => other.to_string(),
                };
                Some((key.clone(), value))
            })
            .collect()
    }
}

/// Inspectable view of an open stream
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamInfo {
    pub stream_id: StreamId,
    pub user: String,
    pub method: String,
    pub params: StreamParams,
    pub stream: StreamSpec,
    pub opened_at: DateTime<Utc>,
}

/// Author block of a tweet
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TweetAuthor {
    #[serde(default)]
    pub id: u64,
    #[serde(rename = "screenName", alias = "screen_name", default)]
    pub screen_name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A tweet as delivered to downstream consumers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tweet {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub text: String,
    /// Mirrors `text`
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub user: TweetAuthor,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Tweet {
    /// Decode a raw stream payload and apply [`Tweet::normalize`].
    pub fn from_payload(payload: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value::<Tweet>(payload).map(Tweet::normalize)
    }

    /// Mirror `text` into `message`. A message-only tweet keeps its message.
    pub fn normalize(mut self) -> Self {
        if !self.text.is_empty() {
            self.message = self.text.clone();
        } else if !self.message.is_empty() {
            self.text = self.message.clone();
        }
        self
    }
}

/// Rate-limit notice: the stream dropped `track` matching messages
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LimitNotice {
    #[serde(default)]
    pub track: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Outgoing tweet text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TweetText {
    #[serde(default = "default_message")]
    pub message: String,
}

fn default_message() -> String {
    "I am big.".to_string()
}

impl Default for TweetText {
    fn default() -> Self {
        Self {
            message: default_message(),
        }
    }
}
