//! The `twitter` resource: account operations over [`TwitterService`].

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::resource::{parse_params, Resource, ResourceDefinition, ResourceError, ResourceResult};

use super::service::TwitterService;
use super::types::{Credentials, StreamSpec, Tweet, TweetText, UserRef};

#[derive(Deserialize)]
struct ConnectParams {
    #[serde(flatten)]
    credentials: Credentials,
    /// Streams to open with the connection; keys are informational only
    #[serde(default)]
    streams: BTreeMap<String, StreamRequest>,
}

/// Accepts `{options: {...}}`, `{stream: {...}}` or the stream options bare
#[derive(Deserialize)]
#[serde(untagged)]
enum StreamRequest {
    Options { options: StreamSpec },
    Stream { stream: StreamSpec },
    Bare(StreamSpec),
}

impl From<StreamRequest> for StreamSpec {
    fn from(request: StreamRequest) -> Self {
        match request {
            StreamRequest::Options { options } => options,
            StreamRequest::Stream { stream } => stream,
            StreamRequest::Bare(spec) => spec,
        }
    }
}

#[derive(Deserialize)]
struct AddStreamParams {
    user: UserRef,
    stream: StreamSpec,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StreamParamsRef {
    user: UserRef,
    stream_id: String,
}

#[derive(Deserialize)]
struct SendParams {
    user: UserRef,
    #[serde(default)]
    tweet: TweetText,
}

#[derive(Deserialize)]
struct TargetParams {
    user: UserRef,
    id: u64,
}

pub struct TwitterResource {
    service: Arc<TwitterService>,
    definition: ResourceDefinition,
}

impl TwitterResource {
    pub fn new(service: Arc<TwitterService>) -> Self {
        Self {
            service,
            definition: definition(),
        }
    }

    pub fn service(&self) -> &Arc<TwitterService> {
        &self.service
    }
}

/// `{user: {...}}`, or the user given at the top level
fn user_param(method: &str, params: Value) -> ResourceResult<UserRef> {
    match params {
        Value::Object(mut map) if map.contains_key("user") => {
            parse_params(method, map.remove("user").unwrap_or(Value::Null))
        }
        other => parse_params(method, other),
    }
}

#[async_trait]
impl Resource for TwitterResource {
    fn definition(&self) -> &ResourceDefinition {
        &self.definition
    }

    async fn invoke(&self, method: &str, params: Value) -> ResourceResult<Value> {
        match method {
            "connect" => {
                let p: ConnectParams = parse_params(method, params)?;
                let streams = p.streams.into_values().map(StreamSpec::from).collect();
                let profile = self.service.connect(&p.credentials, streams).await?;
                Ok(serde_json::to_value(profile)?)
            }
            "disconnect" => {
                let user = user_param(method, params)?;
                Ok(Value::Bool(self.service.disconnect(&user).await?))
            }
            "addStream" => {
                let p: AddStreamParams = parse_params(method, params)?;
                let info = self.service.add_stream(&p.user, p.stream).await?;
                Ok(serde_json::to_value(info)?)
            }
            "getStream" => {
                let p: StreamParamsRef = parse_params(method, params)?;
                let info = self.service.get_stream(&p.user, &p.stream_id)?;
                Ok(serde_json::to_value(info)?)
            }
            "removeStream" => {
                let p: StreamParamsRef = parse_params(method, params)?;
                Ok(Value::Bool(
                    self.service.remove_stream(&p.user, &p.stream_id).await?,
                ))
            }
            "send" => {
                let p: SendParams = parse_params(method, params)?;
                Ok(self.service.send(&p.user, &p.tweet.message).await?)
            }
            "receive" => {
                let tweet: Tweet = parse_params(method, params)?;
                Ok(serde_json::to_value(self.service.receive(tweet))?)
            }
            "follow" => {
                let p: TargetParams = parse_params(method, params)?;
                Ok(self.service.follow(&p.user, p.id).await?)
            }
            "unfollow" => {
                let p: TargetParams = parse_params(method, params)?;
                Ok(self.service.unfollow(&p.user, p.id).await?)
            }
            "block" => {
                let p: TargetParams = parse_params(method, params)?;
                Ok(self.service.block(&p.user, p.id).await?)
            }
            "report" => {
                let p: TargetParams = parse_params(method, params)?;
                Ok(self.service.report(&p.user, p.id).await?)
            }
            "tweetLength" => {
                let p: TweetText = parse_params(method, params)?;
                Ok(json!(self.service.tweet_length(&p.message)))
            }
            other => Err(ResourceError::UnknownMethod {
                resource: self.definition.name.clone(),
                method: other.to_string(),
            }),
        }
    }
}

fn definition() -> ResourceDefinition {
    let credentials = json!({
        "description": "credentials for logging into twitter",
        "type": "object",
        "properties": {
            "consumer_key": { "type": "string" },
            "consumer_secret": { "type": "string" },
            "access_token_key": { "type": "string" },
            "access_token_secret": { "type": "string" }
        },
        "required": ["consumer_key", "consumer_secret", "access_token_key", "access_token_secret"]
    });
    let user = json!({
        "description": "a twitter user, by screenName or numeric id",
        "type": "object",
        "properties": {
            "id": { "type": "integer" },
            "screenName": { "type": "string" }
        }
    });
    let tweet = json!({
        "description": "a twitter tweet",
        "type": "object",
        "properties": {
            "message": { "type": "string", "default": "I am big." }
        }
    });
    let stream = json!({
        "description": "a twitter stream",
        "type": "object",
        "properties": {
            "method": { "type": "string" },
            "follow": { "type": "string" },
            "track": { "type": "string" },
            "locations": { "type": "string" }
        },
        "required": ["method"]
    });
    let stream_ref = json!({
        "type": "object",
        "properties": {
            "user": user,
            "streamId": { "type": "string" }
        },
        "required": ["user", "streamId"]
    });
    let target = json!({
        "type": "object",
        "properties": {
            "user": user,
            "id": { "type": "integer", "description": "the other user's numeric id" }
        },
        "required": ["user", "id"]
    });

    let mut connect = credentials.clone();
    connect["description"] = json!("credentials plus streams to open on connect");
    connect["properties"]["streams"] = json!({
        "type": "object",
        "additionalProperties": { "type": "object", "properties": { "options": stream } }
    });

    ResourceDefinition::new("twitter", "for interacting with the Twitter API")
        .property("credentials", credentials)
        .property("user", user.clone())
        .property("tweet", tweet.clone())
        .property("stream", stream.clone())
        .method("connect", "connects to twitter", connect)
        .method(
            "disconnect",
            "disconnects from twitter",
            json!({ "type": "object", "properties": { "user": user } }),
        )
        .method(
            "addStream",
            "starts listening to a twitter stream",
            json!({
                "type": "object",
                "properties": { "user": user, "stream": stream },
                "required": ["user", "stream"]
            }),
        )
        .method("getStream", "gets an active twitter stream", stream_ref.clone())
        .method("removeStream", "stops listening to a twitter stream", stream_ref)
        .method(
            "send",
            "sends a tweet (updates your status)",
            json!({
                "type": "object",
                "properties": { "user": user, "tweet": tweet },
                "required": ["user"]
            }),
        )
        .method("receive", "receives tweets from activated streams", tweet.clone())
        .method("follow", "follows a twitter user", target.clone())
        .method("unfollow", "unfollows a twitter user", target.clone())
        .method("block", "blocks a twitter user", target.clone())
        .method("report", "reports a twitter user", target)
        .method("tweetLength", "gets the length of a tweet", tweet)
}
