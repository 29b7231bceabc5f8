//! Declarative resources: a named set of methods described by JSON schemas
//! and invoked through one `method(params) -> result` surface.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::twitter::TwitterError;

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("Unknown resource: {0}")]
    UnknownResource(String),

    #[error("Unknown method {resource}.{method}")]
    UnknownMethod { resource: String, method: String },

    #[error("Invalid parameters for {method}: {reason}")]
    InvalidParams { method: String, reason: String },

    #[error(transparent)]
    Twitter(#[from] TwitterError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type ResourceResult<T> = Result<T, ResourceError>;

/// One invocable method and the schema of its input
#[derive(Debug, Clone, Serialize)]
pub struct MethodDefinition {
    pub name: String,
    pub description: String,
    pub input: Value,
}

/// Everything a caller needs to know to use a resource
#[derive(Debug, Clone, Serialize)]
pub struct ResourceDefinition {
    pub name: String,
    pub description: String,
    pub properties: BTreeMap<String, Value>,
    pub methods: Vec<MethodDefinition>,
}

impl ResourceDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            properties: BTreeMap::new(),
            methods: Vec::new(),
        }
    }

    pub fn property(mut self, name: impl Into<String>, schema: Value) -> Self {
        self.properties.insert(name.into(), schema);
        self
    }

    pub fn method(
        mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        input: Value,
    ) -> Self {
        self.methods.push(MethodDefinition {
            name: name.into(),
            description: description.into(),
            input,
        });
        self
    }

    pub fn find_method(&self, name: &str) -> Option<&MethodDefinition> {
        self.methods.iter().find(|m| m.name == name)
    }
}

#[async_trait]
pub trait Resource: Send + Sync {
    fn definition(&self) -> &ResourceDefinition;

    /// Run `method` with JSON `params`
    async fn invoke(&self, method: &str, params: Value) -> ResourceResult<Value>;
}

/// Decode method parameters, reporting failures as `InvalidParams`
pub fn parse_params<T: DeserializeOwned>(method: &str, params: Value) -> ResourceResult<T> {
    serde_json::from_value(params).map_err(|e| ResourceError::InvalidParams {
        method: method.to_string(),
        reason: e.to_string(),
    })
}

/// Resources registered at startup, keyed by name
#[derive(Default)]
pub struct ResourceRegistry {
    resources: DashMap<String, Arc<dyn Resource>>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource under its definition's name, replacing any
    /// previous one
    pub fn register(&self, resource: Arc<dyn Resource>) {
        let name = resource.definition().name.clone();
        tracing::info!(resource = %name, methods = resource.definition().methods.len(), "Resource registered");
        self.resources.insert(name, resource);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Resource>> {
        self.resources.get(name).map(|r| r.value().clone())
    }

    pub fn definitions(&self) -> Vec<ResourceDefinition> {
        let mut definitions: Vec<_> = self
            .resources
            .iter()
            .map(|r| r.value().definition().clone())
            .collect();
        definitions.sort_by(|a, b| a.name.cmp(&b.name));
        definitions
    }

    pub async fn invoke(&self, resource: &str, method: &str, params: Value) -> ResourceResult<Value> {
        let target = self
            .get(resource)
            .ok_or_else(|| ResourceError::UnknownResource(resource.to_string()))?;

        if target.definition().find_method(method).is_none() {
            return Err(ResourceError::UnknownMethod {
                resource: resource.to_string(),
                method: method.to_string(),
            });
        }

        tracing::debug!(resource = %resource, method = %method, "Invoking resource method");
        target.invoke(method, params).await
    }
}
