//! Resource discovery and invocation endpoints.

use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::resource::{ResourceDefinition, ResourceError};
use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct InvokeResponse {
    pub resource: String,
    pub method: String,
    pub result: Value,
}

/// GET /api/v1/resources
pub async fn list_resources(State(state): State<AppState>) -> Json<Vec<ResourceDefinition>> {
    Json(state.resources.definitions())
}

/// GET /api/v1/resources/{name}
pub async fn get_resource(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ResourceDefinition>> {
    let resource = state
        .resources
        .get(&name)
        .ok_or(ResourceError::UnknownResource(name))?;
    Ok(Json(resource.definition().clone()))
}

/// POST /api/v1/resources/{name}/{method}
///
/// The body is the method's JSON parameters; an empty body means `{}`.
#[tracing::instrument(name = "resource.invoke", skip(state, body))]
pub async fn invoke_method(
    State(state): State<AppState>,
    Path((name, method)): Path<(String, String)>,
    body: Bytes,
) -> Result<Json<InvokeResponse>> {
    let params = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Object(Default::default())
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::Validation(format!("Invalid JSON body: {}", e)))?
    };

    let result = state.resources.invoke(&name, &method, params).await?;

    Ok(Json(InvokeResponse {
        resource: name,
        method,
        result,
    }))
}
