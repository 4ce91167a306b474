//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the item endpoints and the master
//! definition for the OpenAPI specification.

use crate::error::{ApiError, ErrorBody};
use crate::web::auth::{self, LoginRequest, LoginResponse, ValidResponse};
use crate::web::extract::{json_body, query_params};
use crate::web::state::AppState;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use chrono::{DateTime, Utc};
use lesson_tracker_core::{Identity, Item, ItemDraft, ItemId, ItemState};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use utoipa::{IntoParams, OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::login_handler,
        auth::logout_handler,
        auth::valid_handler,
        list_items_handler,
        create_item_handler,
        change_state_handler,
        delete_item_handler,
    ),
    components(
        schemas(
            LoginRequest,
            LoginResponse,
            ValidResponse,
            ItemResponse,
            ItemStateDto,
            CreateItemRequest,
            ChangeStateRequest,
            ErrorBody
        )
    ),
    tags(
        (name = "Lesson Tracker API", description = "Session-gated endpoints for tracking lessons and homework.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ItemStateDto {
    Work,
    Done,
}

impl From<ItemState> for ItemStateDto {
    fn from(state: ItemState) -> Self {
        match state {
            ItemState::Work => ItemStateDto::Work,
            ItemState::Done => ItemStateDto::Done,
        }
    }
}

/// A tracked item as returned to its owner.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ItemResponse {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub lesson: String,
    pub date: DateTime<Utc>,
    pub comment: String,
    pub state: ItemStateDto,
}

impl From<Item> for ItemResponse {
    fn from(item: Item) -> Self {
        Self {
            id: item.id.0,
            kind: item.kind,
            lesson: item.lesson,
            date: item.date,
            comment: item.comment,
            state: item.state.into(),
        }
    }
}

/// The payload for creating an item.
///
/// `id` and `state` are accepted for compatibility with older clients but the
/// server always assigns the id and starts the item in `work`.
#[derive(Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateItemRequest {
    #[serde(rename = "type")]
    pub kind: String,
    pub lesson: String,
    /// RFC 3339 timestamp or `YYYY-MM-DD`.
    pub date: String,
    pub comment: String,
    pub id: Option<i64>,
    pub state: Option<ItemStateDto>,
}

/// The payload for toggling an item. Any `state` sent is ignored; the server flips.
#[derive(Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct ChangeStateRequest {
    pub id: i64,
    pub state: Option<ItemStateDto>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DeleteItemQuery {
    /// Id of the item to delete.
    pub id: i64,
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// List the caller's items in creation order.
#[utoipa::path(
    get,
    path = "/get_data",
    responses(
        (status = 200, description = "The caller's items", body = [ItemResponse]),
        (status = 401, description = "Missing, unknown or expired session", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn list_items_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Vec<ItemResponse>>, ApiError> {
    let items = state.items.list(&identity).await?;
    Ok(Json(items.into_iter().map(ItemResponse::from).collect()))
}

/// Create a new item in the `work` state. Also served at `/add`.
#[utoipa::path(
    post,
    path = "/add_data",
    request_body = CreateItemRequest,
    responses(
        (status = 201, description = "Item created", body = ItemResponse),
        (status = 400, description = "Empty lesson, invalid date or malformed body", body = ErrorBody),
        (status = 401, description = "Missing, unknown or expired session", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn create_item_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    payload: Result<Json<CreateItemRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let req = json_body(payload)?;
    if req.id.is_some() || req.state.is_some() {
        debug!("Ignoring client-supplied id/state on create");
    }

    let draft = ItemDraft {
        kind: req.kind,
        lesson: req.lesson,
        date: req.date,
        comment: req.comment,
    };
    let item = state.items.create(&identity, draft).await?;

    Ok((StatusCode::CREATED, Json(ItemResponse::from(item))))
}

/// Flip an item between `work` and `done`.
#[utoipa::path(
    post,
    path = "/change_state",
    request_body = ChangeStateRequest,
    responses(
        (status = 200, description = "Item toggled", body = ItemResponse),
        (status = 400, description = "Malformed body", body = ErrorBody),
        (status = 401, description = "Missing, unknown or expired session", body = ErrorBody),
        (status = 403, description = "Item belongs to another user", body = ErrorBody),
        (status = 404, description = "No such item", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn change_state_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    payload: Result<Json<ChangeStateRequest>, JsonRejection>,
) -> Result<Json<ItemResponse>, ApiError> {
    let req = json_body(payload)?;

    let item = state.items.toggle_state(&identity, ItemId(req.id)).await?;

    Ok(Json(ItemResponse::from(item)))
}

/// Permanently delete an item.
#[utoipa::path(
    delete,
    path = "/delete_data",
    params(DeleteItemQuery),
    responses(
        (status = 204, description = "Item deleted"),
        (status = 400, description = "Missing or malformed id", body = ErrorBody),
        (status = 401, description = "Missing, unknown or expired session", body = ErrorBody),
        (status = 403, description = "Item belongs to another user", body = ErrorBody),
        (status = 404, description = "No such item", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn delete_item_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    params: Result<Query<DeleteItemQuery>, QueryRejection>,
) -> Result<StatusCode, ApiError> {
    let query = query_params(params)?;

    state.items.remove(&identity, ItemId(query.id)).await?;

    Ok(StatusCode::NO_CONTENT)
}
