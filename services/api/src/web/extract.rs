//! services/api/src/web/extract.rs
//!
//! Turns axum's body and query rejections into `InvalidInput` so that every
//! malformed request is answered with the same 400 shape.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::Query;
use axum::Json;
use lesson_tracker_core::ServiceError;

use crate::error::ApiError;

pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ServiceError::InvalidInput(rejection.body_text()).into())
}

pub fn query_params<T>(params: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    params
        .map(|Query(query)| query)
        .map_err(|rejection| ServiceError::InvalidInput(rejection.body_text()).into())
}
