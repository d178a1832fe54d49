//! Request body extraction.

use crate::error::GameError;
use axum::extract::FromRequest;

/// JSON request body whose rejections are reported as [`GameError::Validation`].
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(GameError))]
pub struct ApiJson<T>(pub T);
