//! Request extractors.

use axum::extract::FromRequest;

use crate::error::ApiError;

/// JSON body whose rejections render as the standard error envelope.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);
