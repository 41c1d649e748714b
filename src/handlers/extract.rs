//! Request extractors with `AppError` rejections

use axum::extract::FromRequest;

use crate::error::AppError;

/// JSON body whose rejection renders as a validation error envelope
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);
