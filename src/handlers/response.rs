//! Success envelope shared by every endpoint
//!
//! `{success: true, message, data: {success: <payload>}}`, mirroring the
//! `{success: false, message, errorCode}` error body.

use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: ApiData<T>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiData<T> {
    pub success: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, payload: T) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.into(),
            data: ApiData { success: payload },
        })
    }
}
