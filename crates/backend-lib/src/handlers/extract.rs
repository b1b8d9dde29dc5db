//! Request body extraction with errors in the API's JSON shape.
use axum::extract::FromRequest;

use crate::error::AppError;

/// `axum::Json` whose rejections become [`AppError`] bodies
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);
