//! Extractors whose rejections come back as `{ "error": ... }` with status 400.

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::KanbanError;

#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(KanbanError))]
pub struct ApiJson<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(KanbanError))]
pub struct ApiPath<T>(pub T);
