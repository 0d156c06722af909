//! Custom Axum extractors.
//!
//! - `JsonBody`: JSON request body whose rejections become `400 invalid request`
//! - `RequestId`: the id assigned by the request id middleware
//!
//! # Examples
//!
//! ```ignore
//! async fn handler(
//!     request_id: RequestId,
//!     JsonBody(body): JsonBody<CreateTodoRequest>,
//! ) -> Result<Json<Todo>, AppError> {
//!     tracing::debug!(%request_id, title = %body.title, "Creating todo");
//!     ...
//! }
//! ```

use crate::error::AppError;
use crate::middleware::{REQUEST_ID_HEADER, RequestId};
use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts},
    http::request::Parts,
};

/// JSON body extractor with the API's error shape.
///
/// Malformed JSON, a wrong content type, and missing or mistyped fields all
/// reject with `{"code":"BAD_REQUEST","message":"invalid request"}`.
#[derive(Debug, Clone, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S> FromRequestParts<S> for RequestId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Without the middleware, fall back to the header rules directly
        let request_id = parts
            .extensions
            .get::<Self>()
            .cloned()
            .unwrap_or_else(|| Self::from_header(parts.headers.get(REQUEST_ID_HEADER)));

        Ok(request_id)
    }
}
