//! HTTP request handlers.

use super::AppState;
use super::render;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use ddns_diag_core::Error;
use ddns_diag_core::request::DiagRequest;
use tracing::error;

/// Body of every rejected write
const PERMISSION_DENIED: &str = "Permission denied!";

/// Single entry point: reports, DDNS view and WAN view all live on `/`
pub async fn handle_root(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    let request = DiagRequest::from_query(params)?;
    let response = state.service.handle(request).await?;
    Ok(render::render(&response))
}

/// Maps library errors onto status codes
#[derive(Debug)]
pub struct AppError(Error);

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self.0 {
            Error::PermissionDenied(_) => (StatusCode::FORBIDDEN, PERMISSION_DENIED).into_response(),
            Error::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            err => {
                error!("Request failed: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}
