use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::version::build_info;

pub async fn handler() -> Response {
    Json(build_info()).into_response()
}
