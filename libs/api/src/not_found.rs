use axum::{http::StatusCode, Json};
use serde_json::{json, Value};

pub(super) async fn get_404() -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "not found" })))
}
