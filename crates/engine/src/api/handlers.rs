use axum::{
    body::Body,
    extract::{rejection::JsonRejection, Json, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use futures_util::stream;
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use switchboard_shared::{get_tools, QueryRequest};

use crate::router::{response, Dispatcher};

fn bad_request(message: impl Into<String>) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message.into() }))).into_response()
}

/// Routes one query and streams the result back as a single JSON line.
///
/// The response is fully assembled before the body starts, so a caller
/// never sees a partial object. Dropping the connection drops this future
/// and any upstream call still in flight.
pub async fn handle_query(
    State(dispatcher): State<Arc<Dispatcher>>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return bad_request(rejection.body_text()),
    };

    if request.query.trim().is_empty() {
        return bad_request("query must not be empty");
    }

    // Echoed back exactly as sent.
    let routed = dispatcher.dispatch(&request.query).await;

    let chunk = match response::to_chunk(&routed) {
        Ok(chunk) => chunk,
        Err(e) => {
            log::error!("Failed to serialize response: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "failed to serialize response" })),
            )
                .into_response();
        }
    };

    let body = Body::from_stream(stream::once(async move { Ok::<_, Infallible>(chunk) }));
    ([(header::CONTENT_TYPE, "application/json")], body).into_response()
}

pub async fn health_check() -> Json<serde_json::Value> {
    Json(json!({ "message": "Switchboard router is running" }))
}

pub async fn list_tools() -> impl IntoResponse {
    Json(get_tools())
}
