use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use crate::router::Dispatcher;

pub fn create_router() -> Router<Arc<Dispatcher>> {
    Router::new()
        .route("/", get(handlers::health_check))
        .route("/query", post(handlers::handle_query))
        .route("/tools", get(handlers::list_tools))
}

/// The full application with its dispatcher attached.
pub fn app(dispatcher: Arc<Dispatcher>) -> Router {
    create_router().with_state(dispatcher)
}
