use std::sync::Arc;

use axum::{
    routing::{get, patch, post},
    Router,
};

use super::protected;
use crate::handlers::subscribers;
use crate::middleware::auth::JwtAuth;
use crate::state::AppState;

pub fn routes(auth: Arc<JwtAuth>) -> Router<AppState> {
    Router::new()
        // Public
        .route("/subscribe", post(subscribers::subscribe))
        .route("/unsubscribe", post(subscribers::unsubscribe))

        // Admin
        .route("/", protected(get(subscribers::get_subscribers), &auth))
        .route("/stats/monthly", protected(get(subscribers::get_subscriber_stats), &auth))
        .route(
            "/:id/unsubscribe",
            protected(patch(subscribers::unsubscribe_by_id), &auth),
        )
}
