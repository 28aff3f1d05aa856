use std::sync::Arc;

use axum::{
    routing::{get, patch, post},
    Router,
};

use super::protected;
use crate::handlers::insights;
use crate::middleware::auth::JwtAuth;
use crate::state::AppState;

pub fn routes(auth: Arc<JwtAuth>) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(insights::get_insights).merge(protected(post(insights::create_insight), &auth)),
        )
        .route("/order", protected(patch(insights::update_insight_order), &auth))
        .route("/popular/all", get(insights::get_popular_insights))
        .route("/recent/all", get(insights::get_recent_insights))
        .route("/stats/monthly", protected(get(insights::get_insight_stats), &auth))
        .route("/author/:author_id", get(insights::get_insights_by_author))

        .route(
            "/:id",
            get(insights::get_insight).merge(protected(
                patch(insights::update_insight).delete(insights::delete_insight),
                &auth,
            )),
        )
        .route(
            "/:id/toggle-status",
            protected(patch(insights::toggle_insight_status), &auth),
        )
}
