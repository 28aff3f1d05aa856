use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};

use super::protected;
use crate::handlers::offices;
use crate::middleware::auth::JwtAuth;
use crate::state::AppState;

pub fn routes(auth: Arc<JwtAuth>) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(offices::get_all_offices).merge(protected(post(offices::create_office), &auth)),
        )
        .route(
            "/:id",
            get(offices::get_office_by_id).merge(protected(
                put(offices::update_office).delete(offices::delete_office),
                &auth,
            )),
        )
}
