use std::sync::Arc;

use axum::{
    routing::{get, patch, post},
    Router,
};

use super::protected;
use crate::handlers::publications;
use crate::middleware::auth::JwtAuth;
use crate::state::AppState;

pub fn routes(auth: Arc<JwtAuth>) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(publications::get_publications)
                .merge(protected(post(publications::create_publication), &auth)),
        )
        .route(
            "/:id",
            get(publications::get_publication_by_id).merge(protected(
                patch(publications::update_publication).delete(publications::delete_publication),
                &auth,
            )),
        )
}
