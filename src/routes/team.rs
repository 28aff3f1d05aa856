use std::sync::Arc;

use axum::{
    routing::{get, patch, post, put},
    Router,
};

use super::protected;
use crate::handlers::team;
use crate::middleware::auth::JwtAuth;
use crate::state::AppState;

pub fn routes(auth: Arc<JwtAuth>) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(team::get_all_team_members).merge(protected(post(team::create_team_member), &auth)),
        )
        .route("/reorder", protected(put(team::reorder_team_members), &auth))
        .route("/swap", protected(post(team::swap_team_member_order), &auth))
        .route(
            "/:id",
            get(team::get_team_member_by_id).merge(protected(
                patch(team::update_team_member).delete(team::delete_team_member),
                &auth,
            )),
        )
}
