use std::sync::Arc;

use axum::{
    routing::{get, patch, post},
    Router,
};

use super::protected;
use crate::handlers::contact_messages;
use crate::middleware::auth::JwtAuth;
use crate::state::AppState;

pub fn routes(auth: Arc<JwtAuth>) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            post(contact_messages::create_contact_message)
                .merge(protected(get(contact_messages::get_contact_messages), &auth)),
        )
        .route(
            "/stats/monthly",
            protected(get(contact_messages::get_contact_message_stats), &auth),
        )
        .route(
            "/:id",
            protected(
                patch(contact_messages::update_contact_message_responded)
                    .delete(contact_messages::delete_message),
                &auth,
            ),
        )
}
