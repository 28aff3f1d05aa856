use std::sync::Arc;

use axum::{middleware::from_fn_with_state, routing::MethodRouter};

use crate::middleware::auth::{require_auth, JwtAuth};
use crate::state::AppState;

pub mod contact_messages;
pub mod insights;
pub mod offices;
pub mod publications;
pub mod subscribers;
pub mod team;
pub mod users;

/// Puts a bearer-token check in front of every method on `route`.
pub(crate) fn protected(route: MethodRouter<AppState>, auth: &Arc<JwtAuth>) -> MethodRouter<AppState> {
    route.route_layer(from_fn_with_state(auth.clone(), require_auth))
}
