use axum::{Router, http::StatusCode, middleware::from_fn_with_state, routing::get};

use crate::integration::Env;
use crate::state::AppState;
use crate::{auth, event, group, message, upload};

/// Every route but `/health` sits behind the session check.
pub fn router(state: AppState, env: &Env) -> Router {
    let protected = Router::new()
        .merge(group::api(state.clone()))
        .merge(message::api(state.clone()))
        .merge(upload::api(state.clone()))
        .merge(event::api(state.clone()))
        .route_layer(from_fn_with_state(state, auth::middleware::authorize));

    Router::new()
        .route("/health", get(|| async { StatusCode::OK }))
        .merge(protected)
        .layer(env.cors())
}
