use axum::extract::DefaultBodyLimit;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;
use camli_protocol::endpoints;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::auth::require_auth;
use crate::handler;
use crate::state::AppState;

/// Build the axum router with all camli endpoints.
///
/// Blob GET/PUT and upload always require credentials. Preupload requires
/// them unless `allow_anonymous_preupload` is set.
pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route(
            endpoints::BLOB,
            get(handler::get_blob)
                .put(handler::put_blob)
                .fallback(handler::unsupported),
        )
        .route(
            endpoints::UPLOAD,
            post(handler::upload).fallback(handler::unsupported),
        )
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    let mut negotiation = Router::new().route(
        endpoints::PREUPLOAD,
        post(handler::preupload).fallback(handler::unsupported),
    );
    if !state.config.allow_anonymous_preupload {
        negotiation = negotiation.route_layer(from_fn_with_state(state.clone(), require_auth));
    }

    let limit = state.config.body_limit();
    Router::new()
        .route(endpoints::ROOT, get(handler::root_handler))
        .merge(protected)
        .merge(negotiation)
        .fallback(handler::unsupported)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
