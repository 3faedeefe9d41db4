use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Authenticated Router Module
///
/// Routes for any signed-in account. The `AuthUser` extractor layer above
/// this module guarantees every handler here runs with a resolved identity;
/// submission uses it for the approval default and the per-record grant.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /notices/new
        // First render of the submission form: field schema, labels, help
        // texts, and whether this user's submissions wait for review.
        .route("/notices/new", get(handlers::new_notice_form))
        // POST /notices
        // Submits a notice. Replies with a redirect to the board carrying
        // new=y (published) or new=requires (pending review).
        .route("/notices", post(handlers::submit_notice))
        // GET /user/me
        // The caller's own profile.
        .route("/user/me", get(handlers::get_me))
        // POST /upload/presigned
        // Mints a short-lived direct-upload URL for a notice image.
        .route("/upload/presigned", post(handlers::get_presigned_url))
        // GET /sign?path=/data/...
        // Mints the signature token that makes a data-API URL reachable.
        .route("/sign", get(handlers::sign_data_url))
}
