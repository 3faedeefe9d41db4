use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, patch, put},
};

/// Admin Router Module
///
/// Moderation endpoints, nested under `/admin`. Authentication comes from
/// the shared extractor; every handler then applies the `is_admin` policy
/// and answers 403 for everyone else.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin/notices?filter=need_approval|next
        // The moderation grid. need_approval is the review queue; next is
        // everything still within its dates; default is the whole table.
        .route("/notices", get(handlers::admin_notices))
        // PUT /admin/notices/{id}/approved
        // Flips the approval gate for one record.
        .route("/notices/{id}/approved", put(handlers::approve_notice))
        // PUT/DELETE /admin/notices/{id}
        // Row edit and row removal for the grid.
        .route(
            "/notices/{id}",
            put(handlers::update_notice_admin).delete(handlers::delete_notice),
        )
        // GET /admin/users
        // The account grid with registration_key, requires_approval and
        // is_admin widened to readable and writable.
        .route("/users", get(handlers::admin_users))
        // PATCH/DELETE /admin/users/{id}
        // Updates the widened fields (clearing registration_key approves a
        // registration) or removes the account.
        .route(
            "/users/{id}",
            patch(handlers::update_user_access).delete(handlers::delete_user),
        )
}
