use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable without a session. The board handler only ever sees
/// rows the repository already restricted to `approved = true AND finish_on
/// > now`; the data routes are gated by their URL signature instead of a
/// session, and `data_create`/`data_update`/`data_delete` additionally pull
/// an `AuthUser` themselves.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for monitors and load balancers.
        .route("/health", get(|| async { "ok" }))
        // GET /notices?orderby=...&filter=...&new=...
        // The board. `orderby` picks cron (oldest first) or next (soonest to
        // expire); `filter` picks notices or events; `new` only selects the
        // post-redirect flash.
        .route("/notices", get(handlers::list_notices))
        // POST /user/register
        // Signup against the external identity provider plus the mirrored
        // local account row, left pending for an administrator.
        .route("/user/register", post(handlers::register_user))
        // GET /download/{name}
        // Streams an uploaded object (notice images) by sanitized name.
        .route("/download/{*name}", get(handlers::download_file))
        // GET /call, POST /call/{name}
        // The service-call dispatcher. Nothing is registered by default.
        .route("/call", get(handlers::list_services))
        .route("/call/{name}", post(handlers::call_service))
        // The data API. Every route below demands a valid `sig` token minted
        // by GET /sign; nothing here is reachable from an unsigned URL.
        .route("/data/tables", get(handlers::data_tables))
        .route(
            "/data/{table}",
            get(handlers::data_select).post(handlers::data_create),
        )
        .route("/data/{table}/search", get(handlers::data_search))
        .route(
            "/data/{table}/{id}",
            get(handlers::data_read)
                .put(handlers::data_update)
                .delete(handlers::data_delete),
        )
}
