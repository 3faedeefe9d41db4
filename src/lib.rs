use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod handlers;
pub mod listing;
pub mod models;
pub mod repository;
pub mod services;
pub mod storage;

// Routing segregation (Public, Authenticated, Admin).
pub mod routes;
use auth::AuthUser;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use repository::{PostgresRepository, RepositoryState};
pub use services::{ServiceRegistry, ServiceState};
pub use storage::{MockStorageService, S3StorageClient, StorageState};

/// ApiDoc
///
/// Aggregates the OpenAPI documentation from the `#[utoipa::path]` and
/// `ToSchema` annotations. Served as JSON at `/api-docs/openapi.json` and
/// browsable at `/swagger-ui`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::list_notices, handlers::new_notice_form, handlers::submit_notice,
        handlers::admin_notices, handlers::approve_notice, handlers::update_notice_admin,
        handlers::delete_notice, handlers::admin_users, handlers::update_user_access,
        handlers::delete_user, handlers::register_user, handlers::get_me,
        handlers::download_file, handlers::get_presigned_url, handlers::list_services,
        handlers::call_service, handlers::sign_data_url, handlers::data_tables,
        handlers::data_select, handlers::data_search, handlers::data_read,
        handlers::data_create, handlers::data_update, handlers::data_delete
    ),
    components(
        schemas(
            models::Notice, models::User, models::AccessControlEntry,
            models::CreateNoticeRequest, models::UpdateNoticeRequest,
            models::UpdateUserAccessRequest, models::RegisterUserRequest,
            models::PresignedUrlRequest, models::PresignedUrlResponse,
            models::NoticeBoardView, models::NoticeFormView, models::FormField,
            models::GridColumn, models::NoticeGridView, models::UserGridView,
            models::UserProfile, models::SignedUrl,
        )
    ),
    tags(
        (name = "notice-portal", description = "Bulletin board API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single shared container for the application's services: persistence,
/// object storage, the service-call registry, and the immutable
/// configuration. Cloned per request; every member is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Repository layer over the Postgres pool.
    pub repo: RepositoryState,
    /// Object storage for notice images and downloads.
    pub storage: StorageState,
    /// Registered remote-callable functions for /call.
    pub services: ServiceState,
    /// The loaded environment configuration.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// Let extractors pull individual services out of the shared state.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for ServiceState {
    fn from_ref(app_state: &AppState) -> ServiceState {
        app_state.services.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Gate for the authenticated route group. Extracting `AuthUser` performs
/// the whole check: a request without a resolvable identity is rejected with
/// 401 before any handler runs.
async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// create_router
///
/// Assembles the full routing table, the auth layer for the protected
/// group, and the observability stack.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Public routes: no middleware.
        .merge(public::public_routes())
        // Authenticated routes behind the extractor gate.
        .merge(
            authenticated::authenticated_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        )
        // Admin routes: authentication via the extractor in each handler,
        // authorization via the is_admin policy inside.
        .nest("/admin", admin::admin_routes())
        .with_state(state);

    // Request correlation and tracing, applied outermost.
    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span factory for `TraceLayer`: one span per request, tagged with the
/// method, URI and the generated request id so log lines correlate.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
