use crate::{
    AppState,
    auth::{self, AuthUser},
    config::AppConfig,
    listing::{self, AdminNoticeParams, NewFlag, NoticeListParams},
    models::{
        self, CreateNoticeRequest, GridColumn, MODIFY_ACTION, NOTICE_OBJECT, NoticeBoardView,
        NoticeFormView, NoticeGridView, PresignedUrlRequest, PresignedUrlResponse,
        RegisterUserRequest, SignedUrl, UpdateNoticeRequest, UpdateUserAccessRequest, User,
        UserGridView, UserProfile, notice_form_fields,
    },
    storage,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, Uri, header},
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

// --- Flash messages (post-redirect and form states) ---

pub const FLASH_ADDED: &str = "Su aviso fue agregado con éxito";
pub const FLASH_PENDING: &str = "Su aviso está esperando aprobación";
pub const FLASH_FIX_ERRORS: &str = "Corrija los errores";
pub const FLASH_FILL_FIELDS: &str = "Llene todos los campos";

/// AuthSignupResponse
///
/// Minimal shape of the external identity provider's signup reply; only the
/// new account's UUID matters here.
#[derive(Deserialize)]
struct AuthSignupResponse {
    id: Uuid,
}

// --- Public board ---

/// list_notices
///
/// [Public Route] The board itself: approved, unexpired notices, ordered and
/// filtered by the request parameters. Unrecognized parameter values behave
/// like absent ones. The `new` parameter only selects the post-redirect
/// flash.
#[utoipa::path(
    get,
    path = "/notices",
    params(NoticeListParams),
    responses((status = 200, description = "The visible board", body = NoticeBoardView))
)]
pub async fn list_notices(
    State(state): State<AppState>,
    Query(params): Query<NoticeListParams>,
) -> Json<NoticeBoardView> {
    let base = state.repo.visible_notices(Utc::now()).await;
    let avisos = listing::arrange(base, params.order(), params.record_filter());

    let flash = params.new_flag().map(|flag| {
        match flag {
            NewFlag::Published => FLASH_ADDED,
            NewFlag::Pending => FLASH_PENDING,
        }
        .to_string()
    });

    Json(NoticeBoardView { flash, avisos })
}

// --- Submission ---

/// new_notice_form
///
/// [Authenticated Route] First render of the submission form: the field
/// schema with its labels and help texts, plus whether this user's
/// submissions go through review.
#[utoipa::path(
    get,
    path = "/notices/new",
    responses((status = 200, description = "Submission form schema", body = NoticeFormView))
)]
pub async fn new_notice_form(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<NoticeFormView>, StatusCode> {
    let user = state.repo.get_user(id).await.ok_or(StatusCode::UNAUTHORIZED)?;

    Ok(Json(NoticeFormView {
        flash: FLASH_FILL_FIELDS.to_string(),
        requires_review: user.requires_approval,
        form: notice_form_fields(),
    }))
}

/// submit_notice
///
/// [Authenticated Route] Accepts a new notice. The record's `approved` flag
/// is the negation of the submitter's `requires_approval`, read at
/// submission time. On success the submitter's "Modificar" grant is written
/// in the same transaction as the insert, and the reply redirects to the
/// board with `new=y` (published) or `new=requires` (pending review).
/// Invalid input re-renders the form with a generic flash and touches
/// nothing.
#[utoipa::path(
    post,
    path = "/notices",
    request_body = CreateNoticeRequest,
    responses(
        (status = 303, description = "Created; redirect carries the status flag"),
        (status = 422, description = "Validation failed", body = NoticeFormView)
    )
)]
pub async fn submit_notice(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateNoticeRequest>,
) -> Response {
    let Some(user) = state.repo.get_user(id).await else {
        return StatusCode::UNAUTHORIZED.into_response();
    };

    if payload.validate().is_err() {
        let view = NoticeFormView {
            flash: FLASH_FIX_ERRORS.to_string(),
            requires_review: user.requires_approval,
            form: notice_form_fields(),
        };
        return (StatusCode::UNPROCESSABLE_ENTITY, Json(view)).into_response();
    }

    let approved = !user.requires_approval;

    match state.repo.create_notice(payload, id, approved).await {
        Ok(_notice) => {
            let flag = if approved {
                NewFlag::Published
            } else {
                NewFlag::Pending
            };
            Redirect::to(&format!("/notices?new={}", flag.as_param())).into_response()
        }
        Err(e) => {
            tracing::error!("submit_notice insert error: {:?}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

// --- Admin: notices ---

fn notice_grid_columns() -> Vec<GridColumn> {
    let writable = [
        "title",
        "description",
        "image",
        "link",
        "priority",
        "event_start_date",
        "finish_on",
        "approved",
    ];
    let fixed = ["id", "created_on"];

    fixed
        .iter()
        .map(|name| (name, false))
        .chain(writable.iter().map(|name| (name, true)))
        .map(|(name, writable)| GridColumn {
            name: name.to_string(),
            readable: true,
            writable,
        })
        .collect()
}

fn user_grid_columns() -> Vec<GridColumn> {
    // The last three are the normally-hidden fields the admin grid widens.
    [
        ("id", false),
        ("email", false),
        ("registration_key", true),
        ("requires_approval", true),
        ("is_admin", true),
    ]
    .iter()
    .map(|(name, writable)| GridColumn {
        name: name.to_string(),
        readable: true,
        writable: *writable,
    })
    .collect()
}

/// admin_notices
///
/// [Admin Route] The moderation grid. `filter=need_approval` shows the
/// review queue (unapproved, unexpired), `filter=next` everything unexpired,
/// anything else the whole table.
#[utoipa::path(
    get,
    path = "/admin/notices",
    params(AdminNoticeParams),
    responses(
        (status = 200, description = "Notice grid", body = NoticeGridView),
        (status = 403, description = "Not an administrator")
    )
)]
pub async fn admin_notices(
    user: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<AdminNoticeParams>,
) -> Result<Json<NoticeGridView>, StatusCode> {
    if !auth::is_admin(&user) {
        return Err(StatusCode::FORBIDDEN);
    }

    let grid = state
        .repo
        .admin_notices(params.row_filter(), Utc::now())
        .await;

    Ok(Json(NoticeGridView {
        columns: notice_grid_columns(),
        grid,
    }))
}

/// approve_notice
///
/// [Admin Route] Grid row action: sets the approval gate. This is the only
/// way `approved` changes after creation.
#[utoipa::path(
    put,
    path = "/admin/notices/{id}/approved",
    params(("id" = Uuid, Path, description = "Notice ID")),
    request_body = bool,
    responses(
        (status = 200, description = "Updated", body = models::Notice),
        (status = 404, description = "Not Found")
    )
)]
pub async fn approve_notice(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(approved): Json<bool>,
) -> Result<Json<models::Notice>, StatusCode> {
    if !auth::is_admin(&user) {
        return Err(StatusCode::FORBIDDEN);
    }
    match state.repo.set_notice_approved(id, approved).await {
        Some(notice) => Ok(Json(notice)),
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// update_notice_admin
///
/// [Admin Route] Grid row action: partial edit of a notice row.
#[utoipa::path(
    put,
    path = "/admin/notices/{id}",
    params(("id" = Uuid, Path, description = "Notice ID")),
    request_body = UpdateNoticeRequest,
    responses((status = 200, description = "Updated", body = models::Notice))
)]
pub async fn update_notice_admin(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateNoticeRequest>,
) -> Result<Json<models::Notice>, StatusCode> {
    if !auth::is_admin(&user) {
        return Err(StatusCode::FORBIDDEN);
    }
    match state.repo.update_notice(id, payload).await {
        Some(notice) => Ok(Json(notice)),
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// delete_notice
///
/// [Admin Route] Grid row action: removes a notice.
#[utoipa::path(
    delete,
    path = "/admin/notices/{id}",
    params(("id" = Uuid, Path, description = "Notice ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_notice(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> StatusCode {
    if !auth::is_admin(&user) {
        return StatusCode::FORBIDDEN;
    }
    if state.repo.delete_notice(id).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

// --- Admin: user accounts ---

/// admin_users
///
/// [Admin Route] The account grid, with `registration_key`,
/// `requires_approval` and `is_admin` widened to readable and writable.
/// Clearing a registration key is how a pending registration gets approved.
#[utoipa::path(
    get,
    path = "/admin/users",
    responses(
        (status = 200, description = "User grid", body = UserGridView),
        (status = 403, description = "Not an administrator")
    )
)]
pub async fn admin_users(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UserGridView>, StatusCode> {
    if !auth::is_admin(&user) {
        return Err(StatusCode::FORBIDDEN);
    }

    Ok(Json(UserGridView {
        columns: user_grid_columns(),
        grid: state.repo.list_users().await,
    }))
}

/// update_user_access
///
/// [Admin Route] Grid row action: updates exactly the widened account
/// fields.
#[utoipa::path(
    patch,
    path = "/admin/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateUserAccessRequest,
    responses((status = 200, description = "Updated", body = User))
)]
pub async fn update_user_access(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserAccessRequest>,
) -> Result<Json<User>, StatusCode> {
    if !auth::is_admin(&user) {
        return Err(StatusCode::FORBIDDEN);
    }
    match state.repo.update_user_access(id, payload).await {
        Some(updated) => Ok(Json(updated)),
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// delete_user
///
/// [Admin Route] Grid row action: removes an account.
#[utoipa::path(
    delete,
    path = "/admin/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_user(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> StatusCode {
    if !auth::is_admin(&user) {
        return StatusCode::FORBIDDEN;
    }
    if state.repo.delete_user(id).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

// --- Accounts ---

/// register_user
///
/// [Public Route] Registration against the external identity provider, then
/// a mirrored local account row keyed by the provider's UUID. New accounts
/// start with a pending registration key and `requires_approval = true`;
/// both are relaxed through the admin user grid.
#[utoipa::path(
    post,
    path = "/user/register",
    request_body = RegisterUserRequest,
    responses((status = 200, description = "Registered, pending approval", body = User))
)]
pub async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<RegisterUserRequest>,
) -> Result<Json<User>, StatusCode> {
    let client = reqwest::Client::new();
    let signup_url = format!("{}/auth/v1/signup", state.config.auth_url);

    let response = client
        .post(signup_url)
        .json(&serde_json::json!({ "email": payload.email, "password": payload.password }))
        .send()
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if !response.status().is_success() {
        // The provider rejected the signup (duplicate email, weak password).
        return Err(StatusCode::BAD_REQUEST);
    }

    let identity = response
        .json::<AuthSignupResponse>()
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let new_user = User {
        id: identity.id,
        email: payload.email,
        registration_key: "pending".to_string(),
        requires_approval: true,
        is_admin: false,
    };

    match state.repo.create_user(new_user).await {
        Ok(created) => Ok(Json(created)),
        Err(e) => {
            tracing::error!("register_user insert error: {:?}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// get_me
///
/// [Authenticated Route] The caller's own profile, without the moderation
/// fields.
#[utoipa::path(
    get,
    path = "/user/me",
    responses((status = 200, description = "Profile", body = UserProfile))
)]
pub async fn get_me(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UserProfile>, StatusCode> {
    let user = state.repo.get_user(id).await.ok_or(StatusCode::UNAUTHORIZED)?;
    Ok(Json(UserProfile {
        id: user.id,
        email: user.email,
        is_admin: user.is_admin,
    }))
}

// --- Files ---

/// download_file
///
/// [Public Route] Streams a previously uploaded object by name.
/// Directory-navigation segments are stripped from the requested name before
/// it reaches the store.
#[utoipa::path(
    get,
    path = "/download/{name}",
    params(("name" = String, Path, description = "Object name")),
    responses(
        (status = 200, description = "File contents"),
        (status = 404, description = "No such file")
    )
)]
pub async fn download_file(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    let key = storage::sanitize_key(&name);
    if key.is_empty() {
        return StatusCode::NOT_FOUND.into_response();
    }

    match state.storage.download(&key).await {
        Ok(file) => ([(header::CONTENT_TYPE, file.content_type)], file.bytes).into_response(),
        Err(e) => {
            tracing::warn!("download miss for {}: {}", key, e);
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

/// get_presigned_url
///
/// [Authenticated Route] Mints a short-lived direct-upload URL for a notice
/// image. The object key is freshly generated; the client stores it in the
/// notice's `image` field after uploading.
#[utoipa::path(
    post,
    path = "/upload/presigned",
    request_body = PresignedUrlRequest,
    responses((status = 200, description = "URL", body = PresignedUrlResponse))
)]
pub async fn get_presigned_url(
    _user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<PresignedUrlRequest>,
) -> impl IntoResponse {
    let extension = std::path::Path::new(&payload.filename)
        .extension()
        .and_then(std::ffi::OsStr::to_str)
        .unwrap_or("bin");
    let object_key = format!("uploads/{}.{}", Uuid::new_v4(), extension);

    match state
        .storage
        .get_presigned_upload_url(&object_key, &payload.file_type)
        .await
    {
        Ok(url) => (
            StatusCode::OK,
            Json(PresignedUrlResponse {
                upload_url: url,
                resource_key: object_key,
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("presign error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

// --- Service calls ---

/// list_services
///
/// [Public Route] Names of the registered remote-callable functions. None
/// are registered out of the box.
#[utoipa::path(
    get,
    path = "/call",
    responses((status = 200, description = "Registered service names", body = [String]))
)]
pub async fn list_services(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.services.names())
}

/// call_service
///
/// [Public Route] Dispatches a registered service by name with the request
/// body as its arguments. Unknown names are 404; a service-reported error is
/// 400 with the message.
#[utoipa::path(
    post,
    path = "/call/{name}",
    params(("name" = String, Path, description = "Service name")),
    responses(
        (status = 200, description = "Service result"),
        (status = 400, description = "Service error"),
        (status = 404, description = "No such service")
    )
)]
pub async fn call_service(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(args): Json<Value>,
) -> Response {
    match state.services.dispatch(&name, args) {
        None => StatusCode::NOT_FOUND.into_response(),
        Some(Ok(value)) => Json(value).into_response(),
        Some(Err(message)) => (StatusCode::BAD_REQUEST, message).into_response(),
    }
}

// --- Signed data API ---

/// SignatureParams
///
/// The `sig` token every data-API request must carry.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct SignatureParams {
    pub sig: Option<String>,
}

/// DataSearchParams
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct DataSearchParams {
    pub q: Option<String>,
}

/// SignPathParams
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct SignPathParams {
    /// The data-API path to sign, e.g. `/data/tables`.
    pub path: String,
}

/// The tables reachable through the data API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DataTable {
    Notices,
    Users,
    Grants,
}

impl DataTable {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "notices" => Some(DataTable::Notices),
            "users" => Some(DataTable::Users),
            "access_control" => Some(DataTable::Grants),
            _ => None,
        }
    }
}

fn check_signature(
    config: &AppConfig,
    uri: &Uri,
    params: &SignatureParams,
) -> Result<(), StatusCode> {
    let token = params.sig.as_deref().ok_or(StatusCode::FORBIDDEN)?;
    if auth::verify_signed_path(&config.jwt_secret, uri.path(), token) {
        Ok(())
    } else {
        Err(StatusCode::FORBIDDEN)
    }
}

/// Signing policy: administrators may sign any data path; everyone else only
/// the notice table and the table listing.
fn may_sign(user: &AuthUser, path: &str) -> bool {
    if auth::is_admin(user) {
        return true;
    }
    path == "/data/tables" || path == "/data/notices" || path.starts_with("/data/notices/")
}

fn to_json<T: serde::Serialize>(value: T) -> Result<Json<Value>, StatusCode> {
    serde_json::to_value(value)
        .map(Json)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// sign_data_url
///
/// [Authenticated Route] Mints the signature that makes a data-API URL
/// reachable. Without one of these, the data routes refuse the request.
#[utoipa::path(
    get,
    path = "/sign",
    params(SignPathParams),
    responses(
        (status = 200, description = "Signed URL", body = SignedUrl),
        (status = 400, description = "Not a data-API path"),
        (status = 403, description = "Path not signable for this user")
    )
)]
pub async fn sign_data_url(
    user: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<SignPathParams>,
) -> Result<Json<SignedUrl>, StatusCode> {
    if !params.path.starts_with("/data/") {
        return Err(StatusCode::BAD_REQUEST);
    }
    if !may_sign(&user, &params.path) {
        return Err(StatusCode::FORBIDDEN);
    }

    let token = auth::sign_path(
        &state.config.jwt_secret,
        &params.path,
        auth::SIGNATURE_TTL_SECS,
    )?;

    Ok(Json(SignedUrl {
        url: format!("{}?sig={}", params.path, token),
    }))
}

/// data_tables
///
/// [Signed Route] The tables the data API serves.
#[utoipa::path(
    get,
    path = "/data/tables",
    params(SignatureParams),
    responses((status = 200, description = "Table names", body = [String]))
)]
pub async fn data_tables(
    State(state): State<AppState>,
    uri: Uri,
    Query(sig): Query<SignatureParams>,
) -> Result<Json<Vec<String>>, StatusCode> {
    check_signature(&state.config, &uri, &sig)?;
    Ok(Json(vec![
        "access_control".to_string(),
        "notices".to_string(),
        "users".to_string(),
    ]))
}

/// data_select
///
/// [Signed Route] Every row of a table.
#[utoipa::path(
    get,
    path = "/data/{table}",
    params(("table" = String, Path, description = "Table name"), SignatureParams),
    responses((status = 200, description = "Rows"))
)]
pub async fn data_select(
    State(state): State<AppState>,
    Path(table): Path<String>,
    uri: Uri,
    Query(sig): Query<SignatureParams>,
) -> Result<Json<Value>, StatusCode> {
    check_signature(&state.config, &uri, &sig)?;

    match DataTable::from_name(&table).ok_or(StatusCode::NOT_FOUND)? {
        DataTable::Notices => to_json(
            state
                .repo
                .admin_notices(listing::AdminNoticeFilter::All, Utc::now())
                .await,
        ),
        DataTable::Users => to_json(state.repo.list_users().await),
        DataTable::Grants => to_json(state.repo.all_grants().await),
    }
}

/// data_search
///
/// [Signed Route] Case-insensitive substring search. Notices match on title
/// and description, users on email.
#[utoipa::path(
    get,
    path = "/data/{table}/search",
    params(("table" = String, Path, description = "Table name"), DataSearchParams, SignatureParams),
    responses((status = 200, description = "Matching rows"))
)]
pub async fn data_search(
    State(state): State<AppState>,
    Path(table): Path<String>,
    uri: Uri,
    Query(sig): Query<SignatureParams>,
    Query(search): Query<DataSearchParams>,
) -> Result<Json<Value>, StatusCode> {
    check_signature(&state.config, &uri, &sig)?;
    let term = search.q.unwrap_or_default();

    match DataTable::from_name(&table).ok_or(StatusCode::NOT_FOUND)? {
        DataTable::Notices => to_json(state.repo.search_notices(&term).await),
        DataTable::Users => to_json(state.repo.search_users(&term).await),
        DataTable::Grants => Err(StatusCode::METHOD_NOT_ALLOWED),
    }
}

/// data_read
///
/// [Signed Route] A single row by id.
#[utoipa::path(
    get,
    path = "/data/{table}/{id}",
    params(
        ("table" = String, Path, description = "Table name"),
        ("id" = Uuid, Path, description = "Row ID"),
        SignatureParams
    ),
    responses((status = 200, description = "Row"), (status = 404, description = "Not Found"))
)]
pub async fn data_read(
    State(state): State<AppState>,
    Path((table, id)): Path<(String, Uuid)>,
    uri: Uri,
    Query(sig): Query<SignatureParams>,
) -> Result<Json<Value>, StatusCode> {
    check_signature(&state.config, &uri, &sig)?;

    match DataTable::from_name(&table).ok_or(StatusCode::NOT_FOUND)? {
        DataTable::Notices => match state.repo.get_notice(id).await {
            Some(notice) => to_json(notice),
            None => Err(StatusCode::NOT_FOUND),
        },
        DataTable::Users => match state.repo.get_user(id).await {
            Some(user) => to_json(user),
            None => Err(StatusCode::NOT_FOUND),
        },
        DataTable::Grants => Err(StatusCode::METHOD_NOT_ALLOWED),
    }
}

/// data_create
///
/// [Signed + Authenticated Route] Row creation. Supported for notices only:
/// the submission rules (approval default, "Modificar" grant) need a
/// submitting user, so the caller must authenticate on top of the
/// signature.
#[utoipa::path(
    post,
    path = "/data/{table}",
    params(("table" = String, Path, description = "Table name"), SignatureParams),
    request_body = CreateNoticeRequest,
    responses(
        (status = 201, description = "Created"),
        (status = 405, description = "Table does not support create")
    )
)]
pub async fn data_create(
    user: AuthUser,
    State(state): State<AppState>,
    Path(table): Path<String>,
    uri: Uri,
    Query(sig): Query<SignatureParams>,
    Json(payload): Json<Value>,
) -> Result<(StatusCode, Json<Value>), StatusCode> {
    check_signature(&state.config, &uri, &sig)?;

    match DataTable::from_name(&table).ok_or(StatusCode::NOT_FOUND)? {
        DataTable::Notices => {
            let req: CreateNoticeRequest =
                serde_json::from_value(payload).map_err(|_| StatusCode::UNPROCESSABLE_ENTITY)?;
            req.validate()
                .map_err(|_| StatusCode::UNPROCESSABLE_ENTITY)?;

            let submitter = state
                .repo
                .get_user(user.id)
                .await
                .ok_or(StatusCode::UNAUTHORIZED)?;

            match state
                .repo
                .create_notice(req, user.id, !submitter.requires_approval)
                .await
            {
                Ok(notice) => Ok((StatusCode::CREATED, to_json(notice)?)),
                Err(e) => {
                    tracing::error!("data_create insert error: {:?}", e);
                    Err(StatusCode::INTERNAL_SERVER_ERROR)
                }
            }
        }
        _ => Err(StatusCode::METHOD_NOT_ALLOWED),
    }
}

/// data_update
///
/// [Signed + Authenticated Route] Row update. A notice row may be edited by
/// an administrator or by a holder of the "Modificar" grant for that exact
/// record; user rows only by an administrator.
#[utoipa::path(
    put,
    path = "/data/{table}/{id}",
    params(
        ("table" = String, Path, description = "Table name"),
        ("id" = Uuid, Path, description = "Row ID"),
        SignatureParams
    ),
    responses((status = 200, description = "Updated"), (status = 403, description = "Not permitted"))
)]
pub async fn data_update(
    user: AuthUser,
    State(state): State<AppState>,
    Path((table, id)): Path<(String, Uuid)>,
    uri: Uri,
    Query(sig): Query<SignatureParams>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    check_signature(&state.config, &uri, &sig)?;

    match DataTable::from_name(&table).ok_or(StatusCode::NOT_FOUND)? {
        DataTable::Notices => {
            if !auth::is_admin(&user) && !holds_modify_grant(&state, user.id, id).await {
                return Err(StatusCode::FORBIDDEN);
            }
            let req: UpdateNoticeRequest =
                serde_json::from_value(payload).map_err(|_| StatusCode::UNPROCESSABLE_ENTITY)?;
            match state.repo.update_notice(id, req).await {
                Some(notice) => to_json(notice),
                None => Err(StatusCode::NOT_FOUND),
            }
        }
        DataTable::Users => {
            if !auth::is_admin(&user) {
                return Err(StatusCode::FORBIDDEN);
            }
            let req: UpdateUserAccessRequest =
                serde_json::from_value(payload).map_err(|_| StatusCode::UNPROCESSABLE_ENTITY)?;
            match state.repo.update_user_access(id, req).await {
                Some(updated) => to_json(updated),
                None => Err(StatusCode::NOT_FOUND),
            }
        }
        DataTable::Grants => Err(StatusCode::METHOD_NOT_ALLOWED),
    }
}

/// data_delete
///
/// [Signed + Authenticated Route] Row deletion; administrators only.
#[utoipa::path(
    delete,
    path = "/data/{table}/{id}",
    params(
        ("table" = String, Path, description = "Table name"),
        ("id" = Uuid, Path, description = "Row ID"),
        SignatureParams
    ),
    responses((status = 204, description = "Deleted"), (status = 403, description = "Not permitted"))
)]
pub async fn data_delete(
    user: AuthUser,
    State(state): State<AppState>,
    Path((table, id)): Path<(String, Uuid)>,
    uri: Uri,
    Query(sig): Query<SignatureParams>,
) -> StatusCode {
    if check_signature(&state.config, &uri, &sig).is_err() {
        return StatusCode::FORBIDDEN;
    }
    if !auth::is_admin(&user) {
        return StatusCode::FORBIDDEN;
    }

    let deleted = match DataTable::from_name(&table) {
        Some(DataTable::Notices) => state.repo.delete_notice(id).await,
        Some(DataTable::Users) => state.repo.delete_user(id).await,
        Some(DataTable::Grants) => return StatusCode::METHOD_NOT_ALLOWED,
        None => return StatusCode::NOT_FOUND,
    };

    if deleted {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

/// Whether `subject` holds the per-record "Modificar" grant for `object_id`.
async fn holds_modify_grant(state: &AppState, subject: Uuid, object_id: Uuid) -> bool {
    state.repo.grants_for(subject).await.iter().any(|grant| {
        grant.action == MODIFY_ACTION
            && grant.object_type == NOTICE_OBJECT
            && grant.object_id == object_id
    })
}
