use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

/// Action name recorded in the per-record grant created at submission time.
pub const MODIFY_ACTION: &str = "Modificar";
/// Object type the grant is scoped to.
pub const NOTICE_OBJECT: &str = "Aviso";

// --- Core Application Schemas (Mapped to Database) ---

/// Notice
///
/// A single bulletin record from the `public.notices` table. A notice with an
/// `event_start_date` is an event; one without is a plain notice. The record
/// is publicly visible only while `approved = true` and `finish_on` lies in
/// the future.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Notice {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    // Object key of an uploaded image, served through /download/{name}.
    pub image: Option<String>,
    pub link: Option<String>,
    // Display hint for the board view.
    pub priority: Option<i32>,
    // Present only for live events.
    pub event_start_date: Option<DateTime<Utc>>,
    #[ts(type = "string")]
    pub finish_on: DateTime<Utc>,
    // Set at creation from the submitter's requires_approval flag, flipped
    // afterwards only through the admin grid.
    pub approved: bool,
    #[ts(type = "string")]
    pub created_on: DateTime<Utc>,
}

impl Notice {
    /// An event carries a start date; a plain notice does not.
    pub fn is_event(&self) -> bool {
        self.event_start_date.is_some()
    }

    /// The public-listing invariant: `approved AND finish_on > now`.
    pub fn is_visible(&self, now: DateTime<Utc>) -> bool {
        self.approved && self.finish_on > now
    }
}

/// User
///
/// Account record from the `public.users` table. `registration_key` is empty
/// for active accounts; a non-empty key marks a registration still waiting
/// for an administrator. `requires_approval` forces the user's submissions
/// into the review queue.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub registration_key: String,
    pub requires_approval: bool,
    pub is_admin: bool,
}

/// AccessControlEntry
///
/// One row of the `public.access_control` table. The only per-record ACL in
/// the system: each successful submission appends exactly one
/// ("Modificar", "Aviso") grant scoped to the new notice id, in the same
/// transaction as the insert.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow, Default)]
pub struct AccessControlEntry {
    pub id: i64,
    pub subject: Uuid,
    pub action: String,
    pub object_type: String,
    pub object_id: Uuid,
    pub granted_on: DateTime<Utc>,
}

// --- Request Payloads (Input Schemas) ---

/// CreateNoticeRequest
///
/// Input payload for submitting a new notice (POST /notices). The `image`
/// field carries the object key obtained from the presigned upload flow.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateNoticeRequest {
    pub title: String,
    pub event_start_date: Option<DateTime<Utc>>,
    #[ts(type = "string")]
    pub finish_on: DateTime<Utc>,
    pub description: String,
    pub image: Option<String>,
    pub link: Option<String>,
    pub priority: Option<i32>,
}

impl CreateNoticeRequest {
    /// Structural validation only. Field-level messages belong to the form
    /// renderer; callers surface a single generic flash on failure.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.title.trim().is_empty() {
            return Err("title");
        }
        if self.description.trim().is_empty() {
            return Err("description");
        }
        if let Some(start) = self.event_start_date {
            if self.finish_on < start {
                return Err("finish_on");
            }
        }
        Ok(())
    }
}

/// UpdateNoticeRequest
///
/// Partial update payload for a notice row (admin grid edit and the data
/// API). `Option<T>` fields with `skip_serializing_if` keep the JSON payload
/// limited to the fields actually being changed.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateNoticeRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_start_date: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(type = "string | null")]
    pub finish_on: Option<DateTime<Utc>>,
}

/// UpdateUserAccessRequest
///
/// The admin-only partial update for the normally-hidden account fields.
/// These three fields are exactly the set the user grid widens to writable.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateUserAccessRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub requires_approval: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_admin: Option<bool>,
}

/// RegisterUserRequest
///
/// Input payload for the public registration endpoint (POST /user/register).
/// The password is passed through to the external identity provider and never
/// persisted or logged here.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RegisterUserRequest {
    pub email: String,
    pub password: String,
}

/// PresignedUrlRequest
///
/// Input payload for requesting a short-lived upload URL (POST
/// /upload/presigned), used for notice images.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct PresignedUrlRequest {
    /// The original filename, used to derive the file extension.
    #[schema(example = "cartel.png")]
    pub filename: String,
    /// The MIME type the generated URL is constrained to.
    #[schema(example = "image/png")]
    pub file_type: String,
}

/// PresignedUrlResponse
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct PresignedUrlResponse {
    /// The time-limited URL for the PUT request.
    pub upload_url: String,
    /// The object key to store in the notice's `image` field.
    pub resource_key: String,
}

// --- View Models (Output Schemas) ---

/// NoticeBoardView
///
/// The index view model: the ordered/filtered board plus the post-redirect
/// flash selected from the `new` query parameter.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct NoticeBoardView {
    pub flash: Option<String>,
    pub avisos: Vec<Notice>,
}

/// FormField
///
/// Field metadata handed to the form renderer: name, label, optional help
/// text, and whether the field must be filled.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct FormField {
    pub name: String,
    pub label: String,
    pub help: Option<String>,
    pub required: bool,
}

/// NoticeFormView
///
/// The submission form view model. `requires_review` tells the client up
/// front whether the submission will wait for an administrator.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct NoticeFormView {
    pub flash: String,
    pub requires_review: bool,
    pub form: Vec<FormField>,
}

/// GridColumn
///
/// Per-column visibility metadata for the admin grids. The user grid widens
/// `registration_key`, `requires_approval` and `is_admin` to writable.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct GridColumn {
    pub name: String,
    pub readable: bool,
    pub writable: bool,
}

/// NoticeGridView
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct NoticeGridView {
    pub columns: Vec<GridColumn>,
    pub grid: Vec<Notice>,
}

/// UserGridView
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UserGridView {
    pub columns: Vec<GridColumn>,
    pub grid: Vec<User>,
}

/// UserProfile
///
/// Output schema for the authenticated user's own profile (GET /user/me).
/// Deliberately narrower than `User`: the moderation fields stay hidden
/// outside the admin grid.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub is_admin: bool,
}

/// SignedUrl
///
/// A data-API URL carrying its signature token (GET /sign).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct SignedUrl {
    pub url: String,
}

/// The field metadata for the submission form, in the order the original
/// board renders them.
pub fn notice_form_fields() -> Vec<FormField> {
    fn field(name: &str, label: &str, help: Option<&str>, required: bool) -> FormField {
        FormField {
            name: name.to_string(),
            label: label.to_string(),
            help: help.map(str::to_string),
            required,
        }
    }

    vec![
        field("title", "Titulo", None, true),
        field(
            "event_start_date",
            "Inicia el",
            Some("Usado para eventos en vivo. Opcional."),
            false,
        ),
        field("finish_on", "Termina el", None, true),
        field(
            "description",
            "Descripción",
            Some("Puedes darle formato al texto como si usarás Wikipedia"),
            true,
        ),
        field("image", "Imagen", Some("Opcional"), false),
        field("link", "Enlace externo", Some("Opcional"), false),
        field(
            "priority",
            "Prioridad",
            Some("Da un formato distinto a su Aviso o Evento"),
            false,
        ),
    ]
}
