use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{DateTime, Utc};
use notice_portal::{
    AppState, create_router,
    config::AppConfig,
    listing::AdminNoticeFilter,
    models::{
        AccessControlEntry, CreateNoticeRequest, Notice, UpdateNoticeRequest,
        UpdateUserAccessRequest, User,
    },
    repository::{Repository, RepositoryState},
    services::{ServiceRegistry, ServiceState},
    storage::{MockStorageService, StorageState},
};
use std::sync::Arc;
use tower::util::ServiceExt;
use uuid::Uuid;

// --- Empty repository: the routing tests only exercise the gates ---

#[derive(Default)]
struct EmptyRepo;

#[async_trait]
impl Repository for EmptyRepo {
    async fn visible_notices(&self, _now: DateTime<Utc>) -> Vec<Notice> {
        vec![]
    }
    async fn admin_notices(&self, _filter: AdminNoticeFilter, _now: DateTime<Utc>) -> Vec<Notice> {
        vec![]
    }
    async fn get_notice(&self, _id: Uuid) -> Option<Notice> {
        None
    }
    async fn search_notices(&self, _term: &str) -> Vec<Notice> {
        vec![]
    }
    async fn create_notice(
        &self,
        _req: CreateNoticeRequest,
        _created_by: Uuid,
        _approved: bool,
    ) -> Result<Notice, sqlx::Error> {
        Ok(Notice::default())
    }
    async fn set_notice_approved(&self, _id: Uuid, _approved: bool) -> Option<Notice> {
        None
    }
    async fn update_notice(&self, _id: Uuid, _req: UpdateNoticeRequest) -> Option<Notice> {
        None
    }
    async fn delete_notice(&self, _id: Uuid) -> bool {
        false
    }
    async fn get_user(&self, _id: Uuid) -> Option<User> {
        None
    }
    async fn create_user(&self, user: User) -> Result<User, sqlx::Error> {
        Ok(user)
    }
    async fn list_users(&self) -> Vec<User> {
        vec![]
    }
    async fn update_user_access(&self, _id: Uuid, _req: UpdateUserAccessRequest) -> Option<User> {
        None
    }
    async fn delete_user(&self, _id: Uuid) -> bool {
        false
    }
    async fn search_users(&self, _term: &str) -> Vec<User> {
        vec![]
    }
    async fn grants_for(&self, _subject: Uuid) -> Vec<AccessControlEntry> {
        vec![]
    }
    async fn all_grants(&self) -> Vec<AccessControlEntry> {
        vec![]
    }
}

fn app() -> axum::Router {
    let state = AppState {
        repo: Arc::new(EmptyRepo) as RepositoryState,
        storage: Arc::new(MockStorageService::new()) as StorageState,
        services: Arc::new(ServiceRegistry::new()) as ServiceState,
        config: AppConfig::default(),
    };
    create_router(state)
}

async fn get(path: &str) -> StatusCode {
    let response = app()
        .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
        .await
        .unwrap();
    response.status()
}

#[tokio::test]
async fn health_check_answers_ok() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"ok");
}

#[tokio::test]
async fn board_is_public() {
    assert_eq!(get("/notices").await, StatusCode::OK);
    // Unknown parameter values are not errors.
    assert_eq!(get("/notices?orderby=bogus&filter=bogus").await, StatusCode::OK);
}

#[tokio::test]
async fn submission_routes_require_a_session() {
    assert_eq!(get("/notices/new").await, StatusCode::UNAUTHORIZED);
    assert_eq!(get("/user/me").await, StatusCode::UNAUTHORIZED);
    assert_eq!(
        get("/sign?path=/data/tables").await,
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn admin_routes_require_a_session() {
    // The extractor runs inside the handler; no session resolves to 401
    // before the is_admin policy is ever consulted.
    assert_eq!(get("/admin/notices").await, StatusCode::UNAUTHORIZED);
    assert_eq!(get("/admin/users").await, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn data_routes_refuse_unsigned_urls() {
    assert_eq!(get("/data/tables").await, StatusCode::FORBIDDEN);
    assert_eq!(get("/data/notices").await, StatusCode::FORBIDDEN);
    assert_eq!(get("/data/notices/search?q=x").await, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_routes_are_not_found() {
    assert_eq!(get("/nope").await, StatusCode::NOT_FOUND);
}
