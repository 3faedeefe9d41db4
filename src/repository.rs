use crate::listing::AdminNoticeFilter;
use crate::models::{
    AccessControlEntry, CreateNoticeRequest, MODIFY_ACTION, NOTICE_OBJECT, Notice,
    UpdateNoticeRequest, UpdateUserAccessRequest, User,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, query_builder::QueryBuilder};
use std::sync::Arc;
use uuid::Uuid;

const NOTICE_COLUMNS: &str = "id, title, description, image, link, priority, \
     event_start_date, finish_on, approved, created_on";

const USER_COLUMNS: &str = "id, email, registration_key, requires_approval, is_admin";

/// Repository Trait
///
/// The persistence contract behind every handler. Handlers hold an
/// `Arc<dyn Repository>`, so the Postgres implementation and the test mocks
/// are interchangeable.
///
/// Reads follow the log-and-default convention: failures are logged and
/// surface as an empty result. Writes that must not fail silently
/// (`create_notice`, `create_user`) return `Result` and are mapped to 500 at
/// the handler.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Notice retrieval ---
    /// The public board: approved, unexpired, newest first. This base order
    /// is part of the listing contract; `listing::arrange` builds on it.
    async fn visible_notices(&self, now: DateTime<Utc>) -> Vec<Notice>;
    /// The admin grid's row set for the given filter.
    async fn admin_notices(&self, filter: AdminNoticeFilter, now: DateTime<Utc>) -> Vec<Notice>;
    async fn get_notice(&self, id: Uuid) -> Option<Notice>;
    /// Case-insensitive title/description search for the data API.
    async fn search_notices(&self, term: &str) -> Vec<Notice>;

    // --- Notice actions ---
    /// Inserts the notice and the submitter's "Modificar" grant in one
    /// transaction; either both rows land or neither does.
    async fn create_notice(
        &self,
        req: CreateNoticeRequest,
        created_by: Uuid,
        approved: bool,
    ) -> Result<Notice, sqlx::Error>;
    /// Admin action: flips the approval gate.
    async fn set_notice_approved(&self, id: Uuid, approved: bool) -> Option<Notice>;
    /// Partial row edit. Uses COALESCE so absent fields keep their values.
    async fn update_notice(&self, id: Uuid, req: UpdateNoticeRequest) -> Option<Notice>;
    async fn delete_notice(&self, id: Uuid) -> bool;

    // --- Accounts ---
    async fn get_user(&self, id: Uuid) -> Option<User>;
    async fn create_user(&self, user: User) -> Result<User, sqlx::Error>;
    async fn list_users(&self) -> Vec<User>;
    /// Admin action: updates the normally-hidden moderation fields.
    async fn update_user_access(&self, id: Uuid, req: UpdateUserAccessRequest) -> Option<User>;
    async fn delete_user(&self, id: Uuid) -> bool;
    async fn search_users(&self, term: &str) -> Vec<User>;

    // --- Grants ---
    async fn grants_for(&self, subject: Uuid) -> Vec<AccessControlEntry>;
    async fn all_grants(&self) -> Vec<AccessControlEntry>;
}

/// RepositoryState
///
/// The shared handle placed in the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The concrete `Repository` backed by PostgreSQL. Queries use the runtime
/// `query_as` / `QueryBuilder` forms with bound parameters throughout.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn visible_notices(&self, now: DateTime<Utc>) -> Vec<Notice> {
        let sql = format!(
            "SELECT {NOTICE_COLUMNS} FROM notices \
             WHERE approved = TRUE AND finish_on > $1 \
             ORDER BY created_on DESC"
        );
        match sqlx::query_as::<_, Notice>(&sql)
            .bind(now)
            .fetch_all(&self.pool)
            .await
        {
            Ok(rows) => rows,
            Err(e) => {
                tracing::error!("visible_notices error: {:?}", e);
                vec![]
            }
        }
    }

    /// admin_notices
    ///
    /// Builds the grid predicate with QueryBuilder so every variant stays a
    /// bound-parameter query.
    async fn admin_notices(&self, filter: AdminNoticeFilter, now: DateTime<Utc>) -> Vec<Notice> {
        let mut builder: QueryBuilder<sqlx::Postgres> =
            QueryBuilder::new(format!("SELECT {NOTICE_COLUMNS} FROM notices WHERE TRUE"));

        match filter {
            AdminNoticeFilter::NeedApproval => {
                builder.push(" AND approved = FALSE AND finish_on > ");
                builder.push_bind(now);
            }
            AdminNoticeFilter::Current => {
                builder.push(" AND finish_on > ");
                builder.push_bind(now);
            }
            AdminNoticeFilter::All => {}
        }

        builder.push(" ORDER BY created_on DESC");

        match builder
            .build_query_as::<Notice>()
            .fetch_all(&self.pool)
            .await
        {
            Ok(rows) => rows,
            Err(e) => {
                tracing::error!("admin_notices error: {:?}", e);
                vec![]
            }
        }
    }

    async fn get_notice(&self, id: Uuid) -> Option<Notice> {
        let sql = format!("SELECT {NOTICE_COLUMNS} FROM notices WHERE id = $1");
        sqlx::query_as::<_, Notice>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_notice error: {:?}", e);
                None
            })
    }

    async fn search_notices(&self, term: &str) -> Vec<Notice> {
        let mut builder: QueryBuilder<sqlx::Postgres> =
            QueryBuilder::new(format!("SELECT {NOTICE_COLUMNS} FROM notices WHERE (title ILIKE "));
        let pattern = format!("%{}%", term);
        builder.push_bind(pattern.clone());
        builder.push(" OR description ILIKE ");
        builder.push_bind(pattern);
        builder.push(") ORDER BY created_on DESC");

        match builder
            .build_query_as::<Notice>()
            .fetch_all(&self.pool)
            .await
        {
            Ok(rows) => rows,
            Err(e) => {
                tracing::error!("search_notices error: {:?}", e);
                vec![]
            }
        }
    }

    /// create_notice
    ///
    /// The insert and the submitter's grant commit together; a failure on
    /// either side rolls the whole submission back.
    async fn create_notice(
        &self,
        req: CreateNoticeRequest,
        created_by: Uuid,
        approved: bool,
    ) -> Result<Notice, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let insert_sql = format!(
            "INSERT INTO notices \
             (id, title, description, image, link, priority, event_start_date, finish_on, approved, created_on) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW()) \
             RETURNING {NOTICE_COLUMNS}"
        );
        let notice = sqlx::query_as::<_, Notice>(&insert_sql)
            .bind(Uuid::new_v4())
            .bind(&req.title)
            .bind(&req.description)
            .bind(&req.image)
            .bind(&req.link)
            .bind(req.priority)
            .bind(req.event_start_date)
            .bind(req.finish_on)
            .bind(approved)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO access_control (subject, action, object_type, object_id, granted_on) \
             VALUES ($1, $2, $3, $4, NOW())",
        )
        .bind(created_by)
        .bind(MODIFY_ACTION)
        .bind(NOTICE_OBJECT)
        .bind(notice.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(notice)
    }

    async fn set_notice_approved(&self, id: Uuid, approved: bool) -> Option<Notice> {
        let sql = format!(
            "UPDATE notices SET approved = $1 WHERE id = $2 RETURNING {NOTICE_COLUMNS}"
        );
        sqlx::query_as::<_, Notice>(&sql)
            .bind(approved)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("set_notice_approved error: {:?}", e);
                None
            })
    }

    async fn update_notice(&self, id: Uuid, req: UpdateNoticeRequest) -> Option<Notice> {
        let sql = format!(
            "UPDATE notices \
             SET title = COALESCE($2, title), \
                 description = COALESCE($3, description), \
                 image = COALESCE($4, image), \
                 link = COALESCE($5, link), \
                 priority = COALESCE($6, priority), \
                 event_start_date = COALESCE($7, event_start_date), \
                 finish_on = COALESCE($8, finish_on) \
             WHERE id = $1 \
             RETURNING {NOTICE_COLUMNS}"
        );
        sqlx::query_as::<_, Notice>(&sql)
            .bind(id)
            .bind(req.title)
            .bind(req.description)
            .bind(req.image)
            .bind(req.link)
            .bind(req.priority)
            .bind(req.event_start_date)
            .bind(req.finish_on)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("update_notice error: {:?}", e);
                None
            })
    }

    async fn delete_notice(&self, id: Uuid) -> bool {
        match sqlx::query("DELETE FROM notices WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_notice error: {:?}", e);
                false
            }
        }
    }

    async fn get_user(&self, id: Uuid) -> Option<User> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or(None)
    }

    async fn create_user(&self, user: User) -> Result<User, sqlx::Error> {
        let sql = format!(
            "INSERT INTO users (id, email, registration_key, requires_approval, is_admin) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(user.id)
            .bind(&user.email)
            .bind(&user.registration_key)
            .bind(user.requires_approval)
            .bind(user.is_admin)
            .fetch_one(&self.pool)
            .await
    }

    async fn list_users(&self) -> Vec<User> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY email ASC");
        match sqlx::query_as::<_, User>(&sql).fetch_all(&self.pool).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::error!("list_users error: {:?}", e);
                vec![]
            }
        }
    }

    async fn update_user_access(&self, id: Uuid, req: UpdateUserAccessRequest) -> Option<User> {
        let sql = format!(
            "UPDATE users \
             SET registration_key = COALESCE($2, registration_key), \
                 requires_approval = COALESCE($3, requires_approval), \
                 is_admin = COALESCE($4, is_admin) \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(req.registration_key)
            .bind(req.requires_approval)
            .bind(req.is_admin)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("update_user_access error: {:?}", e);
                None
            })
    }

    async fn delete_user(&self, id: Uuid) -> bool {
        match sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_user error: {:?}", e);
                false
            }
        }
    }

    async fn search_users(&self, term: &str) -> Vec<User> {
        let mut builder: QueryBuilder<sqlx::Postgres> =
            QueryBuilder::new(format!("SELECT {USER_COLUMNS} FROM users WHERE email ILIKE "));
        builder.push_bind(format!("%{}%", term));
        builder.push(" ORDER BY email ASC");

        match builder.build_query_as::<User>().fetch_all(&self.pool).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::error!("search_users error: {:?}", e);
                vec![]
            }
        }
    }

    async fn grants_for(&self, subject: Uuid) -> Vec<AccessControlEntry> {
        sqlx::query_as::<_, AccessControlEntry>(
            "SELECT id, subject, action, object_type, object_id, granted_on \
             FROM access_control WHERE subject = $1 ORDER BY granted_on ASC",
        )
        .bind(subject)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("grants_for error: {:?}", e);
            vec![]
        })
    }

    async fn all_grants(&self) -> Vec<AccessControlEntry> {
        sqlx::query_as::<_, AccessControlEntry>(
            "SELECT id, subject, action, object_type, object_id, granted_on \
             FROM access_control ORDER BY granted_on ASC",
        )
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("all_grants error: {:?}", e);
            vec![]
        })
    }
}
