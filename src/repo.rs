use async_trait::async_trait;

use crate::models::*;

#[derive(thiserror::Error, Debug)]
pub enum RepoError {
    #[error("{0}")] Validation(String),
    #[error("{0}")] NotFound(String),
    #[error("{0}")] InvalidCredential(String),
    #[error("{0}")] AlreadyClosed(String),
    #[error("{0}")] Closed(String),
    #[error("{0}")] Expired(String),
    #[error("{0}")] Gateway(String),
}

impl RepoError {
    /// Kind identifier surfaced to clients next to the message.
    pub fn name(&self) -> &'static str {
        match self {
            RepoError::Validation(_) => "ValidationError",
            RepoError::NotFound(_) => "NotFound",
            RepoError::InvalidCredential(_) => "InvalidCredential",
            RepoError::AlreadyClosed(_) => "AlreadyClosed",
            RepoError::Closed(_) => "Closed",
            RepoError::Expired(_) => "Expired",
            RepoError::Gateway(_) => "GatewayFailure",
        }
    }
}

pub type RepoResult<T> = Result<T, RepoError>;

const REPORT_MISSING: &str = "Report does not exist with that id";
const COMMENT_TARGET_MISSING: &str = "That report does not exist, no comment has been made";

#[async_trait]
pub trait ReportRepo: Send + Sync {
    /// Open reports with comments attached, `isExpired` computed and password stripped.
    async fn list_open_reports(&self) -> RepoResult<Vec<Report>>;
    async fn create_report(&self, new: NewReport) -> RepoResult<Report>;
    /// Raw row lookup (password included) for callers doing their own checks.
    async fn get_report(&self, id: Id) -> RepoResult<Option<StoredReport>>;
    async fn close_report(&self, id: Id, password: Option<&str>) -> RepoResult<CloseAck>;
}

#[async_trait]
pub trait CommentRepo: Send + Sync {
    /// Adds a comment and pushes the parent's deadline out to a day from now.
    async fn create_comment(&self, report_id: Id, new: NewComment) -> RepoResult<Comment>;
}

pub trait Repo: ReportRepo + CommentRepo {}

impl<T> Repo for T where T: ReportRepo + CommentRepo {}

#[cfg(feature = "inmem-store")]
pub mod inmem {
    use super::*;
    use chrono::{DateTime, Utc};
    use std::collections::BTreeMap;
    use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
    use tracing::info;

    #[derive(Default)]
    struct State {
        reports: BTreeMap<Id, StoredReport>,
        comments: BTreeMap<Id, Comment>,
        next_report_id: Id,
        next_comment_id: Id,
    }

    /// Process-local backend. Each step of a multi-step operation takes the
    /// lock separately, so interleavings match the Postgres backend.
    #[derive(Clone, Default)]
    pub struct InMemRepo {
        state: Arc<RwLock<State>>,
    }

    impl InMemRepo {
        pub fn new() -> Self {
            Self::default()
        }

        fn read(&self) -> RwLockReadGuard<'_, State> {
            self.state.read().unwrap_or_else(PoisonError::into_inner)
        }

        fn write(&self) -> RwLockWriteGuard<'_, State> {
            self.state.write().unwrap_or_else(PoisonError::into_inner)
        }

        /// Test support: overwrite a report's deadline directly, bypassing the
        /// lifecycle rules. Returns false when the report does not exist.
        #[doc(hidden)]
        pub fn set_expiration(&self, id: Id, when: DateTime<Utc>) -> bool {
            match self.write().reports.get_mut(&id) {
                Some(r) => {
                    r.expiration_date = when;
                    true
                }
                None => false,
            }
        }
    }

    #[async_trait]
    impl ReportRepo for InMemRepo {
        async fn list_open_reports(&self) -> RepoResult<Vec<Report>> {
            let s = self.read();
            let now = Utc::now();
            let reports = s
                .reports
                .values()
                .filter(|r| r.is_open)
                .map(|r| {
                    let comments = s
                        .comments
                        .values()
                        .filter(|c| c.report_id == r.id)
                        .cloned()
                        .collect();
                    r.clone().into_public(comments, now)
                })
                .collect();
            Ok(reports)
        }

        async fn create_report(&self, new: NewReport) -> RepoResult<Report> {
            let valid = new.validate()?;
            let now = Utc::now();
            let mut s = self.write();
            s.next_report_id += 1;
            let stored = StoredReport {
                id: s.next_report_id,
                title: valid.title,
                location: valid.location,
                description: valid.description,
                password: valid.password,
                is_open: true,
                expiration_date: discussion_deadline(now),
            };
            s.reports.insert(stored.id, stored.clone());
            drop(s);
            info!(report_id = stored.id, "report created");
            Ok(stored.into_public(Vec::new(), now))
        }

        async fn get_report(&self, id: Id) -> RepoResult<Option<StoredReport>> {
            Ok(self.read().reports.get(&id).cloned())
        }

        async fn close_report(&self, id: Id, password: Option<&str>) -> RepoResult<CloseAck> {
            let report = self
                .get_report(id)
                .await?
                .ok_or_else(|| RepoError::NotFound(REPORT_MISSING.into()))?;
            report.ensure_closable(password)?;
            if let Some(r) = self.write().reports.get_mut(&id) {
                r.is_open = false;
            }
            info!(report_id = id, "report closed");
            Ok(CloseAck::closed())
        }
    }

    #[async_trait]
    impl CommentRepo for InMemRepo {
        async fn create_comment(&self, report_id: Id, new: NewComment) -> RepoResult<Comment> {
            let report = self
                .get_report(report_id)
                .await?
                .ok_or_else(|| RepoError::NotFound(COMMENT_TARGET_MISSING.into()))?;
            report.ensure_commentable(Utc::now())?;
            let content = new.validate()?;

            let comment = {
                let mut s = self.write();
                s.next_comment_id += 1;
                let comment = Comment { id: s.next_comment_id, report_id, content };
                s.comments.insert(comment.id, comment.clone());
                comment
            };

            // second, independent write: last writer wins
            let deadline = discussion_deadline(Utc::now());
            if let Some(r) = self.write().reports.get_mut(&report_id) {
                r.expiration_date = deadline;
            }
            info!(report_id, comment_id = comment.id, %deadline, "comment added, expiration extended");
            Ok(comment)
        }
    }
}

// Postgres implementation (feature = "postgres-store")
#[cfg(feature = "postgres-store")]
pub mod pg {
    use super::*;
    use crate::db::Gateway;
    use chrono::Utc;
    use std::collections::HashMap;
    use tracing::info;

    const REPORT_COLUMNS: &str =
        r#"id, title, location, description, password, "isOpen", "expirationDate""#;

    #[derive(Clone)]
    pub struct PgRepo { db: Gateway }

    impl PgRepo {
        pub fn new(db: Gateway) -> Self { Self { db } }
    }

    #[async_trait]
    impl ReportRepo for PgRepo {
        async fn list_open_reports(&self) -> RepoResult<Vec<Report>> {
            let rows = sqlx::query_as::<_, StoredReport>(&format!(
                r#"SELECT {REPORT_COLUMNS} FROM reports WHERE "isOpen" = $1 ORDER BY id"#
            ))
            .bind(true)
            .fetch_all(self.db.pool())
            .await?;

            let ids: Vec<Id> = rows.iter().map(|r| r.id).collect();
            let comments = sqlx::query_as::<_, Comment>(
                r#"SELECT id, "reportId", content FROM comments WHERE "reportId" = ANY($1) ORDER BY id"#,
            )
            .bind(&ids)
            .fetch_all(self.db.pool())
            .await?;

            let mut by_report: HashMap<Id, Vec<Comment>> = HashMap::new();
            for c in comments {
                by_report.entry(c.report_id).or_default().push(c);
            }
            let now = Utc::now();
            Ok(rows
                .into_iter()
                .map(|r| {
                    let comments = by_report.remove(&r.id).unwrap_or_default();
                    r.into_public(comments, now)
                })
                .collect())
        }

        async fn create_report(&self, new: NewReport) -> RepoResult<Report> {
            let valid = new.validate()?;
            let rec = sqlx::query_as::<_, StoredReport>(&format!(
                "INSERT INTO reports (title, location, description, password) VALUES ($1,$2,$3,$4) RETURNING {REPORT_COLUMNS}"
            ))
            .bind(&valid.title)
            .bind(&valid.location)
            .bind(&valid.description)
            .bind(&valid.password)
            .fetch_one(self.db.pool())
            .await?;
            info!(report_id = rec.id, "report created");
            Ok(rec.into_public(Vec::new(), Utc::now()))
        }

        async fn get_report(&self, id: Id) -> RepoResult<Option<StoredReport>> {
            let rec = sqlx::query_as::<_, StoredReport>(&format!(
                "SELECT {REPORT_COLUMNS} FROM reports WHERE id = $1"
            ))
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;
            Ok(rec)
        }

        async fn close_report(&self, id: Id, password: Option<&str>) -> RepoResult<CloseAck> {
            let report = self
                .get_report(id)
                .await?
                .ok_or_else(|| RepoError::NotFound(REPORT_MISSING.into()))?;
            report.ensure_closable(password)?;
            sqlx::query(r#"UPDATE reports SET "isOpen" = $1 WHERE id = $2"#)
                .bind(false)
                .bind(id)
                .execute(self.db.pool())
                .await?;
            info!(report_id = id, "report closed");
            Ok(CloseAck::closed())
        }
    }

    #[async_trait]
    impl CommentRepo for PgRepo {
        async fn create_comment(&self, report_id: Id, new: NewComment) -> RepoResult<Comment> {
            let report = self
                .get_report(report_id)
                .await?
                .ok_or_else(|| RepoError::NotFound(COMMENT_TARGET_MISSING.into()))?;
            report.ensure_commentable(Utc::now())?;
            let content = new.validate()?;

            // Two statements, no transaction: a concurrent close or comment can interleave.
            let comment = sqlx::query_as::<_, Comment>(
                r#"INSERT INTO comments ("reportId", content) VALUES ($1,$2) RETURNING id, "reportId", content"#,
            )
            .bind(report_id)
            .bind(&content)
            .fetch_one(self.db.pool())
            .await?;
            sqlx::query(
                r#"UPDATE reports SET "expirationDate" = CURRENT_TIMESTAMP + interval '1 day' WHERE id = $1"#,
            )
            .bind(report_id)
            .execute(self.db.pool())
            .await?;
            info!(report_id, comment_id = comment.id, "comment added, expiration extended");
            Ok(comment)
        }
    }
}
