use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::repo::{RepoError, RepoResult};

// reports.id / comments.id are SERIAL columns
pub type Id = i32;

/// How long a report stays open for discussion after creation or after its latest comment.
pub const DISCUSSION_WINDOW_HOURS: i64 = 24;

pub const CLOSED_MESSAGE: &str = "Report successfully closed!";

// Column limits of the reports table
const MAX_SHORT_FIELD: usize = 255;

pub fn discussion_deadline(from: DateTime<Utc>) -> DateTime<Utc> {
    from + Duration::hours(DISCUSSION_WINDOW_HOURS)
}

/// A full `reports` row, password included. Never leaves the repository layer
/// except through [`StoredReport::into_public`].
#[derive(Debug, Clone, sqlx::FromRow)]
#[sqlx(rename_all = "camelCase")]
pub struct StoredReport {
    pub id: Id,
    pub title: String,
    pub location: String,
    pub description: String,
    pub password: String,
    pub is_open: bool,
    pub expiration_date: DateTime<Utc>,
}

impl StoredReport {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiration_date < now
    }

    /// Existence is checked by the caller; this covers credential then state.
    pub fn ensure_closable(&self, supplied_password: Option<&str>) -> RepoResult<()> {
        if supplied_password != Some(self.password.as_str()) {
            return Err(RepoError::InvalidCredential(
                "Password incorrect for this report, please try again".into(),
            ));
        }
        if !self.is_open {
            return Err(RepoError::AlreadyClosed("This report has already been closed".into()));
        }
        Ok(())
    }

    pub fn ensure_commentable(&self, now: DateTime<Utc>) -> RepoResult<()> {
        if !self.is_open {
            return Err(RepoError::Closed(
                "That report has been closed, no comment has been made".into(),
            ));
        }
        if now >= self.expiration_date {
            return Err(RepoError::Expired(
                "The discussion time on this report has expired, no comment has been made".into(),
            ));
        }
        Ok(())
    }

    pub fn into_public(self, comments: Vec<Comment>, now: DateTime<Utc>) -> Report {
        let is_expired = self.is_expired_at(now);
        Report {
            id: self.id,
            title: self.title,
            location: self.location,
            description: self.description,
            is_open: self.is_open,
            expiration_date: self.expiration_date,
            is_expired,
            comments,
        }
    }
}

/// Report as returned to clients: no password, derived fields attached.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    #[schema(value_type = i32)]
    pub id: Id,
    pub title: String,
    pub location: String,
    pub description: String,
    pub is_open: bool,
    pub expiration_date: DateTime<Utc>,
    pub is_expired: bool,
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
#[sqlx(rename_all = "camelCase")]
pub struct Comment {
    #[schema(value_type = i32)]
    pub id: Id,
    #[schema(value_type = i32)]
    pub report_id: Id,
    pub content: String,
}

/// Creation payload. Fields are optional so a missing one surfaces as a
/// validation failure instead of a body parse error.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct NewReport {
    pub title: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub password: Option<String>,
}

/// A [`NewReport`] that passed validation.
#[derive(Debug, Clone)]
pub struct ValidReport {
    pub title: String,
    pub location: String,
    pub description: String,
    pub password: String,
}

impl NewReport {
    pub fn validate(self) -> RepoResult<ValidReport> {
        let title = required("title", self.title)?;
        let location = required("location", self.location)?;
        let description = required("description", self.description)?;
        let password = required("password", self.password)?;
        for (field, value) in [("title", &title), ("location", &location), ("password", &password)] {
            if value.chars().count() > MAX_SHORT_FIELD {
                return Err(RepoError::Validation(format!(
                    "{field} must be at most {MAX_SHORT_FIELD} characters"
                )));
            }
        }
        Ok(ValidReport { title, location, description, password })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct NewComment {
    pub content: Option<String>,
}

impl NewComment {
    pub fn validate(self) -> RepoResult<String> {
        required("content", self.content)
    }
}

fn required(field: &str, value: Option<String>) -> RepoResult<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(RepoError::Validation(format!("{field} is required"))),
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CloseReport {
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CloseAck {
    pub message: String,
}

impl CloseAck {
    pub fn closed() -> Self {
        Self { message: CLOSED_MESSAGE.to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReportList {
    pub reports: Vec<Report>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(is_open: bool, expiration_date: DateTime<Utc>) -> StoredReport {
        StoredReport {
            id: 1,
            title: "Bubbling Water".into(),
            location: "Bermuda".into(),
            description: "The ship seemed to disappear".into(),
            password: "ShipIsNoMore".into(),
            is_open,
            expiration_date,
        }
    }

    #[test]
    fn close_checks_credential_before_state() {
        let r = stored(false, discussion_deadline(Utc::now()));
        assert!(matches!(r.ensure_closable(Some("nope")), Err(RepoError::InvalidCredential(_))));
        assert!(matches!(r.ensure_closable(None), Err(RepoError::InvalidCredential(_))));
        assert!(matches!(r.ensure_closable(Some("ShipIsNoMore")), Err(RepoError::AlreadyClosed(_))));
        assert!(stored(true, Utc::now()).ensure_closable(Some("ShipIsNoMore")).is_ok());
    }

    #[test]
    fn comment_checks_closed_before_expired() {
        let now = Utc::now();
        let past = now - Duration::hours(1);
        assert!(matches!(stored(false, past).ensure_commentable(now), Err(RepoError::Closed(_))));
        assert!(matches!(stored(true, past).ensure_commentable(now), Err(RepoError::Expired(_))));
        // the deadline instant itself is no longer commentable
        assert!(matches!(stored(true, now).ensure_commentable(now), Err(RepoError::Expired(_))));
        assert!(stored(true, discussion_deadline(now)).ensure_commentable(now).is_ok());
    }

    #[test]
    fn public_view_drops_password_and_flags_expiry() {
        let now = Utc::now();
        let report = stored(true, now - Duration::seconds(1)).into_public(vec![], now);
        assert!(report.is_expired);
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["isOpen"], true);
        assert_eq!(json["isExpired"], true);
        assert!(json["comments"].as_array().unwrap().is_empty());
        assert!(json.get("expirationDate").is_some());
    }

    #[test]
    fn new_report_requires_every_field() {
        let full = NewReport {
            title: Some("Floating Being".into()),
            location: Some("My Attic".into()),
            description: Some("I saw it, turned away".into()),
            password: Some("GhostbustersNeeded".into()),
        };
        assert!(full.clone().validate().is_ok());

        let missing_password = NewReport { password: None, ..full.clone() };
        assert!(matches!(missing_password.validate(), Err(RepoError::Validation(m)) if m.contains("password")));

        let blank_title = NewReport { title: Some("   ".into()), ..full.clone() };
        assert!(matches!(blank_title.validate(), Err(RepoError::Validation(_))));

        let long_location = NewReport { location: Some("x".repeat(256)), ..full };
        assert!(matches!(long_location.validate(), Err(RepoError::Validation(_))));
    }

    #[test]
    fn comment_serializes_report_id_in_camel_case() {
        let c = Comment { id: 3, report_id: 7, content: "Did the humanoid eat candy?".into() };
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["reportId"], 7);
        assert!(NewComment { content: None }.validate().is_err());
    }
}
