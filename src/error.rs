use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use utoipa::ToSchema;

use crate::repo::RepoError;

#[derive(Debug, Serialize, ToSchema)]
pub struct ApiErrorBody {
    pub name: String,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NotFoundBody {
    pub error: String,
}

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error(transparent)] Repo(#[from] RepoError),
    /// Body or path could not be parsed into the expected shape.
    #[error("{0}")] Malformed(String),
    #[error("route not found")] RouteNotFound,
}

impl ApiError {
    pub fn name(&self) -> &'static str {
        match self {
            ApiError::Repo(e) => e.name(),
            ApiError::Malformed(_) => "ValidationError",
            ApiError::RouteNotFound => "RouteNotFound",
        }
    }
}

impl ResponseError for ApiError {
    // Every failure of the report/comment operations is a 500; the kind
    // travels in the body only.
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::RouteNotFound => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut res = HttpResponse::build(self.status_code());
        match self {
            ApiError::RouteNotFound => res.json(NotFoundBody { error: self.to_string() }),
            _ => res.json(ApiErrorBody { name: self.name().to_string(), message: self.to_string() }),
        }
    }
}
