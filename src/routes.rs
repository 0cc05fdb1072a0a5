use std::sync::Arc;
use actix_web::{web, HttpResponse};

use crate::error::{ApiError, ApiErrorBody};
use crate::models::*;
use crate::repo::Repo;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| ApiError::Malformed(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _req| ApiError::Malformed(err.to_string()).into()),
    )
    .service(
        web::scope("/api")
            .service(
                web::resource("/reports")
                    .route(web::get().to(list_reports))
                    .route(web::post().to(create_report))
                    .default_service(web::to(not_found)),
            )
            .service(
                web::resource("/reports/{report_id}")
                    .route(web::delete().to(close_report))
                    .default_service(web::to(not_found)),
            )
            .service(
                web::resource("/reports/{report_id}/comments")
                    .route(web::post().to(create_comment))
                    .default_service(web::to(not_found)),
            ),
    )
    .route("/health", web::get().to(health));
}

#[derive(Clone)]
pub struct AppState { pub repo: Arc<dyn Repo> }

#[utoipa::path(
    get,
    path = "/api/reports",
    responses(
        (status = 200, description = "Open reports with their comments", body = ReportList),
        (status = 500, description = "Store failure", body = ApiErrorBody)
    )
)]
pub async fn list_reports(data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let reports = data.repo.list_open_reports().await?;
    Ok(HttpResponse::Ok().json(ReportList { reports }))
}

#[utoipa::path(
    post,
    path = "/api/reports",
    request_body = NewReport,
    responses(
        (status = 200, description = "Report created", body = Report),
        (status = 500, description = "Missing field or store failure", body = ApiErrorBody)
    )
)]
pub async fn create_report(
    data: web::Data<AppState>,
    payload: web::Json<NewReport>,
) -> Result<HttpResponse, ApiError> {
    let report = data.repo.create_report(payload.into_inner()).await?;
    Ok(HttpResponse::Ok().json(report))
}

#[utoipa::path(
    delete,
    path = "/api/reports/{report_id}",
    request_body = CloseReport,
    params(("report_id" = i32, Path, description = "Report id")),
    responses(
        (status = 200, description = "Report closed", body = CloseAck),
        (status = 500, description = "NotFound, InvalidCredential or AlreadyClosed", body = ApiErrorBody)
    )
)]
pub async fn close_report(
    data: web::Data<AppState>,
    path: web::Path<Id>,
    payload: Option<web::Json<CloseReport>>, // a missing body is a wrong password, not a parse error
) -> Result<HttpResponse, ApiError> {
    let password = payload.and_then(|p| p.into_inner().password);
    let ack = data.repo.close_report(path.into_inner(), password.as_deref()).await?;
    Ok(HttpResponse::Ok().json(ack))
}

#[utoipa::path(
    post,
    path = "/api/reports/{report_id}/comments",
    request_body = NewComment,
    params(("report_id" = i32, Path, description = "Report id")),
    responses(
        (status = 200, description = "Comment created", body = Comment),
        (status = 500, description = "NotFound, Closed or Expired", body = ApiErrorBody)
    )
)]
pub async fn create_comment(
    data: web::Data<AppState>,
    path: web::Path<Id>,
    payload: Option<web::Json<NewComment>>, // a missing body is missing content, checked after the report state
) -> Result<HttpResponse, ApiError> {
    let new = payload.map(|p| p.into_inner()).unwrap_or_default();
    let comment = data.repo.create_comment(path.into_inner(), new).await?;
    Ok(HttpResponse::Ok().json(comment))
}

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

/// Fallback for every unmatched route; register with `App::default_service`.
pub async fn not_found() -> Result<HttpResponse, ApiError> {
    Err(ApiError::RouteNotFound)
}
