use crate::error::{ApiErrorBody, NotFoundBody};
use crate::models::{CloseAck, CloseReport, Comment, NewComment, NewReport, Report, ReportList};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::list_reports,
        crate::routes::create_report,
        crate::routes::close_report,
        crate::routes::create_comment,
    ),
    components(schemas(
        Report, ReportList, NewReport, CloseReport, CloseAck, Comment, NewComment,
        ApiErrorBody, NotFoundBody
    )),
    tags(
        (name = "reports", description = "Sighting report operations"),
        (name = "comments", description = "Report discussion"),
    )
)]
pub struct ApiDoc;
