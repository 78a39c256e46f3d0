use actix_web::{HttpResponse, Responder, web};
use chrono::Local;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::config::Config;
use crate::model::request::DashboardRequest;
use crate::model::schema::ExpectedSchema;
use crate::pipeline::dashboard::{DashboardContext, build_dashboard, seeded_demo};
use crate::utils::session_store::SessionStore;

fn context(config: &Config) -> DashboardContext {
    DashboardContext {
        today: Local::now().date_naive(),
        demo_employees: config.demo_employees,
        preview_rows: config.preview_row_limit,
        default_seed: config.demo_seed,
        schema: ExpectedSchema::attendance(),
    }
}

fn blocking_failed(e: actix_web::error::BlockingError) -> actix_web::Error {
    error!(error = %e, "Dashboard task failed");
    actix_web::error::ErrorInternalServerError("Internal Server Error")
}

/// Dashboard over an uploaded workbook
///
/// Falls back to demo data when the workbook could not be read or has no
/// sheets; `provenance`, `error` and `notice` say so.
#[utoipa::path(
    post,
    path = "/api/v1/workbooks/{id}/dashboard",
    params(("id" = String, Path, description = "Workbook session id")),
    request_body = DashboardRequest,
    responses(
        (status = 200, description = "Dashboard views", body = Object),
        (status = 400, description = "Unknown sheet, reversed date range or synthetic filter without augment", body = Object, example = json!({
            "message": "sheet 'Mar-2024' does not exist in the workbook"
        })),
        (status = 404, description = "Unknown or expired session"),
        (status = 429, description = "Too many requests")
    ),
    tag = "Dashboard"
)]
#[instrument(name = "workbook_dashboard", skip(store, config, request), fields(session_id = %path))]
pub async fn workbook_dashboard(
    store: web::Data<SessionStore>,
    config: web::Data<Config>,
    path: web::Path<Uuid>,
    request: web::Json<DashboardRequest>,
) -> actix_web::Result<impl Responder> {
    let session = store.get(path.into_inner()).await?;
    let request = request.into_inner();
    let ctx = context(&config);

    let response = web::block(move || build_dashboard(session.loaded.as_ref(), &request, &ctx))
        .await
        .map_err(blocking_failed)??;

    info!(provenance = ?response.provenance, "Dashboard built");
    Ok(HttpResponse::Ok().json(response))
}

/// Dashboard over demonstration data
#[utoipa::path(
    post,
    path = "/api/v1/demo/dashboard",
    request_body = DashboardRequest,
    responses(
        (status = 200, description = "Dashboard views over generated data", body = Object),
        (status = 400, description = "Unknown sheet, reversed date range or synthetic filter without augment"),
        (status = 429, description = "Too many requests")
    ),
    tag = "Dashboard"
)]
pub async fn demo_dashboard(
    config: web::Data<Config>,
    request: web::Json<DashboardRequest>,
) -> actix_web::Result<impl Responder> {
    let request = request.into_inner();
    let ctx = context(&config);

    let response = web::block(move || seeded_demo(&request, &ctx))
        .await
        .map_err(blocking_failed)??;

    Ok(HttpResponse::Ok().json(response))
}
