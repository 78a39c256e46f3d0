use std::collections::BTreeMap;

use actix_web::{HttpResponse, Responder, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, instrument};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::DashboardError;
use crate::model::schema::ExpectedSchema;
use crate::model::table::SheetSummary;
use crate::pipeline::normalizer::{concat, normalize};
use crate::utils::session_store::{Session, SessionStore};
use crate::utils::workbook_reader::read_workbook;

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct UploadQuery {
    /// Original file name; its extension decides how the body is parsed
    #[schema(example = "attendance-jan.xlsx")]
    pub file_name: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WorkbookResponse {
    #[schema(value_type = String, example = "5f0c4c1e-8a9e-4b8e-9d7e-1c2f0a6b3d21")]
    pub session_id: Uuid,
    #[schema(example = "attendance-jan.xlsx")]
    pub file_name: Option<String>,
    #[schema(value_type = String, example = "2024-06-30T08:00:00Z")]
    pub uploaded_at: DateTime<Utc>,
    pub sheets: Vec<SheetSummary>,
    /// Set when the file could not be read; dashboards for this session
    /// are then served from demo data
    #[schema(example = json!(null))]
    pub load_error: Option<String>,
}

impl WorkbookResponse {
    fn from_session(session_id: Uuid, session: &Session) -> Self {
        Self {
            session_id,
            file_name: session.file_name.clone(),
            uploaded_at: session.uploaded_at,
            sheets: session
                .loaded
                .as_ref()
                .map(|wb| wb.summaries())
                .unwrap_or_default(),
            load_error: session.load_error(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EmployeeEntry {
    #[schema(example = "30001")]
    pub emp_id: String,
    #[schema(example = "Asha Rao")]
    pub name: String,
    #[schema(example = "Quality")]
    pub department: String,
    #[schema(example = "Operations")]
    pub division: String,
    #[schema(example = "Operator")]
    pub designation: String,
    /// Attendance rows across all sheets
    #[schema(example = 22)]
    pub rows: usize,
}

/// Upload a workbook
#[utoipa::path(
    post,
    path = "/api/v1/workbooks",
    params(UploadQuery),
    request_body(content = Vec<u8>, description = "Raw xlsx/xls/ods/csv file", content_type = "application/octet-stream"),
    responses(
        (status = 201, description = "Workbook session created", body = WorkbookResponse),
        (status = 400, description = "Empty upload", body = Object, example = json!({
            "message": "upload body is empty"
        })),
        (status = 413, description = "Upload too large"),
        (status = 429, description = "Too many requests")
    ),
    tag = "Workbook"
)]
#[instrument(name = "upload_workbook", skip(store, body), fields(bytes = body.len()))]
pub async fn upload_workbook(
    store: web::Data<SessionStore>,
    query: web::Query<UploadQuery>,
    body: web::Bytes,
) -> actix_web::Result<impl Responder> {
    let file_name = query
        .into_inner()
        .file_name
        .filter(|n| !n.trim().is_empty());

    if body.is_empty() {
        return Err(DashboardError::EmptyUpload.into());
    }

    let name_for_read = file_name.clone();
    let loaded = web::block(move || read_workbook(name_for_read.as_deref(), &body))
        .await
        .map_err(|e| {
            error!(error = %e, "Workbook parsing task failed");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    if let Err(e) = &loaded {
        info!(error = %e, "Workbook stored with load error");
    }

    let session = Session::new(file_name, loaded);
    let sheets = session.sheet_names().len();
    let session_id = store.insert(session).await;
    info!(%session_id, sheets, "Workbook uploaded");

    let session = store.get(session_id).await?;
    Ok(HttpResponse::Created().json(WorkbookResponse::from_session(session_id, &session)))
}

/// Sheet summaries of an uploaded workbook
#[utoipa::path(
    get,
    path = "/api/v1/workbooks/{id}",
    params(("id" = String, Path, description = "Workbook session id")),
    responses(
        (status = 200, description = "Workbook session", body = WorkbookResponse),
        (status = 404, description = "Unknown or expired session", body = Object, example = json!({
            "message": "workbook session 5f0c4c1e-8a9e-4b8e-9d7e-1c2f0a6b3d21 was not found or has expired"
        }))
    ),
    tag = "Workbook"
)]
pub async fn get_workbook(
    store: web::Data<SessionStore>,
    path: web::Path<Uuid>,
) -> actix_web::Result<impl Responder> {
    let id = path.into_inner();
    let session = store.get(id).await?;
    Ok(HttpResponse::Ok().json(WorkbookResponse::from_session(id, &session)))
}

/// Drop an uploaded workbook
#[utoipa::path(
    delete,
    path = "/api/v1/workbooks/{id}",
    params(("id" = String, Path, description = "Workbook session id")),
    responses(
        (status = 200, description = "Session removed", body = Object, example = json!({
            "message": "Workbook removed"
        })),
        (status = 404, description = "Unknown or expired session")
    ),
    tag = "Workbook"
)]
pub async fn delete_workbook(
    store: web::Data<SessionStore>,
    path: web::Path<Uuid>,
) -> actix_web::Result<impl Responder> {
    let id = path.into_inner();
    if !store.remove(id).await {
        return Err(DashboardError::UnknownSession(id).into());
    }
    info!(session_id = %id, "Workbook removed");
    Ok(HttpResponse::Ok().json(json!({ "message": "Workbook removed" })))
}

/// Employee directory of an uploaded workbook
#[utoipa::path(
    get,
    path = "/api/v1/workbooks/{id}/employees",
    params(("id" = String, Path, description = "Workbook session id")),
    responses(
        (status = 200, description = "Distinct employees, ordered by EmpID", body = Vec<EmployeeEntry>),
        (status = 404, description = "Unknown or expired session"),
        (status = 422, description = "Workbook could not be read")
    ),
    tag = "Workbook"
)]
pub async fn list_employees(
    store: web::Data<SessionStore>,
    path: web::Path<Uuid>,
) -> actix_web::Result<impl Responder> {
    let session = store.get(path.into_inner()).await?;
    let workbook = session.loaded.as_ref().map_err(Clone::clone)?;

    let schema = ExpectedSchema::attendance();
    let table = concat(workbook.sheets.iter().map(|s| normalize(&s.table, &schema)));

    let mut directory: BTreeMap<&str, EmployeeEntry> = BTreeMap::new();
    for record in &table.records {
        directory
            .entry(record.emp_id.as_str())
            .or_insert_with(|| EmployeeEntry {
                emp_id: record.emp_id.clone(),
                name: record.name.clone(),
                department: record.department.clone(),
                division: record.division.clone(),
                designation: record.designation.clone(),
                rows: 0,
            })
            .rows += 1;
    }

    Ok(HttpResponse::Ok().json(directory.into_values().collect::<Vec<_>>()))
}

#[cfg(test)]
mod tests {
    use crate::config::Config;
    use crate::routes;
    use crate::utils::session_store::SessionStore;
    use actix_web::{App, http::StatusCode, test, web::Data};
    use serde_json::Value;

    const CSV: &str = "EmpID,FName,Department Name,Attendance Date,Final Status\n\
                       30001,Asha,Quality,02/01/2024,Present\n\
                       30002,Ravi,HR,02/01/2024,Absent\n\
                       30001,Asha,Quality,03/01/2024,Present\n";

    fn peer() -> std::net::SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    macro_rules! app {
        () => {{
            let config = Config::default();
            let store = SessionStore::new(16, config.session_ttl());
            test::init_service(
                App::new()
                    .app_data(Data::new(store))
                    .app_data(Data::new(config.clone()))
                    .configure(|cfg| routes::configure(cfg, config.clone())),
            )
            .await
        }};
    }

    #[actix_web::test]
    async fn upload_then_list_employees() {
        let app = app!();

        let req = test::TestRequest::post()
            .uri("/api/v1/workbooks?file_name=jan.csv")
            .peer_addr(peer())
            .set_payload(CSV)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["sheets"][0]["name"], "jan");
        assert_eq!(body["sheets"][0]["rows"], 3);
        assert!(body["load_error"].is_null());
        assert!(body["uploaded_at"].is_string());
        let id = body["session_id"].as_str().unwrap().to_string();

        let req = test::TestRequest::get()
            .uri(&format!("/api/v1/workbooks/{id}/employees"))
            .peer_addr(peer())
            .to_request();
        let employees: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(employees.as_array().unwrap().len(), 2);
        assert_eq!(employees[0]["emp_id"], "30001");
        assert_eq!(employees[0]["rows"], 2);
        assert_eq!(employees[1]["department"], "HR");
    }

    #[actix_web::test]
    async fn empty_upload_is_rejected() {
        let app = app!();
        let req = test::TestRequest::post()
            .uri("/api/v1/workbooks")
            .peer_addr(peer())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn unreadable_spreadsheet_is_kept_with_error() {
        let app = app!();
        let req = test::TestRequest::post()
            .uri("/api/v1/workbooks?file_name=broken.xlsx")
            .peer_addr(peer())
            .set_payload("definitely not a zip archive")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["load_error"].is_string());
        assert_eq!(body["sheets"].as_array().unwrap().len(), 0);
    }

    #[actix_web::test]
    async fn unknown_session_is_not_found() {
        let app = app!();
        let req = test::TestRequest::delete()
            .uri("/api/v1/workbooks/5f0c4c1e-8a9e-4b8e-9d7e-1c2f0a6b3d21")
            .peer_addr(peer())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
