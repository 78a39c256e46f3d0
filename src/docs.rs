use crate::api::workbook::{EmployeeEntry, UploadQuery, WorkbookResponse};
use crate::model::attendance::OrgAttributes;
use crate::model::request::{CategoryFilters, DashboardRequest, DashboardView, DateWindow, Period};
use crate::model::schema::Column;
use crate::model::table::SheetSummary;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance Dashboard API",
        version = "1.0.0",
        description = r#"
## Attendance Dashboard

Upload attendance spreadsheets exported by an HR system and get back the
tables behind an attendance dashboard.

### 🔹 Key Features
- **Workbook upload**
  - xlsx, xls, xlsb, ods and csv; every worksheet is kept
- **Schema normalization**
  - Known columns are recognised case-insensitively, gaps are filled with defaults
- **Dashboard views**
  - Status, department, shift and division breakdowns, punch-in/out hours,
    overtime histograms, absenteeism and manpower trends
- **Synthetic augmentation**
  - Optional, clearly labelled random attributes and trend series

### 📦 Response Format
- JSON-based RESTful responses
- Every view is either `ready` or `unavailable` with a reason
- Responses built from demo data carry `provenance = "demo"` and a notice

---
Built with **Rust**, **Actix Web**, **calamine** and **Utoipa**.
"#,
    ),
    paths(
        crate::api::workbook::upload_workbook,
        crate::api::workbook::get_workbook,
        crate::api::workbook::delete_workbook,
        crate::api::workbook::list_employees,

        crate::api::dashboard::workbook_dashboard,
        crate::api::dashboard::demo_dashboard
    ),
    components(
        schemas(
            UploadQuery,
            WorkbookResponse,
            SheetSummary,
            EmployeeEntry,
            DashboardRequest,
            DashboardView,
            DateWindow,
            Period,
            CategoryFilters,
            OrgAttributes,
            Column
        )
    ),
    tags(
        (name = "Workbook", description = "Workbook upload and session APIs"),
        (name = "Dashboard", description = "Dashboard view APIs"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/v1/workbooks",
            "/api/v1/workbooks/{id}",
            "/api/v1/workbooks/{id}/employees",
            "/api/v1/workbooks/{id}/dashboard",
            "/api/v1/demo/dashboard",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
