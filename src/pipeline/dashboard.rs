use chrono::NaiveDate;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{info, instrument, warn};

use crate::error::DashboardError;
use crate::model::attendance::{AttendanceTable, OrgAttributes};
use crate::model::request::{DashboardRequest, DashboardView, DateWindow, Period};
use crate::model::schema::{Column, ExpectedSchema};
use crate::model::table::Workbook;
use crate::model::view::{
    CategoryCount, DashboardResponse, DashboardViews, DateSpan, EmployeeProfile, Provenance,
    SyntheticInsights,
};
use crate::pipeline::aggregate::{self, headcount_by};
use crate::pipeline::filter::{apply_filters, apply_window, resolve_window};
use crate::pipeline::normalizer::{concat, normalize};
use crate::pipeline::synthetic;

pub const DEMO_NOTICE: &str =
    "Showing demonstration data generated for illustration only; these figures do not come from your upload.";
pub const SYNTHETIC_NOTICE: &str =
    "Synthetic filler: organisational attributes and trend series below are randomly generated, not measured.";

/// Server-side settings a dashboard pass needs besides the request.
#[derive(Debug, Clone)]
pub struct DashboardContext {
    pub today: NaiveDate,
    pub demo_employees: usize,
    pub preview_rows: usize,
    pub default_seed: Option<u64>,
    /// Columns uploads are reconciled against and the preview shows.
    pub schema: ExpectedSchema,
}

fn rng_for(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Builds the dashboard from `source`, falling back to demo data when the
/// upload itself is at fault. Request errors are returned as they are.
#[instrument(name = "build_dashboard", skip_all, fields(view = ?request.view))]
pub fn build_dashboard(
    source: Result<&Workbook, &DashboardError>,
    request: &DashboardRequest,
    ctx: &DashboardContext,
) -> Result<DashboardResponse, DashboardError> {
    let mut rng = rng_for(request.seed.or(ctx.default_seed));

    let attempt = source
        .map_err(Clone::clone)
        .and_then(|workbook| from_workbook(workbook, request, ctx, &mut rng));

    match attempt {
        Ok(response) => Ok(response),
        Err(e) if e.is_data_fault() => {
            warn!(error = %e, "Uploaded data unusable, serving demo dashboard");
            build_demo(request, ctx, Some(e.to_string()), &mut rng)
        }
        Err(e) => Err(e),
    }
}

/// Dashboard over a freshly generated demo dataset.
pub fn build_demo(
    request: &DashboardRequest,
    ctx: &DashboardContext,
    error: Option<String>,
    rng: &mut StdRng,
) -> Result<DashboardResponse, DashboardError> {
    let table = synthetic::demo_table(ctx.demo_employees, ctx.today, rng);
    let table = match &request.view {
        DashboardView::Employee { emp_id } => {
            let ids = table.employee_ids();
            let wanted = ids
                .iter()
                .find(|id| *id == emp_id.trim())
                .or_else(|| ids.first())
                .cloned()
                .unwrap_or_default();
            table.retain_view(|r| r.emp_id == wanted)
        }
        _ => table,
    };

    let mut response = compute(
        table,
        vec!["Demo".to_string()],
        request,
        ctx,
        rng,
        Provenance::Demo,
        true,
    )?;
    response.error = error;
    response.notice = Some(DEMO_NOTICE.to_string());
    Ok(response)
}

/// Demo dashboard requested directly, with no upload behind it.
pub fn seeded_demo(
    request: &DashboardRequest,
    ctx: &DashboardContext,
) -> Result<DashboardResponse, DashboardError> {
    let mut rng = rng_for(request.seed.or(ctx.default_seed));
    build_demo(request, ctx, None, &mut rng)
}

/// Normalized table for the selected view plus the sheet names used.
pub fn select_table(
    workbook: &Workbook,
    view: &DashboardView,
    schema: &ExpectedSchema,
) -> Result<(AttendanceTable, Vec<String>), DashboardError> {
    if workbook.sheets.is_empty() {
        return Err(DashboardError::EmptyWorkbook);
    }

    match view {
        DashboardView::SheetWise { sheet } => {
            let found = workbook
                .sheet(sheet)
                .ok_or_else(|| DashboardError::UnknownSheet(sheet.clone()))?;
            Ok((normalize(&found.table, schema), vec![found.name.clone()]))
        }
        DashboardView::AllSheets => Ok((
            concat(workbook.sheets.iter().map(|s| normalize(&s.table, schema))),
            workbook.sheet_names(),
        )),
        DashboardView::Employee { emp_id } => {
            let all = concat(workbook.sheets.iter().map(|s| normalize(&s.table, schema)));
            let emp_id = emp_id.trim();
            Ok((all.retain_view(|r| r.emp_id == emp_id), workbook.sheet_names()))
        }
    }
}

fn from_workbook(
    workbook: &Workbook,
    request: &DashboardRequest,
    ctx: &DashboardContext,
    rng: &mut StdRng,
) -> Result<DashboardResponse, DashboardError> {
    if !request.augment {
        if let Some(dimension) = request.filters.synthetic_dimension() {
            return Err(DashboardError::FilterNeedsAugmentation(dimension));
        }
    }

    let (table, sheets) = select_table(workbook, &request.view, &ctx.schema)?;
    info!(rows = table.len(), sheets = sheets.len(), "Normalized workbook selection");

    compute(
        table,
        sheets,
        request,
        ctx,
        rng,
        Provenance::Uploaded,
        request.augment,
    )
}

fn compute(
    table: AttendanceTable,
    sheets: Vec<String>,
    request: &DashboardRequest,
    ctx: &DashboardContext,
    rng: &mut StdRng,
    provenance: Provenance,
    with_synthetic: bool,
) -> Result<DashboardResponse, DashboardError> {
    let table = if with_synthetic && table.records.iter().any(|r| r.attributes.is_none()) {
        let profiles = synthetic::assign_profiles(table.employee_ids(), rng);
        synthetic::attach_profiles(&table, &profiles)
    } else {
        table
    };

    let filtered = apply_filters(&table, &request.filters);
    let span = resolve_window(&filtered, &request.window)?;
    let windowed = apply_window(&filtered, span.as_ref());

    let period = match request.window {
        DateWindow::Period { period } => period,
        _ => Period::Daily,
    };
    let views = build_views(&windowed, request, ctx, period);

    let synthetic = with_synthetic.then(|| {
        let anchor = span
            .as_ref()
            .map(|s| s.end)
            .or_else(|| windowed.max_date())
            .unwrap_or(ctx.today);
        synthetic_insights(&windowed, anchor, period, rng)
    });

    let window = span.or_else(|| {
        windowed
            .min_date()
            .zip(windowed.max_date())
            .map(|(start, end)| DateSpan { start, end })
    });

    Ok(DashboardResponse {
        provenance,
        error: None,
        notice: None,
        sheets,
        window,
        views,
        synthetic,
    })
}

fn build_views(
    table: &AttendanceTable,
    request: &DashboardRequest,
    ctx: &DashboardContext,
    period: Period,
) -> DashboardViews {
    let employee_timeline = match &request.view {
        DashboardView::Employee { emp_id } => Some(aggregate::employee_timeline(table, emp_id.trim())),
        _ => None,
    };
    let preview_rows = request.preview_rows.unwrap_or(ctx.preview_rows);

    DashboardViews {
        metrics: aggregate::summary_metrics(table),
        status_distribution: aggregate::status_distribution(table),
        attendance_type_distribution: aggregate::attendance_type_distribution(table),
        department_attendance: aggregate::department_attendance(table),
        department_headcount: aggregate::department_headcount(table),
        division_headcount: aggregate::division_headcount(table),
        shift_headcount: aggregate::shift_headcount(table),
        in_time_hours: aggregate::hour_histogram(table, Column::InTime),
        out_time_hours: aggregate::hour_histogram(table, Column::OutTime),
        overtime_histogram: aggregate::overtime_histogram(table),
        total_hours_histogram: aggregate::total_hours_histogram(table),
        absenteeism_by_date: aggregate::absenteeism_by_date(table),
        absenteeism_by_department: aggregate::absenteeism_by_department(table),
        manpower_trend: aggregate::manpower_view(table, period),
        employee_timeline,
        preview: aggregate::data_preview(table, &ctx.schema.columns(), preview_rows),
    }
}

/// Distinct employees per synthetic attribute; rows without attributes are
/// left out.
fn attribute_headcount(
    table: &AttendanceTable,
    pick: fn(&OrgAttributes) -> &str,
) -> Vec<CategoryCount> {
    let attributed = table.records.iter().filter(|r| r.attributes.is_some());
    headcount_by(attributed, |r| r.attributes.as_ref().map(pick).unwrap_or_default())
}

fn synthetic_insights(
    table: &AttendanceTable,
    anchor: NaiveDate,
    period: Period,
    rng: &mut StdRng,
) -> SyntheticInsights {
    let templates = synthetic::templates_of(table);
    let profiles = templates
        .iter()
        .filter_map(|r| {
            r.attributes.clone().map(|attributes| EmployeeProfile {
                emp_id: r.emp_id.clone(),
                attributes,
            })
        })
        .collect();

    let history = synthetic::synthetic_history(&templates, anchor, rng);

    SyntheticInsights {
        provenance: Provenance::Synthetic,
        notice: SYNTHETIC_NOTICE.to_string(),
        profiles,
        skill_level_headcount: attribute_headcount(table, |a| a.skill_level.as_str()),
        employment_type_headcount: attribute_headcount(table, |a| a.employment_type.as_str()),
        production_line_headcount: attribute_headcount(table, |a| a.production_line.as_str()),
        gender_headcount: attribute_headcount(table, |a| a.gender.as_str()),
        shift_headcount: attribute_headcount(table, |a| a.shift.as_str()),
        manpower_trend: aggregate::manpower_trend(&history, period),
        attrition: synthetic::attrition_series(anchor, rng),
        buffer_manpower: synthetic::buffer_series(anchor, rng),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::request::{CategoryFilters, Selection};
    use crate::model::table::{Cell, RawTable, Sheet};
    use crate::model::view::View;

    fn ctx() -> DashboardContext {
        DashboardContext {
            today: NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
            demo_employees: 8,
            preview_rows: 50,
            default_seed: Some(99),
            schema: ExpectedSchema::attendance(),
        }
    }

    fn sheet(name: &str, rows: &[[&str; 5]]) -> Sheet {
        let headers = ["EmpID", "Department Name", "Attendance Date", "In Time", "Final Status"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let rows = rows
            .iter()
            .map(|r| r.iter().map(|v| Cell::from(*v)).collect())
            .collect();
        Sheet {
            name: name.to_string(),
            table: RawTable::new(headers, rows),
        }
    }

    fn workbook() -> Workbook {
        Workbook {
            sheets: vec![
                sheet(
                    "Jan",
                    &[
                        ["30001", "Quality", "02/01/2024", "08:10", "Present"],
                        ["30002", "HR", "02/01/2024", "09:40", "Absent"],
                        ["30003", "HR", "oops", "09:00", "Present"],
                    ],
                ),
                sheet(
                    "Feb",
                    &[
                        ["30001", "Quality", "01/02/2024", "08:05", "Present"],
                        ["30002", "HR", "01/02/2024", "", "Present"],
                    ],
                ),
            ],
        }
    }

    #[test]
    fn all_sheets_view_concatenates_and_drops_bad_dates() {
        let wb = workbook();
        let resp = build_dashboard(Ok(&wb), &DashboardRequest::default(), &ctx()).unwrap();
        assert_eq!(resp.provenance, Provenance::Uploaded);
        assert_eq!(resp.sheets, vec!["Jan".to_string(), "Feb".to_string()]);
        assert_eq!(resp.views.metrics.total_employees, 2);
        assert_eq!(resp.views.metrics.present_count, 3);
        assert_eq!(resp.views.preview.total_rows, 4);
        assert!(resp.synthetic.is_none());
        assert!(!resp.views.attendance_type_distribution.is_ready());
        assert!(matches!(resp.views.division_headcount, View::Unavailable { .. }));
    }

    #[test]
    fn sheet_wise_view_uses_one_sheet() {
        let wb = workbook();
        let request = DashboardRequest {
            view: DashboardView::SheetWise { sheet: "Feb".into() },
            ..Default::default()
        };
        let resp = build_dashboard(Ok(&wb), &request, &ctx()).unwrap();
        assert_eq!(resp.views.preview.total_rows, 2);
        assert_eq!(resp.views.metrics.absent_count, 0);
    }

    #[test]
    fn unknown_sheet_is_a_request_error() {
        let wb = workbook();
        let request = DashboardRequest {
            view: DashboardView::SheetWise { sheet: "Mar".into() },
            ..Default::default()
        };
        let err = build_dashboard(Ok(&wb), &request, &ctx()).unwrap_err();
        assert_eq!(err, DashboardError::UnknownSheet("Mar".into()));
    }

    #[test]
    fn unreadable_upload_falls_back_to_demo_without_mixing() {
        let fault = DashboardError::UnreadableWorkbook("bad zip".into());
        let resp = build_dashboard(Err(&fault), &DashboardRequest::default(), &ctx()).unwrap();
        assert_eq!(resp.provenance, Provenance::Demo);
        assert!(resp.error.as_deref().unwrap().contains("bad zip"));
        assert_eq!(resp.notice.as_deref(), Some(DEMO_NOTICE));
        assert_eq!(resp.sheets, vec!["Demo".to_string()]);
        assert_eq!(resp.views.metrics.total_employees, 8);
        assert_eq!(resp.synthetic.as_ref().unwrap().provenance, Provenance::Synthetic);
    }

    #[test]
    fn empty_workbook_falls_back_to_demo() {
        let resp = build_dashboard(Ok(&Workbook::default()), &DashboardRequest::default(), &ctx())
            .unwrap();
        assert_eq!(resp.provenance, Provenance::Demo);
    }

    #[test]
    fn employee_view_carries_timeline() {
        let wb = workbook();
        let request = DashboardRequest {
            view: DashboardView::Employee { emp_id: "30002".into() },
            ..Default::default()
        };
        let resp = build_dashboard(Ok(&wb), &request, &ctx()).unwrap();
        let timeline = resp.views.employee_timeline.unwrap();
        assert_eq!(timeline.entries.len(), 2);
        assert_eq!(timeline.entries[0].final_status, "Absent");
        assert_eq!(resp.views.metrics.total_employees, 1);
    }

    #[test]
    fn augmentation_is_separate_and_reproducible() {
        let wb = workbook();
        let request = DashboardRequest {
            augment: true,
            seed: Some(4),
            ..Default::default()
        };
        let a = build_dashboard(Ok(&wb), &request, &ctx()).unwrap();
        let b = build_dashboard(Ok(&wb), &request, &ctx()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.provenance, Provenance::Uploaded);
        let insights = a.synthetic.unwrap();
        assert_eq!(insights.provenance, Provenance::Synthetic);
        assert_eq!(insights.profiles.len(), 2);
        let heads: usize = insights.skill_level_headcount.iter().map(|c| c.count).sum();
        assert_eq!(heads, 2);
        assert_eq!(insights.buffer_manpower.len(), 30);
    }

    #[test]
    fn skill_filter_narrows_augmented_headcount() {
        let wb = workbook();
        let base = DashboardRequest {
            augment: true,
            seed: Some(4),
            ..Default::default()
        };
        let open = build_dashboard(Ok(&wb), &base, &ctx()).unwrap();
        let target = open.synthetic.unwrap().profiles[0].attributes.skill_level.clone();

        let request = DashboardRequest {
            filters: CategoryFilters {
                skill_level: Selection::Only(target.clone()),
                ..Default::default()
            },
            ..base
        };
        let resp = build_dashboard(Ok(&wb), &request, &ctx()).unwrap();
        let insights = resp.synthetic.unwrap();
        assert!(insights.profiles.iter().all(|p| p.attributes.skill_level == target));
        let heads: usize = insights.skill_level_headcount.iter().map(|c| c.count).sum();
        assert_eq!(heads, resp.views.metrics.total_employees);
    }

    #[test]
    fn reversed_range_is_not_masked_by_demo() {
        let wb = workbook();
        let request = DashboardRequest {
            window: DateWindow::Range {
                start: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                end: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            },
            ..Default::default()
        };
        assert!(matches!(
            build_dashboard(Ok(&wb), &request, &ctx()),
            Err(DashboardError::InvalidDateRange { .. })
        ));
    }

    #[test]
    fn sheet_shift_decides_shift_filter_when_augmented() {
        let headers = ["EmpID", "Attendance Date", "Shift Name", "Final Status"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let rows = [
            ["30001", "02/01/2024", "Night", "Present"],
            ["30002", "02/01/2024", "Night", "Present"],
            ["30003", "02/01/2024", "Day", "Present"],
        ]
        .iter()
        .map(|r| r.iter().map(|v| Cell::from(*v)).collect())
        .collect();
        let wb = Workbook {
            sheets: vec![Sheet {
                name: "Jan".into(),
                table: RawTable::new(headers, rows),
            }],
        };
        let request = DashboardRequest {
            augment: true,
            seed: Some(4),
            filters: CategoryFilters {
                shift: Selection::only("Night"),
                ..Default::default()
            },
            ..Default::default()
        };
        let resp = build_dashboard(Ok(&wb), &request, &ctx()).unwrap();
        assert_eq!(resp.views.metrics.total_employees, 2);
    }

    #[test]
    fn synthetic_filter_without_augment_is_rejected() {
        let wb = workbook();
        let request = DashboardRequest {
            filters: CategoryFilters {
                skill_level: Selection::only("L2"),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(
            build_dashboard(Ok(&wb), &request, &ctx()).unwrap_err(),
            DashboardError::FilterNeedsAugmentation("skill_level")
        );
    }

    #[test]
    fn augmented_range_at_earliest_date_does_not_panic() {
        let wb = workbook();
        let request = DashboardRequest {
            augment: true,
            seed: Some(4),
            window: DateWindow::Range {
                start: NaiveDate::MIN,
                end: NaiveDate::MIN,
            },
            ..Default::default()
        };
        let resp = build_dashboard(Ok(&wb), &request, &ctx()).unwrap();
        assert_eq!(resp.views.metrics.total_employees, 0);
        let insights = resp.synthetic.unwrap();
        assert_eq!(insights.buffer_manpower.len(), 1);
        assert_eq!(insights.buffer_manpower[0].date, NaiveDate::MIN);
    }
}
