use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

use super::attendance::OrgAttributes;
use super::schema::Column;

/// A derived table, or the reason it cannot be shown.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "data", rename_all = "snake_case")]
pub enum View<T> {
    Ready(T),
    Unavailable { reason: String },
}

impl<T> View<T> {
    pub fn missing_column(column: Column) -> Self {
        View::Unavailable {
            reason: format!("column '{}' is not present in any selected sheet", column),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, View::Ready(_))
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            View::Ready(t) => Some(t),
            View::Unavailable { .. } => None,
        }
    }
}

/// Where the numbers in a response come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Uploaded,
    Demo,
    Synthetic,
}

/// `Label`/`Count` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub label: String,
    pub count: usize,
}

/// `Hour`/`Count` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HourCount {
    pub hour: u32,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Absent share of a group. `rate` is `None` when the group has no
/// Absent rows at all.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AbsenteeismRate {
    pub key: String,
    pub absent: usize,
    pub total: usize,
    pub rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManpowerPoint {
    pub bucket: NaiveDate,
    pub headcount: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryMetrics {
    pub total_employees: usize,
    pub present_count: usize,
    pub absent_count: usize,
    pub overtime_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineEntry {
    pub date: NaiveDate,
    pub final_status: String,
    pub ot_hours: f64,
}

/// `Month`/`Status`/`Count` row; month is `YYYY-MM`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyStatus {
    pub month: String,
    pub status: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmployeeTimeline {
    pub emp_id: String,
    pub entries: Vec<TimelineEntry>,
    pub monthly: Vec<MonthlyStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttritionPoint {
    pub month: NaiveDate,
    pub rate: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BufferPoint {
    pub date: NaiveDate,
    pub required: u32,
    pub available: u32,
    pub buffer: i64,
}

/// Canonical-order rows of the filtered table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataPreview {
    pub columns: Vec<&'static str>,
    pub rows: Vec<Vec<Value>>,
    pub total_rows: usize,
    pub truncated: bool,
}

/// Views computed from the real (or demo) attendance rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardViews {
    pub metrics: SummaryMetrics,
    pub status_distribution: View<Vec<CategoryCount>>,
    pub attendance_type_distribution: View<Vec<CategoryCount>>,
    pub department_attendance: View<Vec<CategoryCount>>,
    pub department_headcount: View<Vec<CategoryCount>>,
    pub division_headcount: View<Vec<CategoryCount>>,
    pub shift_headcount: View<Vec<CategoryCount>>,
    pub in_time_hours: View<Vec<HourCount>>,
    pub out_time_hours: View<Vec<HourCount>>,
    pub overtime_histogram: View<Vec<HistogramBin>>,
    pub total_hours_histogram: View<Vec<HistogramBin>>,
    pub absenteeism_by_date: View<Vec<AbsenteeismRate>>,
    pub absenteeism_by_department: View<Vec<AbsenteeismRate>>,
    pub manpower_trend: View<Vec<ManpowerPoint>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_timeline: Option<EmployeeTimeline>,
    pub preview: DataPreview,
}

/// Fabricated filler; always labelled [`Provenance::Synthetic`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyntheticInsights {
    pub provenance: Provenance,
    pub notice: String,
    pub profiles: Vec<EmployeeProfile>,
    pub skill_level_headcount: Vec<CategoryCount>,
    pub employment_type_headcount: Vec<CategoryCount>,
    pub production_line_headcount: Vec<CategoryCount>,
    pub gender_headcount: Vec<CategoryCount>,
    pub shift_headcount: Vec<CategoryCount>,
    pub manpower_trend: Vec<ManpowerPoint>,
    pub attrition: Vec<AttritionPoint>,
    pub buffer_manpower: Vec<BufferPoint>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmployeeProfile {
    pub emp_id: String,
    #[serde(flatten)]
    pub attributes: OrgAttributes,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateSpan {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// One dashboard pass. Either every view is built from uploaded data or
/// every view is built from demo data; never a mix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardResponse {
    pub provenance: Provenance,
    /// Human-readable failure that caused a demo fallback.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
    pub sheets: Vec<String>,
    /// Date span actually covered after window filtering.
    pub window: Option<DateSpan>,
    pub views: DashboardViews,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synthetic: Option<SyntheticInsights>,
}
