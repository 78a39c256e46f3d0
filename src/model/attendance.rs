use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use strum_macros::{Display, EnumIter};
use utoipa::ToSchema;

use super::schema::Column;

/// One employee's attendance on one date, after normalization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceRecord {
    pub emp_id: String,
    pub attendance_code: String,
    pub name: String,
    pub branch_code: String,
    pub department: String,
    pub division: String,
    pub reporting_manager: String,
    pub grade_code: String,
    pub designation: String,
    pub direct_indirect: String,
    pub roster: String,
    pub shift_name: String,
    pub join_date: String,
    pub attendance_date: NaiveDate,
    pub in_time: String,
    pub out_time: String,
    pub total_hours: f64,
    pub ot_hours: f64,
    pub late_hours: f64,
    pub application_status: String,
    pub final_status: String,
    pub attendance_type: String,

    /// Synthetic organisational attributes, present only after augmentation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<OrgAttributes>,
}

impl AttendanceRecord {
    pub fn status_class(&self) -> StatusClass {
        StatusClass::classify(&self.final_status)
    }

    /// The shift used for filtering. The sheet's own Shift Name wins; the
    /// synthetic shift stands in only when the source had no such column.
    pub fn effective_shift(&self, source_has_shift: bool) -> &str {
        match &self.attributes {
            Some(attrs) if !source_has_shift => attrs.shift.as_str(),
            _ => &self.shift_name,
        }
    }

    /// Cell value for a canonical column, as shown in the data preview.
    pub fn value(&self, column: Column) -> Value {
        match column {
            Column::EmpId => json!(self.emp_id),
            Column::AttendanceCode => json!(self.attendance_code),
            Column::Name => json!(self.name),
            Column::BranchCode => json!(self.branch_code),
            Column::Department => json!(self.department),
            Column::Division => json!(self.division),
            Column::ReportingManager => json!(self.reporting_manager),
            Column::GradeCode => json!(self.grade_code),
            Column::Designation => json!(self.designation),
            Column::DirectIndirect => json!(self.direct_indirect),
            Column::Roster => json!(self.roster),
            Column::ShiftName => json!(self.shift_name),
            Column::JoinDate => json!(self.join_date),
            Column::AttendanceDate => json!(self.attendance_date.format("%Y-%m-%d").to_string()),
            Column::InTime => json!(self.in_time),
            Column::OutTime => json!(self.out_time),
            Column::TotalHours => json!(self.total_hours),
            Column::OtHours => json!(self.ot_hours),
            Column::LateHours => json!(self.late_hours),
            Column::ApplicationStatus => json!(self.application_status),
            Column::FinalStatus => json!(self.final_status),
            Column::AttendanceType => json!(self.attendance_type),
        }
    }
}

/// Organisational metadata fabricated per employee when the source lacks it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OrgAttributes {
    #[schema(example = "L2")]
    pub skill_level: String,
    #[schema(example = "Permanent")]
    pub employment_type: String,
    #[schema(example = "Line A")]
    pub production_line: String,
    #[schema(example = "Female")]
    pub gender: String,
    #[schema(example = "Shift B")]
    pub shift: String,
}

/// Canonical reading of the free-text Final Status column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum StatusClass {
    Present,
    Absent,
    Leave,
    #[strum(serialize = "Half-Day")]
    HalfDay,
    Pending,
    Other,
}

impl StatusClass {
    pub fn classify(status: &str) -> Self {
        let s = status.trim().to_lowercase();
        match s.as_str() {
            "p" | "present" => StatusClass::Present,
            "a" | "absent" => StatusClass::Absent,
            "l" | "leave" | "on leave" => StatusClass::Leave,
            "hd" | "half-day" | "half day" | "absent half day" => StatusClass::HalfDay,
            "pending" => StatusClass::Pending,
            _ => StatusClass::Other,
        }
    }
}

/// Normalized rows of one or more sheets.
///
/// `missing` lists canonical columns that no contributing sheet provided;
/// their values are defaults and views grouped on them report unavailable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttendanceTable {
    pub records: Vec<AttendanceRecord>,
    pub missing: BTreeSet<Column>,
}

impl AttendanceTable {
    pub fn new(records: Vec<AttendanceRecord>, missing: BTreeSet<Column>) -> Self {
        Self { records, missing }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn has_column(&self, column: Column) -> bool {
        !self.missing.contains(&column)
    }

    pub fn max_date(&self) -> Option<NaiveDate> {
        self.records.iter().map(|r| r.attendance_date).max()
    }

    pub fn min_date(&self) -> Option<NaiveDate> {
        self.records.iter().map(|r| r.attendance_date).min()
    }

    /// Distinct employee ids, sorted.
    pub fn employee_ids(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| r.emp_id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Same table shape holding only the rows `keep` accepts.
    pub fn retain_view(&self, keep: impl Fn(&AttendanceRecord) -> bool) -> Self {
        Self {
            records: self.records.iter().filter(|r| keep(r)).cloned().collect(),
            missing: self.missing.clone(),
        }
    }
}
