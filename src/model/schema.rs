use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, IntoStaticStr};
use utoipa::ToSchema;

/// Canonical attendance sheet columns, declared in canonical order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumIter,
    IntoStaticStr,
    Serialize,
    Deserialize,
    ToSchema,
)]
pub enum Column {
    #[strum(serialize = "EmpID")]
    #[serde(rename = "EmpID")]
    EmpId,
    #[strum(serialize = "Attendance Code")]
    #[serde(rename = "Attendance Code")]
    AttendanceCode,
    #[strum(serialize = "FName")]
    #[serde(rename = "FName")]
    Name,
    #[strum(serialize = "Branch Code")]
    #[serde(rename = "Branch Code")]
    BranchCode,
    #[strum(serialize = "Department Name")]
    #[serde(rename = "Department Name")]
    Department,
    #[strum(serialize = "Division Name")]
    #[serde(rename = "Division Name")]
    Division,
    #[strum(serialize = "Reporting Manager")]
    #[serde(rename = "Reporting Manager")]
    ReportingManager,
    #[strum(serialize = "Grade Code")]
    #[serde(rename = "Grade Code")]
    GradeCode,
    #[strum(serialize = "Designation Name")]
    #[serde(rename = "Designation Name")]
    Designation,
    #[strum(serialize = "Direct/Indirect")]
    #[serde(rename = "Direct/Indirect")]
    DirectIndirect,
    #[strum(serialize = "Roster")]
    #[serde(rename = "Roster")]
    Roster,
    #[strum(serialize = "Shift Name")]
    #[serde(rename = "Shift Name")]
    ShiftName,
    #[strum(serialize = "Join Date")]
    #[serde(rename = "Join Date")]
    JoinDate,
    #[strum(serialize = "Attendance Date")]
    #[serde(rename = "Attendance Date")]
    AttendanceDate,
    #[strum(serialize = "In Time")]
    #[serde(rename = "In Time")]
    InTime,
    #[strum(serialize = "Out Time")]
    #[serde(rename = "Out Time")]
    OutTime,
    #[strum(serialize = "Total Hours")]
    #[serde(rename = "Total Hours")]
    TotalHours,
    #[strum(serialize = "OT Hours")]
    #[serde(rename = "OT Hours")]
    OtHours,
    #[strum(serialize = "Late Hours")]
    #[serde(rename = "Late Hours")]
    LateHours,
    #[strum(serialize = "Application Status")]
    #[serde(rename = "Application Status")]
    ApplicationStatus,
    #[strum(serialize = "Final Status")]
    #[serde(rename = "Final Status")]
    FinalStatus,
    #[strum(serialize = "Attendance Type")]
    #[serde(rename = "Attendance Type")]
    AttendanceType,
}

/// How a column's raw cells are coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Codes compared as text, never as numbers.
    Identifier,
    Text,
    /// Clock time rendered as `HH:MM`.
    Time,
    Numeric,
    /// Row is dropped when the value does not parse.
    Date,
}

/// Value written into a cell that is empty after coercion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FillValue {
    Text(&'static str),
    Number(f64),
}

#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub column: Column,
    pub kind: ColumnKind,
    /// Field-specific default; wins over the kind default.
    pub default: Option<FillValue>,
}

impl ColumnSpec {
    pub fn fill_value(&self) -> FillValue {
        self.default.unwrap_or(match self.kind {
            ColumnKind::Numeric => FillValue::Number(0.0),
            _ => FillValue::Text(TEXT_PLACEHOLDER),
        })
    }
}

pub const TEXT_PLACEHOLDER: &str = "Unknown";

impl Column {
    /// Every column in canonical order.
    pub fn all() -> impl Iterator<Item = Column> {
        Column::iter()
    }

    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Resolves a sheet header to a canonical column, ignoring case and
    /// surrounding whitespace.
    pub fn from_header(header: &str) -> Option<Column> {
        HEADER_LOOKUP.get(&header_key(header)).copied()
    }

    pub fn kind(self) -> ColumnKind {
        match self {
            Column::EmpId | Column::AttendanceCode | Column::Roster => ColumnKind::Identifier,
            Column::AttendanceDate => ColumnKind::Date,
            Column::InTime | Column::OutTime => ColumnKind::Time,
            Column::TotalHours | Column::OtHours | Column::LateHours => ColumnKind::Numeric,
            _ => ColumnKind::Text,
        }
    }

    pub fn default_value(self) -> Option<FillValue> {
        match self {
            Column::EmpId => Some(FillValue::Text("0")),
            Column::AttendanceCode => Some(FillValue::Text("N/A")),
            Column::Name => Some(FillValue::Text("Unknown")),
            Column::InTime | Column::OutTime => Some(FillValue::Text("00:00")),
            Column::FinalStatus => Some(FillValue::Text("Pending")),
            _ => None,
        }
    }
}

fn header_key(header: &str) -> String {
    header.trim().to_lowercase()
}

static HEADER_LOOKUP: Lazy<HashMap<String, Column>> = Lazy::new(|| {
    Column::iter()
        .map(|column| (header_key(column.name()), column))
        .collect()
});

/// Ordered set of columns a normalized table is reconciled against.
#[derive(Debug, Clone)]
pub struct ExpectedSchema {
    specs: Vec<ColumnSpec>,
}

impl ExpectedSchema {
    /// The attendance schema: every [`Column`] in declaration order.
    pub fn attendance() -> Self {
        Self::from_columns(Column::iter())
    }

    pub fn from_columns(columns: impl IntoIterator<Item = Column>) -> Self {
        let mut specs: Vec<ColumnSpec> = Vec::new();
        for column in columns {
            if specs.iter().any(|s| s.column == column) {
                continue;
            }
            specs.push(ColumnSpec {
                column,
                kind: column.kind(),
                default: column.default_value(),
            });
        }
        Self { specs }
    }

    pub fn columns(&self) -> Vec<Column> {
        self.specs.iter().map(|s| s.column).collect()
    }

    pub fn spec(&self, column: Column) -> Option<&ColumnSpec> {
        self.specs.iter().find(|s| s.column == column)
    }

    /// Maps a raw header to a column of this schema, if it belongs to it.
    pub fn resolve(&self, header: &str) -> Option<Column> {
        Column::from_header(header).filter(|c| self.spec(*c).is_some())
    }
}

impl Default for ExpectedSchema {
    fn default() -> Self {
        Self::attendance()
    }
}
