use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use tracing::debug;

use crate::model::attendance::{AttendanceRecord, AttendanceTable};
use crate::model::schema::{Column, ColumnKind, ExpectedSchema, FillValue, TEXT_PLACEHOLDER};
use crate::model::table::{Cell, EMPTY_CELL, RawTable};
use crate::utils::parse::{identifier_text, parse_date, parse_number, plain_text, time_text};

/// Reconciles one raw sheet against `schema`.
///
/// Unknown columns are dropped, absent ones are treated as empty and listed
/// in [`AttendanceTable::missing`]. Rows whose attendance date does not parse
/// are dropped; every other gap is filled with its column default. A sheet
/// with no surviving rows yields an empty table, not an error.
pub fn normalize(raw: &RawTable, schema: &ExpectedSchema) -> AttendanceTable {
    // First occurrence wins when a header repeats.
    let mut positions: HashMap<Column, usize> = HashMap::new();
    for (idx, header) in raw.headers.iter().enumerate() {
        if let Some(column) = schema.resolve(header) {
            positions.entry(column).or_insert(idx);
        }
    }

    let missing: BTreeSet<Column> = Column::all()
        .filter(|c| !positions.contains_key(c))
        .collect();

    let mut records = Vec::with_capacity(raw.rows.len());
    let mut dropped = 0usize;

    for row_idx in 0..raw.rows.len() {
        let row = RowReader {
            raw,
            schema,
            positions: &positions,
            row: row_idx,
        };

        let attendance_date: NaiveDate = match parse_date(row.cell(Column::AttendanceDate)) {
            Some(d) => d,
            None => {
                dropped += 1;
                continue;
            }
        };

        records.push(AttendanceRecord {
            emp_id: row.text(Column::EmpId),
            attendance_code: row.text(Column::AttendanceCode),
            name: row.text(Column::Name),
            branch_code: row.text(Column::BranchCode),
            department: row.text(Column::Department),
            division: row.text(Column::Division),
            reporting_manager: row.text(Column::ReportingManager),
            grade_code: row.text(Column::GradeCode),
            designation: row.text(Column::Designation),
            direct_indirect: row.text(Column::DirectIndirect),
            roster: row.text(Column::Roster),
            shift_name: row.text(Column::ShiftName),
            join_date: row.text(Column::JoinDate),
            attendance_date,
            in_time: row.text(Column::InTime),
            out_time: row.text(Column::OutTime),
            total_hours: row.hours(Column::TotalHours),
            ot_hours: row.hours(Column::OtHours),
            late_hours: row.hours(Column::LateHours),
            application_status: row.text(Column::ApplicationStatus),
            final_status: row.text(Column::FinalStatus),
            attendance_type: row.text(Column::AttendanceType),
            attributes: None,
        });
    }

    debug!(
        kept = records.len(),
        dropped,
        missing = missing.len(),
        "Sheet normalized"
    );
    AttendanceTable::new(records, missing)
}

/// Union of several normalized sheets. A column counts as missing only when
/// every contributing sheet lacked it.
pub fn concat(tables: impl IntoIterator<Item = AttendanceTable>) -> AttendanceTable {
    let mut records = Vec::new();
    let mut missing: Option<BTreeSet<Column>> = None;

    for table in tables {
        missing = Some(match missing {
            None => table.missing,
            Some(acc) => acc.intersection(&table.missing).copied().collect(),
        });
        records.extend(table.records);
    }

    AttendanceTable::new(records, missing.unwrap_or_else(|| Column::all().collect()))
}

struct RowReader<'a> {
    raw: &'a RawTable,
    schema: &'a ExpectedSchema,
    positions: &'a HashMap<Column, usize>,
    row: usize,
}

impl<'a> RowReader<'a> {
    fn cell(&self, column: Column) -> &'a Cell {
        match self.positions.get(&column) {
            Some(col) => self.raw.cell(self.row, *col),
            None => &EMPTY_CELL,
        }
    }

    fn fill(&self, column: Column) -> FillValue {
        match self.schema.spec(column) {
            Some(spec) => spec.fill_value(),
            // Outside a custom schema: same policy as a missing column.
            None => column
                .default_value()
                .unwrap_or(match column.kind() {
                    ColumnKind::Numeric => FillValue::Number(0.0),
                    _ => FillValue::Text(TEXT_PLACEHOLDER),
                }),
        }
    }

    fn text(&self, column: Column) -> String {
        let cell = self.cell(column);
        let value = match column.kind() {
            ColumnKind::Identifier => identifier_text(cell),
            ColumnKind::Time => time_text(cell),
            _ => plain_text(cell),
        };
        value.unwrap_or_else(|| match self.fill(column) {
            FillValue::Text(t) => t.to_string(),
            FillValue::Number(n) => n.to_string(),
        })
    }

    /// Hours are never negative after coercion.
    fn hours(&self, column: Column) -> f64 {
        let fallback = match self.fill(column) {
            FillValue::Number(n) => n,
            FillValue::Text(_) => 0.0,
        };
        parse_number(self.cell(column))
            .unwrap_or(fallback)
            .max(0.0)
    }
}
