use chrono::{Duration, NaiveDate};

use crate::error::DashboardError;
use crate::model::attendance::{AttendanceRecord, AttendanceTable};
use crate::model::request::{CategoryFilters, DateWindow, Period, Selection};
use crate::model::schema::Column;
use crate::model::view::DateSpan;

impl CategoryFilters {
    /// All dimensions AND-ed together. `source_has_shift` tells whether the
    /// uploaded sheets carried a Shift Name column.
    pub fn matches(&self, record: &AttendanceRecord, source_has_shift: bool) -> bool {
        let attrs = record.attributes.as_ref();
        self.department.matches(&record.department)
            && self.division.matches(&record.division)
            && self.direct_indirect.matches(&record.direct_indirect)
            && self
                .skill_level
                .matches_opt(attrs.map(|a| a.skill_level.as_str()))
            && self
                .employment_type
                .matches_opt(attrs.map(|a| a.employment_type.as_str()))
            && self.shift.matches(record.effective_shift(source_has_shift))
    }

    /// First concrete filter on a dimension that only exists after
    /// augmentation.
    pub fn synthetic_dimension(&self) -> Option<&'static str> {
        if self.skill_level != Selection::All {
            Some("skill_level")
        } else if self.employment_type != Selection::All {
            Some("employment_type")
        } else {
            None
        }
    }
}

pub fn apply_filters(table: &AttendanceTable, filters: &CategoryFilters) -> AttendanceTable {
    let source_has_shift = table.has_column(Column::ShiftName);
    table.retain_view(|r| filters.matches(r, source_has_shift))
}

/// Inclusive `[max - lookback, max]` for a named period.
pub fn period_window(period: Period, max_date: NaiveDate) -> DateSpan {
    DateSpan {
        start: max_date
            .checked_sub_signed(Duration::days(period.lookback_days()))
            .unwrap_or(NaiveDate::MIN),
        end: max_date,
    }
}

/// Concrete bounds of `window` over `table`; `None` when the window is
/// unbounded or the table has no dates to anchor a period to.
pub fn resolve_window(
    table: &AttendanceTable,
    window: &DateWindow,
) -> Result<Option<DateSpan>, DashboardError> {
    match window {
        DateWindow::All => Ok(None),
        DateWindow::Range { start, end } => {
            if start > end {
                return Err(DashboardError::InvalidDateRange {
                    start: *start,
                    end: *end,
                });
            }
            Ok(Some(DateSpan {
                start: *start,
                end: *end,
            }))
        }
        DateWindow::Period { period } => {
            Ok(table.max_date().map(|max| period_window(*period, max)))
        }
    }
}

pub fn apply_window(table: &AttendanceTable, span: Option<&DateSpan>) -> AttendanceTable {
    match span {
        None => table.clone(),
        Some(span) => table.retain_view(|r| {
            r.attendance_date >= span.start && r.attendance_date <= span.end
        }),
    }
}
