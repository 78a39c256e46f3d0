pub mod aggregate;
pub mod dashboard;
pub mod filter;
pub mod normalizer;
pub mod synthetic;

#[cfg(test)]
pub mod test_support {
    use chrono::NaiveDate;

    use crate::model::attendance::AttendanceRecord;

    /// A normalized row with every field at its fill default.
    pub fn record(emp: &str, date: NaiveDate, status: &str) -> AttendanceRecord {
        let unknown = || "Unknown".to_string();
        AttendanceRecord {
            emp_id: emp.to_string(),
            attendance_code: "N/A".to_string(),
            name: unknown(),
            branch_code: unknown(),
            department: unknown(),
            division: unknown(),
            reporting_manager: unknown(),
            grade_code: unknown(),
            designation: unknown(),
            direct_indirect: unknown(),
            roster: unknown(),
            shift_name: unknown(),
            join_date: unknown(),
            attendance_date: date,
            in_time: "00:00".to_string(),
            out_time: "00:00".to_string(),
            total_hours: 0.0,
            ot_hours: 0.0,
            late_hours: 0.0,
            application_status: unknown(),
            final_status: status.to_string(),
            attendance_type: unknown(),
            attributes: None,
        }
    }
}
