//! Approximate filler data for dashboards whose source lacks organisational
//! or historical depth. Nothing here is derived from uploaded values beyond
//! the employee ids and the anchor date; callers must label it synthetic.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::Rng;

use crate::model::attendance::{AttendanceRecord, AttendanceTable, OrgAttributes};
use crate::model::request::Period;
use crate::model::view::{AttritionPoint, BufferPoint};
use crate::pipeline::aggregate::bucket_start;

pub const SKILL_LEVELS: &[&str] = &["L1", "L2", "L3", "L4"];
pub const EMPLOYMENT_TYPES: &[&str] = &["Permanent", "Contract", "Temporary"];
pub const PRODUCTION_LINES: &[&str] = &["Line A", "Line B", "Line C", "Line D"];
pub const GENDERS: &[&str] = &["Male", "Female"];
pub const SHIFTS: &[&str] = &["Shift A", "Shift B", "Shift C"];

pub const HISTORY_DAYS: i64 = 180;
pub const ATTRITION_LOOKBACK_DAYS: i64 = 365;
pub const BUFFER_LOOKBACK_DAYS: i64 = 30;

const STATUS_WEIGHTS: &[(&str, f64)] = &[
    ("Present", 0.85),
    ("Absent", 0.07),
    ("Leave", 0.05),
    ("Half-Day", 0.03),
];
const WEEKEND_SKIP_PROBABILITY: f64 = 0.8;

// Organisation lists for demo employees.
const BRANCH_CODES: &[&str] = &["P001", "P002", "P003", "P004", "P005"];
const DEPARTMENTS: &[&str] = &["Quality", "Production", "HR", "Finance", "IT"];
const DIVISIONS: &[&str] = &["Warranty", "Manufacturing", "Recruitment", "Accounting", "Support"];
const GRADE_CODES: &[&str] = &["C1", "C2", "C3", "C4", "C5"];
const DESIGNATIONS: &[&str] = &["Engineer", "Manager", "Executive", "DM", "Supervisor"];
const DIRECT_INDIRECT: &[&str] = &["Direct", "Indirect"];
const ROSTERS: &[&str] = &["Working Day (G)", "Holiday", "Weekend"];
const FIRST_NAMES: &[&str] = &[
    "Amina", "Bilal", "Chen", "Daniela", "Erik", "Farah", "Goran", "Hana", "Ivan", "Jia",
];
const LAST_NAMES: &[&str] = &[
    "Rahman", "Okafor", "Silva", "Novak", "Haddad", "Kim", "Moreau", "Patel", "Larsen", "Ito",
];
const DEMO_FIRST_ID: u32 = 30000;

fn pick<R: Rng>(rng: &mut R, options: &[&str]) -> String {
    options[rng.gen_range(0..options.len())].to_string()
}

/// `end` moved back `days`, clamped to the earliest representable date.
fn days_before(end: NaiveDate, days: i64) -> NaiveDate {
    end.checked_sub_signed(Duration::days(days))
        .unwrap_or(NaiveDate::MIN)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// One uniform draw per category, once per distinct id. Ids are visited in
/// sorted order so a seed always yields the same assignment.
pub fn assign_profiles<R: Rng>(
    emp_ids: impl IntoIterator<Item = String>,
    rng: &mut R,
) -> BTreeMap<String, OrgAttributes> {
    let ids: BTreeSet<String> = emp_ids.into_iter().collect();
    ids.into_iter()
        .map(|id| {
            let attrs = OrgAttributes {
                skill_level: pick(rng, SKILL_LEVELS),
                employment_type: pick(rng, EMPLOYMENT_TYPES),
                production_line: pick(rng, PRODUCTION_LINES),
                gender: pick(rng, GENDERS),
                shift: pick(rng, SHIFTS),
            };
            (id, attrs)
        })
        .collect()
}

/// Copies `profiles` onto every row of the matching employee.
pub fn attach_profiles(
    table: &AttendanceTable,
    profiles: &BTreeMap<String, OrgAttributes>,
) -> AttendanceTable {
    let records = table
        .records
        .iter()
        .map(|r| {
            let mut r = r.clone();
            r.attributes = profiles.get(&r.emp_id).cloned();
            r
        })
        .collect();
    AttendanceTable::new(records, table.missing.clone())
}

fn weighted_status<R: Rng>(rng: &mut R) -> &'static str {
    let roll: f64 = rng.gen_range(0.0..1.0);
    let mut acc = 0.0;
    for &(status, weight) in STATUS_WEIGHTS {
        acc += weight;
        if roll < acc {
            return status;
        }
    }
    STATUS_WEIGHTS[0].0
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

fn fill_day<R: Rng>(record: &mut AttendanceRecord, status: &str, rng: &mut R) {
    record.final_status = status.to_string();
    match status {
        "Present" => {
            record.in_time = format!("{:02}:{:02}", rng.gen_range(7..10), rng.gen_range(0..60));
            record.out_time = format!("{:02}:{:02}", rng.gen_range(16..20), rng.gen_range(0..60));
            record.total_hours = round2(rng.gen_range(6.0..9.0));
            record.ot_hours = round2(rng.gen_range(0.0..2.0));
            record.late_hours = round2(rng.gen_range(0.0..1.0));
            record.attendance_type = "Full Day".to_string();
        }
        "Half-Day" => {
            record.in_time = format!("{:02}:{:02}", rng.gen_range(8..13), rng.gen_range(0..60));
            record.out_time = format!("{:02}:{:02}", rng.gen_range(13..18), rng.gen_range(0..60));
            record.total_hours = round2(rng.gen_range(3.0..5.0));
            record.ot_hours = 0.0;
            record.late_hours = 0.0;
            record.attendance_type = "Half Day".to_string();
        }
        other => {
            record.in_time = "00:00".to_string();
            record.out_time = "00:00".to_string();
            record.total_hours = 0.0;
            record.ot_hours = 0.0;
            record.late_hours = 0.0;
            record.attendance_type = if other == "Leave" { "Leave" } else { "Absent" }.to_string();
        }
    }
}

/// Daily rows for each template employee over the [`HISTORY_DAYS`] days
/// ending at `end`. Weekend days are mostly skipped.
pub fn synthetic_history<R: Rng>(
    templates: &[AttendanceRecord],
    end: NaiveDate,
    rng: &mut R,
) -> Vec<AttendanceRecord> {
    let start = days_before(end, HISTORY_DAYS - 1);
    let mut rows = Vec::new();
    for template in templates {
        for date in start.iter_days().take_while(|d| *d <= end) {
            if is_weekend(date) && rng.gen_bool(WEEKEND_SKIP_PROBABILITY) {
                continue;
            }
            let mut row = template.clone();
            row.attendance_date = date;
            row.application_status = "Synthetic".to_string();
            let status = weighted_status(rng);
            fill_day(&mut row, status, rng);
            rows.push(row);
        }
    }
    rows
}

/// First row of every employee, used as the template for its history.
pub fn templates_of(table: &AttendanceTable) -> Vec<AttendanceRecord> {
    let mut seen = BTreeSet::new();
    table
        .records
        .iter()
        .filter(|r| seen.insert(r.emp_id.clone()))
        .cloned()
        .collect()
}

/// Monthly attrition rate (percent) over the last year.
pub fn attrition_series<R: Rng>(end: NaiveDate, rng: &mut R) -> Vec<AttritionPoint> {
    let mut month = bucket_start(days_before(end, ATTRITION_LOOKBACK_DAYS), Period::Monthly);
    let last = bucket_start(end, Period::Monthly);
    let mut points = Vec::new();
    while month <= last {
        points.push(AttritionPoint {
            month,
            rate: round2(rng.gen_range(0.5..5.0)),
        });
        month = match month.checked_add_months(chrono::Months::new(1)) {
            Some(next) => next,
            None => break,
        };
    }
    points
}

/// Daily required vs. available manpower over the last month.
pub fn buffer_series<R: Rng>(end: NaiveDate, rng: &mut R) -> Vec<BufferPoint> {
    days_before(end, BUFFER_LOOKBACK_DAYS - 1)
        .iter_days()
        .take_while(|d| *d <= end)
        .map(|date| {
            let required: u32 = rng.gen_range(80..=120);
            let available: u32 = rng.gen_range(70..=130);
            BufferPoint {
                date,
                required,
                available,
                buffer: available as i64 - required as i64,
            }
        })
        .collect()
}

/// Organisation rows for `count` made-up employees, attributes attached.
pub fn demo_roster<R: Rng>(count: usize, rng: &mut R) -> Vec<AttendanceRecord> {
    let ids: Vec<String> = (0..count as u32)
        .map(|i| (DEMO_FIRST_ID + i + 1).to_string())
        .collect();
    let profiles = assign_profiles(ids.clone(), rng);

    ids.into_iter()
        .map(|emp_id| {
            let attributes = profiles.get(&emp_id).cloned();
            let shift = attributes
                .as_ref()
                .map(|a| a.shift.clone())
                .unwrap_or_else(|| pick(rng, SHIFTS));
            AttendanceRecord {
                attendance_code: emp_id.clone(),
                name: format!("{} {}", pick(rng, FIRST_NAMES), pick(rng, LAST_NAMES)),
                branch_code: pick(rng, BRANCH_CODES),
                department: pick(rng, DEPARTMENTS),
                division: pick(rng, DIVISIONS),
                reporting_manager: format!("{} {}", pick(rng, FIRST_NAMES), pick(rng, LAST_NAMES)),
                grade_code: pick(rng, GRADE_CODES),
                designation: pick(rng, DESIGNATIONS),
                direct_indirect: pick(rng, DIRECT_INDIRECT),
                roster: pick(rng, ROSTERS),
                shift_name: shift,
                join_date: "Unknown".to_string(),
                attendance_date: NaiveDate::MIN,
                in_time: "00:00".to_string(),
                out_time: "00:00".to_string(),
                total_hours: 0.0,
                ot_hours: 0.0,
                late_hours: 0.0,
                application_status: "Synthetic".to_string(),
                final_status: "Pending".to_string(),
                attendance_type: "Unknown".to_string(),
                attributes,
                emp_id,
            }
        })
        .collect()
}

/// A complete, fully synthetic attendance table ending at `end`.
pub fn demo_table<R: Rng>(employees: usize, end: NaiveDate, rng: &mut R) -> AttendanceTable {
    let roster = demo_roster(employees.max(1), rng);
    AttendanceTable::new(synthetic_history(&roster, end, rng), BTreeSet::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::test_support::record;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn profiles_are_stable_per_employee() {
        let mut rng = StdRng::seed_from_u64(7);
        let table = AttendanceTable::new(
            vec![
                record("A", ymd(2024, 6, 1), "Present"),
                record("B", ymd(2024, 6, 1), "Present"),
                record("A", ymd(2024, 6, 2), "Absent"),
                record("A", ymd(2024, 6, 3), "Leave"),
            ],
            BTreeSet::new(),
        );
        let profiles = assign_profiles(table.employee_ids(), &mut rng);
        assert_eq!(profiles.len(), 2);
        let augmented = attach_profiles(&table, &profiles);
        let a_rows: Vec<_> = augmented.records.iter().filter(|r| r.emp_id == "A").collect();
        assert!(a_rows.windows(2).all(|w| w[0].attributes == w[1].attributes));
        assert!(a_rows[0].attributes.is_some());
        let attrs = a_rows[0].attributes.as_ref().unwrap();
        assert!(SKILL_LEVELS.contains(&attrs.skill_level.as_str()));
        assert!(SHIFTS.contains(&attrs.shift.as_str()));
    }

    #[test]
    fn same_seed_same_profiles() {
        let ids = vec!["3".to_string(), "1".to_string(), "2".to_string()];
        let a = assign_profiles(ids.clone(), &mut StdRng::seed_from_u64(11));
        let b = assign_profiles(ids, &mut StdRng::seed_from_u64(11));
        assert_eq!(a, b);
    }

    #[test]
    fn history_covers_180_days_and_mostly_skips_weekends() {
        let mut rng = StdRng::seed_from_u64(3);
        // a Friday, so the anchor day is never a skipped weekend
        let end = ymd(2024, 6, 28);
        let templates = vec![record("1", end, "Present"), record("2", end, "Present")];
        let rows = synthetic_history(&templates, end, &mut rng);

        let first = rows.iter().map(|r| r.attendance_date).min().unwrap();
        let last = rows.iter().map(|r| r.attendance_date).max().unwrap();
        assert!(first >= end - Duration::days(HISTORY_DAYS - 1));
        assert_eq!(last, end);

        let weekdays = rows.iter().filter(|r| !is_weekend(r.attendance_date)).count();
        let weekends = rows.len() - weekdays;
        // every weekday is kept: 2 employees x weekdays in the window
        let window_weekdays = (0..HISTORY_DAYS)
            .map(|o| end - Duration::days(o))
            .filter(|d| !is_weekend(*d))
            .count();
        assert_eq!(weekdays, 2 * window_weekdays);
        assert!(weekends < weekdays / 3);

        let present = rows.iter().filter(|r| r.final_status == "Present").count();
        assert!(present as f64 / rows.len() as f64 > 0.7);
        assert!(rows.iter().all(|r| r.ot_hours >= 0.0 && r.total_hours >= 0.0));
    }

    #[test]
    fn trend_series_cover_their_lookbacks() {
        let mut rng = StdRng::seed_from_u64(5);
        let end = ymd(2024, 6, 30);
        let attrition = attrition_series(end, &mut rng);
        assert_eq!(attrition.first().unwrap().month, ymd(2023, 7, 1));
        assert_eq!(attrition.len(), 12);
        assert_eq!(attrition.last().unwrap().month, ymd(2024, 6, 1));
        assert!(attrition.iter().all(|p| (0.5..=5.0).contains(&p.rate)));

        let buffer = buffer_series(end, &mut rng);
        assert_eq!(buffer.len(), BUFFER_LOOKBACK_DAYS as usize);
        assert_eq!(buffer.last().unwrap().date, end);
        assert!(buffer.iter().all(|b| (80..=120).contains(&b.required)
            && (70..=130).contains(&b.available)
            && b.buffer == b.available as i64 - b.required as i64));
    }

    #[test]
    fn series_clamp_at_earliest_date() {
        let mut rng = StdRng::seed_from_u64(13);
        let end = NaiveDate::MIN;
        let templates = vec![record("1", end, "Present")];

        let rows = synthetic_history(&templates, end, &mut rng);
        assert!(rows.len() <= 1);
        assert!(rows.iter().all(|r| r.attendance_date == end));

        let attrition = attrition_series(end, &mut rng);
        assert_eq!(attrition.len(), 1);
        assert_eq!(attrition[0].month, bucket_start(end, Period::Monthly));

        let buffer = buffer_series(end, &mut rng);
        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer[0].date, end);
    }

    #[test]
    fn demo_table_is_fully_attributed() {
        let mut rng = StdRng::seed_from_u64(1);
        let table = demo_table(5, ymd(2024, 6, 30), &mut rng);
        assert_eq!(table.employee_ids().len(), 5);
        assert!(table.missing.is_empty());
        assert!(table.records.iter().all(|r| r.attributes.is_some()));
        assert!(table.records.iter().all(|r| r.shift_name == r.effective_shift(false)));
    }
}
