use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{Datelike, Duration, NaiveDate};

use crate::model::attendance::{AttendanceRecord, AttendanceTable, StatusClass};
use crate::model::request::Period;
use crate::model::schema::Column;
use crate::model::view::{
    AbsenteeismRate, CategoryCount, DataPreview, EmployeeTimeline, HistogramBin, HourCount,
    ManpowerPoint, MonthlyStatus, SummaryMetrics, TimelineEntry, View,
};
use crate::utils::parse::parse_hour;

pub const HISTOGRAM_BINS: usize = 20;

/// Grouping every view below needs; unavailable when absent from all sheets.
fn require<T>(table: &AttendanceTable, columns: &[Column], build: impl FnOnce() -> T) -> View<T> {
    match columns.iter().find(|c| !table.has_column(**c)) {
        Some(missing) => View::missing_column(*missing),
        None => View::Ready(build()),
    }
}

/// Row counts per label, largest first, ties by label.
pub fn value_counts<'a>(labels: impl IntoIterator<Item = &'a str>) -> Vec<CategoryCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for label in labels {
        *counts.entry(label).or_default() += 1;
    }
    let mut rows: Vec<CategoryCount> = counts
        .into_iter()
        .map(|(label, count)| CategoryCount {
            label: label.to_string(),
            count,
        })
        .collect();
    rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    rows
}

/// Distinct-employee counts per label. Each EmpID is counted once, under
/// the label of its first row.
pub fn headcount_by<'a>(
    records: impl IntoIterator<Item = &'a AttendanceRecord>,
    label: impl Fn(&'a AttendanceRecord) -> &'a str,
) -> Vec<CategoryCount> {
    let mut seen: HashSet<&str> = HashSet::new();
    let firsts = records
        .into_iter()
        .filter(|r| seen.insert(r.emp_id.as_str()))
        .map(label);
    value_counts(firsts)
}

pub fn summary_metrics(table: &AttendanceTable) -> SummaryMetrics {
    let distinct: HashSet<&str> = table.records.iter().map(|r| r.emp_id.as_str()).collect();
    SummaryMetrics {
        total_employees: distinct.len(),
        present_count: table
            .records
            .iter()
            .filter(|r| r.status_class() == StatusClass::Present)
            .count(),
        absent_count: table
            .records
            .iter()
            .filter(|r| r.status_class() == StatusClass::Absent)
            .count(),
        overtime_hours: table.records.iter().map(|r| r.ot_hours).sum(),
    }
}

pub fn status_distribution(table: &AttendanceTable) -> View<Vec<CategoryCount>> {
    require(table, &[Column::FinalStatus], || {
        value_counts(table.records.iter().map(|r| r.final_status.as_str()))
    })
}

pub fn attendance_type_distribution(table: &AttendanceTable) -> View<Vec<CategoryCount>> {
    require(table, &[Column::AttendanceType], || {
        value_counts(table.records.iter().map(|r| r.attendance_type.as_str()))
    })
}

/// Attendance events per department (rows, not employees).
pub fn department_attendance(table: &AttendanceTable) -> View<Vec<CategoryCount>> {
    require(table, &[Column::Department], || {
        value_counts(table.records.iter().map(|r| r.department.as_str()))
    })
}

pub fn department_headcount(table: &AttendanceTable) -> View<Vec<CategoryCount>> {
    require(table, &[Column::Department], || {
        headcount_by(&table.records, |r| r.department.as_str())
    })
}

pub fn division_headcount(table: &AttendanceTable) -> View<Vec<CategoryCount>> {
    require(table, &[Column::Division], || {
        headcount_by(&table.records, |r| r.division.as_str())
    })
}

pub fn shift_headcount(table: &AttendanceTable) -> View<Vec<CategoryCount>> {
    require(table, &[Column::ShiftName], || {
        headcount_by(&table.records, |r| r.shift_name.as_str())
    })
}

/// Rows per hour of `column` (In Time or Out Time). Times that do not parse
/// are left out of this view only.
pub fn hour_histogram(table: &AttendanceTable, column: Column) -> View<Vec<HourCount>> {
    require(table, &[column], || {
        let mut counts: BTreeMap<u32, usize> = BTreeMap::new();
        for record in &table.records {
            let raw = match column {
                Column::OutTime => &record.out_time,
                _ => &record.in_time,
            };
            if let Some(hour) = parse_hour(raw) {
                *counts.entry(hour).or_default() += 1;
            }
        }
        counts
            .into_iter()
            .map(|(hour, count)| HourCount { hour, count })
            .collect()
    })
}

/// Equal-width bins between the smallest and largest value.
pub fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    let (min, max) = match values.iter().copied().fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((f64::min(lo, v), f64::max(hi, v))),
    }) {
        Some(bounds) => bounds,
        None => return Vec::new(),
    };

    if bins == 0 || max == min {
        return vec![HistogramBin {
            start: min,
            end: max,
            count: values.len(),
        }];
    }

    let width = (max - min) / bins as f64;
    let mut out: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            start: min + width * i as f64,
            end: if i + 1 == bins {
                max
            } else {
                min + width * (i + 1) as f64
            },
            count: 0,
        })
        .collect();
    for v in values {
        let idx = (((v - min) / width).floor() as usize).min(bins - 1);
        out[idx].count += 1;
    }
    out
}

pub fn overtime_histogram(table: &AttendanceTable) -> View<Vec<HistogramBin>> {
    require(table, &[Column::OtHours], || {
        let values: Vec<f64> = table.records.iter().map(|r| r.ot_hours).collect();
        histogram(&values, HISTOGRAM_BINS)
    })
}

pub fn total_hours_histogram(table: &AttendanceTable) -> View<Vec<HistogramBin>> {
    require(table, &[Column::TotalHours], || {
        let values: Vec<f64> = table.records.iter().map(|r| r.total_hours).collect();
        histogram(&values, HISTOGRAM_BINS)
    })
}

/// Absent rows over all rows, per group key. A group without any Absent row
/// has no rate rather than a rate of zero.
fn absenteeism<'a>(
    records: impl IntoIterator<Item = &'a AttendanceRecord>,
    key: impl Fn(&AttendanceRecord) -> String,
) -> Vec<AbsenteeismRate> {
    let mut groups: BTreeMap<String, (usize, usize)> = BTreeMap::new();
    for record in records {
        let entry = groups.entry(key(record)).or_default();
        entry.1 += 1;
        if record.status_class() == StatusClass::Absent {
            entry.0 += 1;
        }
    }
    groups
        .into_iter()
        .map(|(key, (absent, total))| AbsenteeismRate {
            key,
            absent,
            total,
            rate: (absent > 0 && total > 0).then(|| absent as f64 / total as f64 * 100.0),
        })
        .collect()
}

pub fn absenteeism_by_date(table: &AttendanceTable) -> View<Vec<AbsenteeismRate>> {
    require(table, &[Column::FinalStatus], || {
        absenteeism(&table.records, |r| {
            r.attendance_date.format("%Y-%m-%d").to_string()
        })
    })
}

pub fn absenteeism_by_department(table: &AttendanceTable) -> View<Vec<AbsenteeismRate>> {
    require(table, &[Column::FinalStatus, Column::Department], || {
        absenteeism(&table.records, |r| r.department.clone())
    })
}

/// First day of the bucket `date` falls in; weeks start on Monday.
pub fn bucket_start(date: NaiveDate, period: Period) -> NaiveDate {
    let first = |month: u32| NaiveDate::from_ymd_opt(date.year(), month, 1).unwrap_or(date);
    match period {
        Period::Daily => date,
        Period::Weekly => date
            .checked_sub_signed(Duration::days(date.weekday().num_days_from_monday() as i64))
            .unwrap_or(date),
        Period::Monthly => first(date.month()),
        Period::Quarterly => first((date.month() - 1) / 3 * 3 + 1),
        Period::Yearly => first(1),
    }
}

/// Distinct present employees per bucket. Buckets with rows but nobody
/// present report zero.
pub fn manpower_trend<'a>(
    records: impl IntoIterator<Item = &'a AttendanceRecord>,
    period: Period,
) -> Vec<ManpowerPoint> {
    let mut buckets: BTreeMap<NaiveDate, HashSet<&str>> = BTreeMap::new();
    for record in records {
        let present = buckets
            .entry(bucket_start(record.attendance_date, period))
            .or_default();
        if record.status_class() == StatusClass::Present {
            present.insert(record.emp_id.as_str());
        }
    }
    buckets
        .into_iter()
        .map(|(bucket, present)| ManpowerPoint {
            bucket,
            headcount: present.len(),
        })
        .collect()
}

pub fn manpower_view(table: &AttendanceTable, period: Period) -> View<Vec<ManpowerPoint>> {
    require(table, &[Column::FinalStatus], || {
        manpower_trend(&table.records, period)
    })
}

pub fn employee_timeline(table: &AttendanceTable, emp_id: &str) -> EmployeeTimeline {
    let mut rows: Vec<&AttendanceRecord> =
        table.records.iter().filter(|r| r.emp_id == emp_id).collect();
    rows.sort_by_key(|r| r.attendance_date);

    let mut monthly: BTreeMap<(String, String), usize> = BTreeMap::new();
    for r in &rows {
        let month = r.attendance_date.format("%Y-%m").to_string();
        *monthly.entry((month, r.final_status.clone())).or_default() += 1;
    }

    EmployeeTimeline {
        emp_id: emp_id.to_string(),
        entries: rows
            .iter()
            .map(|r| TimelineEntry {
                date: r.attendance_date,
                final_status: r.final_status.clone(),
                ot_hours: r.ot_hours,
            })
            .collect(),
        monthly: monthly
            .into_iter()
            .map(|((month, status), count)| MonthlyStatus {
                month,
                status,
                count,
            })
            .collect(),
    }
}

/// First `limit` rows, restricted to `columns` in the given order.
pub fn data_preview(table: &AttendanceTable, columns: &[Column], limit: usize) -> DataPreview {
    DataPreview {
        columns: columns.iter().map(|c| c.name()).collect(),
        rows: table
            .records
            .iter()
            .take(limit)
            .map(|r| columns.iter().map(|c| r.value(*c)).collect())
            .collect(),
        total_rows: table.len(),
        truncated: table.len() > limit,
    }
}
