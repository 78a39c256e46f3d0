use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};
use utoipa::ToSchema;

/// Value of one categorical filter; `"All"` disables the dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Selection {
    #[default]
    All,
    Only(String),
}

pub const ALL: &str = "All";

impl Selection {
    pub fn only(value: impl Into<String>) -> Self {
        Selection::Only(value.into())
    }

    pub fn matches(&self, value: &str) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(wanted) => wanted == value,
        }
    }

    /// Match against an optional value; a concrete selection never matches
    /// a row that lacks the dimension.
    pub fn matches_opt(&self, value: Option<&str>) -> bool {
        match (self, value) {
            (Selection::All, _) => true,
            (Selection::Only(_), None) => false,
            (Selection::Only(_), Some(v)) => self.matches(v),
        }
    }
}

impl From<String> for Selection {
    fn from(value: String) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(ALL) {
            Selection::All
        } else {
            Selection::Only(trimmed.to_string())
        }
    }
}

impl From<Selection> for String {
    fn from(value: Selection) -> Self {
        match value {
            Selection::All => ALL.to_string(),
            Selection::Only(v) => v,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct CategoryFilters {
    #[schema(value_type = String, example = "All")]
    pub department: Selection,
    #[schema(value_type = String, example = "All")]
    pub division: Selection,
    #[schema(value_type = String, example = "Direct")]
    pub direct_indirect: Selection,
    #[schema(value_type = String, example = "L2")]
    pub skill_level: Selection,
    #[schema(value_type = String, example = "All")]
    pub employment_type: Selection,
    #[schema(value_type = String, example = "All")]
    pub shift: Selection,
}

/// Period granularity: sets both the lookback window and the trend bucket.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumIter,
    EnumString,
    Serialize,
    Deserialize,
    ToSchema,
)]
pub enum Period {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl Period {
    /// Days looked back from the latest attendance date.
    pub fn lookback_days(self) -> i64 {
        match self {
            Period::Daily => 7,
            Period::Weekly => 30,
            Period::Monthly => 180,
            Period::Quarterly => 365,
            Period::Yearly => 1095,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DateWindow {
    #[default]
    All,
    Range {
        #[schema(example = "2024-06-01", format = "date", value_type = String)]
        start: NaiveDate,
        #[schema(example = "2024-06-30", format = "date", value_type = String)]
        end: NaiveDate,
    },
    Period {
        period: Period,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DashboardView {
    /// One worksheet on its own.
    SheetWise {
        #[schema(example = "Jan-2024")]
        sheet: String,
    },
    /// Every worksheet concatenated.
    #[default]
    AllSheets,
    /// Every worksheet concatenated, narrowed to one employee.
    Employee {
        #[schema(example = "30001")]
        emp_id: String,
    },
}

/// Everything one dashboard pass depends on besides the uploaded data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct DashboardRequest {
    pub view: DashboardView,
    pub filters: CategoryFilters,
    pub window: DateWindow,
    /// Attach synthetic organisational attributes and trend series.
    #[schema(example = false)]
    pub augment: bool,
    /// Seed for synthetic data; a fresh one is drawn when absent.
    #[schema(example = 42)]
    pub seed: Option<u64>,
    /// Maximum rows in the data preview.
    #[schema(example = 200)]
    pub preview_rows: Option<usize>,
}
