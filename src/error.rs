use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use chrono::NaiveDate;
use derive_more::Display;
use serde_json::json;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Display)]
pub enum DashboardError {
    #[display(fmt = "workbook could not be read: {}", _0)]
    UnreadableWorkbook(String),

    #[display(fmt = "workbook contains no worksheets")]
    EmptyWorkbook,

    #[display(fmt = "upload body is empty")]
    EmptyUpload,

    #[display(fmt = "sheet '{}' does not exist in the workbook", _0)]
    UnknownSheet(String),

    #[display(fmt = "date range start {} is after end {}", start, end)]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[display(fmt = "workbook session {} was not found or has expired", _0)]
    UnknownSession(Uuid),

    #[display(fmt = "filter '{}' only applies to synthetic attributes; set augment to true", _0)]
    FilterNeedsAugmentation(&'static str),
}

impl std::error::Error for DashboardError {}

impl DashboardError {
    /// Faults in the uploaded data itself. The dashboard answers these with
    /// demo data; every other error reaches the caller unchanged.
    pub fn is_data_fault(&self) -> bool {
        matches!(
            self,
            DashboardError::UnreadableWorkbook(_) | DashboardError::EmptyWorkbook
        )
    }
}

impl ResponseError for DashboardError {
    fn status_code(&self) -> StatusCode {
        match self {
            DashboardError::UnreadableWorkbook(_) | DashboardError::EmptyWorkbook => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            DashboardError::EmptyUpload
            | DashboardError::UnknownSheet(_)
            | DashboardError::InvalidDateRange { .. }
            | DashboardError::FilterNeedsAugmentation(_) => StatusCode::BAD_REQUEST,
            DashboardError::UnknownSession(_) => StatusCode::NOT_FOUND,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "message": self.to_string()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_data_faults_fall_back() {
        assert!(DashboardError::EmptyWorkbook.is_data_fault());
        assert!(DashboardError::UnreadableWorkbook("zip".into()).is_data_fault());
        assert!(!DashboardError::UnknownSheet("Feb".into()).is_data_fault());
        assert!(!DashboardError::UnknownSession(Uuid::nil()).is_data_fault());
    }

    #[test]
    fn maps_to_http_status() {
        assert_eq!(
            DashboardError::UnknownSheet("Feb".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            DashboardError::UnknownSession(Uuid::nil()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            DashboardError::FilterNeedsAugmentation("skill_level").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert!(!DashboardError::FilterNeedsAugmentation("skill_level").is_data_fault());
        assert_eq!(
            DashboardError::UnknownSheet("Feb".into()).to_string(),
            "sheet 'Feb' does not exist in the workbook"
        );
    }
}
