pub mod dashboard;
pub mod workbook;
