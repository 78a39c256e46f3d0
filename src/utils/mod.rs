pub mod parse;
pub mod session_store;
pub mod workbook_reader;
