pub mod attendance;
pub mod request;
pub mod schema;
pub mod table;
pub mod view;
