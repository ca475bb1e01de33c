pub mod csv_export;
pub mod json_rows;

pub use csv_export::parse_progress_csv;
pub use json_rows::parse_progress_json;
