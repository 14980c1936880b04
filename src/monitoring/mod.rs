pub mod csv_report;
pub mod render;
