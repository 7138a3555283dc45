//! # Inspection Reports
//!
//! Read-only views over inspection records: the dashboard, period summaries
//! and the CSV export. Nothing here mutates state.

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod csv;
pub mod dashboard;
pub mod service;

pub use dashboard::{
    percentage, CatalogTotals, DailyCount, Dashboard, InspectorBreakdown, PlantCount, ReportRange,
    StatusShare, StatusTotals, Summary, DEFAULT_WINDOW_DAYS, TOP_PLANTS,
};
pub use service::{CsvExport, ReportService};
