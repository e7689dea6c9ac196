//! Staff-facing reporting: HR filters, the streamed CSV export and chart aggregation.

pub mod analytics;
pub mod csv_export;
pub mod filters;

pub use analytics::{AnalyticsQuery, ChartSeries, Period};
pub use filters::{TaskFilter, TaskFilterQuery};
