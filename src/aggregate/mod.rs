//! Derived views over stored responses: the table, its CSV export and the
//! per-question chart series.

pub mod chart;
pub mod csv;
pub mod svg;
pub mod table;

pub use chart::{chart_series, ChartSeries};
pub use csv::export_csv;
pub use table::ResponseTable;
