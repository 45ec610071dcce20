// Insights module.
// Filtering and period bucketing over already-fetched search results.

pub mod filter;
pub mod report;

pub use filter::filter_out;
pub use report::{Buckets, monthly, render_monthly, render_weekly, weekly};
