//! CPM impression billing: the hourly pass that turns unbilled
//! impressions into wallet debits and spend-counter updates.

pub mod biller;

pub use biller::{BillingSummary, ImpressionBiller};
