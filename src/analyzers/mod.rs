//! Attendance aggregation and period comparison.
//!
//! This module filters the loaded records, buckets them into day, week or
//! month series, ranks instructors, classes and facilities, compares the
//! selected range against a prior window, and summarizes the result for the
//! dashboard.

pub mod aggregate;
pub mod categories;
pub mod compare;
pub mod dashboard;
pub mod dates;
pub mod facilities;
pub mod filter;
pub mod insights;
pub mod metrics;
pub mod rank;
pub mod types;
pub mod utility;
