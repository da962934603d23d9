//! Subject grading and report filtering.
//!
//! This module discovers subjects in a normalized table, derives totals and
//! contribution percentages, classifies each student into a fail reason, and
//! projects the graded table into failure and borderline reports.

pub mod analyzer;
pub mod filters;
pub mod grade;
pub mod grader;
pub mod simulate;
pub mod types;
pub mod utility;
