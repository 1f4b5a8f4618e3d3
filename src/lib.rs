//! Student records service built around an academic eligibility
//! (correlatividades) engine: state extraction over an append-only movement
//! ledger, prerequisite rule lookup, enrollment/exam eligibility verdicts,
//! and validation of new academic movements.

pub mod academics;
pub mod config;
pub mod error;
pub mod telemetry;
