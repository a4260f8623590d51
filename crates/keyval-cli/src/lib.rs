//! CLI library components for the submission key validator.

pub mod logging;
pub mod report;
