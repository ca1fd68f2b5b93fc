//! CLI library components for the survey reconciliation tool.

pub mod logging;
pub mod pipeline;
