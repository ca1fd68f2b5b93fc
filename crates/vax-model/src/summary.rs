use serde::{Deserialize, Serialize};

/// Per-year totals and the protected/enrolled ratio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearSummary {
    pub sum_enrolled: u64,
    pub sum_protected: u64,
    pub ratio: f64,
}

impl YearSummary {
    /// Ratio as a percentage, for display.
    pub fn percent(&self) -> f64 {
        self.ratio * 100.0
    }
}
