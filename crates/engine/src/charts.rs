//! Chart palette registration.
//!
//! Rendering layers historically registered chart plugins as a global
//! module side effect; here setup is an explicit, idempotent function
//! callable any number of times.

use std::sync::OnceLock;

/// Colors and labels shared by every chart on the dashboard.
#[derive(Debug)]
pub struct ChartPalette {
    /// Series colors cycled by the type-distribution chart.
    pub series: [&'static str; 5],
    /// One color per priority bucket, most severe first.
    pub priority: [&'static str; 3],
    pub priority_labels: [&'static str; 3],
}

static PALETTE: OnceLock<ChartPalette> = OnceLock::new();

/// Return the chart palette, initializing it on first call.
pub fn palette() -> &'static ChartPalette {
    PALETTE.get_or_init(|| ChartPalette {
        series: ["#FF6384", "#36A2EB", "#FFCE56", "#4BC0C0", "#9966FF"],
        priority: ["#FF6384", "#36A2EB", "#FFCE56"],
        priority_labels: ["Priority 1", "Priority 2", "Priority 3"],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_is_idempotent() {
        let first = palette() as *const ChartPalette;
        let second = palette() as *const ChartPalette;
        assert_eq!(first, second);
        assert_eq!(palette().series.len(), 5);
        assert_eq!(palette().priority_labels[0], "Priority 1");
    }
}
