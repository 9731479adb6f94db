use crate::features::stats::{mean, population_std};

/// Rolling statistics of a trailing window, before and after substitution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RollingStats {
    pub ma7: f64,
    pub ma30: f64,
    pub volatility: f64,
}

impl RollingStats {
    pub fn has_undefined(&self) -> bool {
        self.ma7.is_nan() || self.ma30.is_nan() || self.volatility.is_nan()
    }
}

/// Replaces undefined rolling statistics with whole-window substitutes:
/// the moving averages fall back to the mean close of `closes`, the
/// volatility to its population standard deviation. Defined values pass
/// through untouched.
pub fn fill_undefined(stats: RollingStats, closes: &[f64]) -> RollingStats {
    if !stats.has_undefined() {
        return stats;
    }

    tracing::warn!(
        ma7 = stats.ma7,
        ma30 = stats.ma30,
        volatility = stats.volatility,
        window = closes.len(),
        "undefined rolling statistic; substituting whole-window values"
    );

    let window_mean = mean(closes);
    RollingStats {
        ma7: if stats.ma7.is_nan() { window_mean } else { stats.ma7 },
        ma30: if stats.ma30.is_nan() { window_mean } else { stats.ma30 },
        volatility: if stats.volatility.is_nan() {
            population_std(closes)
        } else {
            stats.volatility
        },
    }
}
