use serde::{Deserialize, Serialize};

pub const FEATURE_COUNT: usize = 9;

/// Column order the model was trained on. Changing it silently corrupts
/// predictions, so artifacts are checked against it on load.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "open",
    "high",
    "low",
    "volume",
    "marketCap",
    "price_change",
    "ma7",
    "ma30",
    "volatility",
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub volume: f64,
    #[serde(rename = "marketCap")]
    pub market_cap: f64,
    pub price_change: f64,
    pub ma7: f64,
    pub ma30: f64,
    pub volatility: f64,
}

impl FeatureVector {
    /// Values in `FEATURE_NAMES` order.
    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.open,
            self.high,
            self.low,
            self.volume,
            self.market_cap,
            self.price_change,
            self.ma7,
            self.ma30,
            self.volatility,
        ]
    }

    pub fn from_array(values: [f64; FEATURE_COUNT]) -> Self {
        let [open, high, low, volume, market_cap, price_change, ma7, ma30, volatility] = values;
        Self {
            open,
            high,
            low,
            volume,
            market_cap,
            price_change,
            ma7,
            ma30,
            volatility,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.to_array().iter().all(|v| v.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_order_matches_feature_names() {
        let v = FeatureVector::from_array([1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
        assert_eq!(v.open, 1.0);
        assert_eq!(v.market_cap, 5.0);
        assert_eq!(v.volatility, 9.0);

        let json = serde_json::to_value(v).unwrap();
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        for name in FEATURE_NAMES {
            assert!(keys.contains(&name), "missing {name}");
        }
        assert_eq!(v.to_array(), [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
    }

    #[test]
    fn nan_field_is_not_finite() {
        let mut v = FeatureVector::from_array([1.0; FEATURE_COUNT]);
        assert!(v.is_finite());
        v.ma30 = f64::NAN;
        assert!(!v.is_finite());
    }
}
