pub mod features;
pub mod record;

pub use features::{FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
pub use record::HistoricalRecord;
