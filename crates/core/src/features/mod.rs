//! Feature derivation for the price model.
//!
//! Serving (`derive`) and training (`training_rows`) share the same window
//! arithmetic in `window`, so a vector derived for a date with a full
//! 30-record history is identical to the row the model was trained on.

pub mod derive;
pub mod fallback;
pub mod stats;
pub mod training;
mod window;

pub use derive::{derive, DerivedFeatures};
pub use training::{training_rows, TrainingRow};

/// Records needed for `ma7` and `volatility`; fewer is an error.
pub const MIN_WINDOW: usize = 7;
/// Longest trailing window considered (`ma30`).
pub const MAX_WINDOW: usize = 30;
