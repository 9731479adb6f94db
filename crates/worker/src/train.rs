use anyhow::{ensure, Context, Result};
use pricecast_core::dataset::HistoricalSeries;
use pricecast_core::domain::FeatureVector;
use pricecast_core::features::{training_rows, TrainingRow};
use pricecast_core::model::linear::DEFAULT_RIDGE;
use pricecast_core::model::{LinearModel, Metrics, ModelArtifact, Regressor};

#[derive(Debug, Clone)]
pub struct TrainOptions {
    /// Share of the most recent rows held out for evaluation (0..1 exclusive).
    pub test_fraction: f64,

    /// L2 penalty on standardized coefficients.
    pub ridge: f64,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            ridge: DEFAULT_RIDGE,
        }
    }
}

impl TrainOptions {
    pub fn from_env() -> Self {
        let mut out = Self::default();

        if let Ok(s) = std::env::var("TRAIN_TEST_FRACTION") {
            if let Ok(f) = s.parse::<f64>() {
                out.test_fraction = f;
            }
        }

        if let Ok(s) = std::env::var("TRAIN_RIDGE") {
            if let Ok(r) = s.parse::<f64>() {
                out.ridge = r;
            }
        }

        out
    }
}

#[derive(Debug, Clone)]
pub struct TrainOutcome {
    pub artifact: ModelArtifact,
    pub train_rows: usize,
    pub test_rows: usize,
}

/// Fits on the older rows and scores on the most recent `test_fraction`.
pub fn train(series: &HistoricalSeries, opts: &TrainOptions) -> Result<TrainOutcome> {
    ensure!(
        opts.test_fraction > 0.0 && opts.test_fraction < 1.0,
        "test fraction must be in (0, 1) (got {})",
        opts.test_fraction
    );

    let rows = training_rows(series);
    let test_rows = ((rows.len() as f64) * opts.test_fraction).round() as usize;
    ensure!(
        test_rows >= 1 && test_rows < rows.len(),
        "not enough feature rows to split ({} rows, test fraction {})",
        rows.len(),
        opts.test_fraction
    );

    let (train_set, test_set) = rows.split_at(rows.len() - test_rows);
    let (train_x, train_y) = unzip(train_set);
    let (test_x, test_y) = unzip(test_set);

    tracing::info!(
        train_rows = train_set.len(),
        test_rows = test_set.len(),
        ridge = opts.ridge,
        "fitting linear model"
    );

    let model = LinearModel::fit(&train_x, &train_y, opts.ridge).context("model fit failed")?;

    let predicted = test_x
        .iter()
        .map(|f| model.predict(f))
        .collect::<Result<Vec<f64>>>()
        .context("evaluation failed")?;
    let metrics = Metrics::evaluate(&test_y, &predicted)?;

    Ok(TrainOutcome {
        artifact: ModelArtifact::new(model, metrics, train_set.len()),
        train_rows: train_set.len(),
        test_rows: test_set.len(),
    })
}

fn unzip(rows: &[TrainingRow]) -> (Vec<FeatureVector>, Vec<f64>) {
    rows.iter().map(|r| (r.features, r.target)).unzip()
}
