use crate::domain::FEATURE_NAMES;
use crate::model::{LinearModel, Metrics};
use anyhow::{ensure, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use uuid::Uuid;

pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Persisted model plus the metadata the serving path reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub model_id: Uuid,
    pub trained_at: DateTime<Utc>,
    pub feature_names: Vec<String>,
    pub training_rows: usize,
    pub metrics: Metrics,
    pub model: LinearModel,
}

impl ModelArtifact {
    pub fn new(model: LinearModel, metrics: Metrics, training_rows: usize) -> Self {
        Self {
            format_version: ARTIFACT_FORMAT_VERSION,
            model_id: Uuid::new_v4(),
            trained_at: Utc::now(),
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            training_rows,
            metrics,
            model,
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.format_version == ARTIFACT_FORMAT_VERSION,
            "unsupported artifact format_version {} (expected {ARTIFACT_FORMAT_VERSION})",
            self.format_version
        );
        ensure!(
            self.feature_names.iter().map(String::as_str).eq(FEATURE_NAMES),
            "artifact feature order {:?} does not match {:?}",
            self.feature_names,
            FEATURE_NAMES
        );
        ensure!(
            self.metrics.rmse.is_finite() && self.metrics.mae.is_finite(),
            "artifact metrics must be finite"
        );
        Ok(())
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let artifact: Self =
            serde_json::from_reader(reader).context("failed to decode model artifact")?;
        artifact.validate()?;
        Ok(artifact)
    }

    pub fn to_writer<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, self).context("failed to encode model artifact")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("failed to open model artifact {}", path.display()))?;
        let artifact = Self::from_reader(BufReader::new(file))
            .with_context(|| format!("failed to load model artifact {}", path.display()))?;

        tracing::info!(
            path = %path.display(),
            model_id = %artifact.model_id,
            trained_at = %artifact.trained_at,
            rmse = artifact.metrics.rmse,
            mae = artifact.metrics.mae,
            "loaded model artifact"
        );
        Ok(artifact)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        self.to_writer(&mut writer)?;
        writer
            .flush()
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FeatureVector, FEATURE_COUNT};

    fn artifact() -> ModelArtifact {
        let features: Vec<FeatureVector> = (0..40)
            .map(|i| {
                let mut v = [0.0; FEATURE_COUNT];
                for (j, slot) in v.iter_mut().enumerate() {
                    *slot = ((i * (j + 2)) as f64 * 0.7).cos() + j as f64;
                }
                FeatureVector::from_array(v)
            })
            .collect();
        let targets: Vec<f64> = features.iter().map(|f| f.open * 3.0 + 1.0).collect();
        let model = LinearModel::fit(&features, &targets, 1.0).unwrap();
        ModelArtifact::new(model, Metrics { rmse: 343.25, mae: 221.14 }, 40)
    }

    #[test]
    fn save_and_load_preserves_everything() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");

        let original = artifact();
        original.save(&path).unwrap();
        let loaded = ModelArtifact::load(&path).unwrap();

        assert_eq!(loaded, original);
    }

    #[test]
    fn rejects_reordered_features() {
        let mut a = artifact();
        a.feature_names.swap(6, 7);
        let mut buf = Vec::new();
        a.to_writer(&mut buf).unwrap();

        let err = ModelArtifact::from_reader(buf.as_slice()).unwrap_err();
        assert!(err.to_string().contains("feature order"));
    }

    #[test]
    fn rejects_unknown_format_version() {
        let mut a = artifact();
        a.format_version = 99;
        let mut buf = Vec::new();
        a.to_writer(&mut buf).unwrap();
        assert!(ModelArtifact::from_reader(buf.as_slice()).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ModelArtifact::load(&dir.path().join("nope.json")).is_err());
    }
}
