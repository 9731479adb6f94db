pub mod dataset;
pub mod domain;
pub mod error;
pub mod features;
pub mod model;
pub mod service;
pub mod time;

pub mod config {
    use anyhow::Context;
    use std::path::Path;

    const DEFAULT_PORT: u16 = 5000;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub dataset_path: Option<String>,
        pub model_path: Option<String>,
        pub sentry_dsn: Option<String>,
        pub port: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                dataset_path: non_empty_var("DATASET_PATH"),
                model_path: non_empty_var("MODEL_PATH"),
                sentry_dsn: non_empty_var("SENTRY_DSN"),
                port: non_empty_var("PORT"),
            })
        }

        pub fn require_dataset_path(&self) -> anyhow::Result<&Path> {
            self.dataset_path
                .as_deref()
                .map(Path::new)
                .context("DATASET_PATH is required")
        }

        pub fn require_model_path(&self) -> anyhow::Result<&Path> {
            self.model_path
                .as_deref()
                .map(Path::new)
                .context("MODEL_PATH is required")
        }

        /// `PORT`, or the default when unset.
        pub fn require_port(&self) -> anyhow::Result<u16> {
            match self.port.as_deref().map(str::trim) {
                Some(s) => s
                    .parse::<u16>()
                    .with_context(|| format!("PORT must be a valid port number (got {s})")),
                None => Ok(DEFAULT_PORT),
            }
        }
    }

    fn non_empty_var(key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|s| !s.trim().is_empty())
    }

}
