use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Weekday;
use config::{Config as RawConfig, Environment, File, FileFormat};
use serde::Deserialize;

use crate::db::Database;
use crate::domain::QrPayloadGenerator;
use crate::error::{Error, Result};

const ENV_PREFIX: &str = "CHECKIN";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database_path: PathBuf,
    /// First column of the week tracker
    pub first_day_of_week: Weekday,
    pub qr_refresh_interval_secs: u64,
    pub qr_check_interval_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("checkin.db"),
            first_day_of_week: Weekday::Sun,
            qr_refresh_interval_secs: 300,
            qr_check_interval_secs: 5,
        }
    }
}

impl AppConfig {
    /// Load from an optional TOML file, overridden by `CHECKIN_*` environment variables
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = RawConfig::builder();

        if let Some(path) = path {
            if !path.exists() {
                return Err(Error::NotFound(format!(
                    "Config file {}",
                    path.display()
                )));
            }

            builder = builder.add_source(File::from(path).format(FileFormat::Toml));
        }

        let config: Self = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;

        config.validate()?;

        tracing::debug!(?config, "Loaded configuration");

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.qr_check_interval_secs == 0 || self.qr_refresh_interval_secs == 0 {
            return Err(Error::InvalidInput(
                "QR intervals must be greater than zero".into(),
            ));
        }

        Ok(())
    }

    pub fn qr_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.qr_refresh_interval_secs)
    }

    pub fn qr_check_interval(&self) -> Duration {
        Duration::from_secs(self.qr_check_interval_secs)
    }

    pub fn open_database(&self) -> Result<Arc<Database>> {
        Database::open(&self.database_path)
    }

    pub fn qr_generator(&self, member_id: &str) -> Result<QrPayloadGenerator> {
        Ok(QrPayloadGenerator::new(member_id)?
            .with_refresh_interval(self.qr_refresh_interval())
            .with_check_interval(self.qr_check_interval()))
    }
}
