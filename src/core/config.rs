use std::collections::BTreeMap;
use std::env;
use std::fmt::Write as _;

use chrono::NaiveDateTime;
use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::DatasourceError;

/// Connection settings for the queue-backed datasource.
///
/// Mirrors the ORM's datasource configuration block:
/// `{ key, secret, region, sqs: { url } }`, plus optional column overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub secret: Option<String>,
    pub region: String,
    pub sqs: SqsSettings,
    #[serde(default)]
    pub columns: BTreeMap<String, ColumnFormat>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqsSettings {
    pub url: String,
}

/// Rendering hint for a timestamp-like column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnFormat {
    pub name: String,
    pub format: String,
}

impl ColumnFormat {
    pub fn new(name: &str, format: &str) -> Self {
        Self {
            name: name.to_string(),
            format: format.to_string(),
        }
    }

    /// Render a timestamp with this column's strftime format.
    ///
    /// # Errors
    ///
    /// Returns an error if the format string contains an invalid specifier.
    pub fn format(&self, value: &NaiveDateTime) -> Result<String, DatasourceError> {
        let mut out = String::new();
        write!(out, "{}", value.format(&self.format)).map_err(|_| {
            DatasourceError::ConfigError(format!(
                "column {}: invalid format {:?}",
                self.name, self.format
            ))
        })?;
        Ok(out)
    }

    fn is_valid(&self) -> bool {
        !StrftimeItems::new(&self.format).any(|item| matches!(item, Item::Error))
    }
}

/// Column formats the datasource knows about before any overrides.
pub fn default_columns() -> BTreeMap<String, ColumnFormat> {
    [
        ColumnFormat::new("datetime", "%Y-%m-%d %H:%M:%S"),
        ColumnFormat::new("timestamp", "%Y-%m-%d %H:%M:%S"),
        ColumnFormat::new("time", "%H:%M:%S"),
        ColumnFormat::new("date", "%Y-%m-%d"),
    ]
    .into_iter()
    .map(|c| (c.name.clone(), c))
    .collect()
}

impl SourceConfig {
    pub fn new(region: &str, queue_url: &str) -> Self {
        Self {
            key: None,
            secret: None,
            region: region.to_string(),
            sqs: SqsSettings {
                url: queue_url.to_string(),
            },
            columns: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_credentials(mut self, key: &str, secret: &str) -> Self {
        self.key = Some(key.to_string());
        self.secret = Some(secret.to_string());
        self
    }

    /// # Errors
    ///
    /// Returns an error if a required variable is missing or the result fails validation.
    pub fn from_env() -> Result<Self, DatasourceError> {
        let config = Self {
            key: env::var("AWS_ACCESS_KEY_ID").ok(),
            secret: env::var("AWS_SECRET_ACCESS_KEY").ok(),
            region: env::var("AWS_REGION")
                .map_err(|e| DatasourceError::ConfigError(format!("AWS_REGION: {e}")))?,
            sqs: SqsSettings {
                url: env::var("SQS_QUEUE_URL")
                    .map_err(|e| DatasourceError::ConfigError(format!("SQS_QUEUE_URL: {e}")))?,
            },
            columns: BTreeMap::new(),
        };
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the result fails validation.
    pub fn from_json(raw: &str) -> Result<Self, DatasourceError> {
        let config: Self = serde_json::from_str(raw)
            .map_err(|e| DatasourceError::ConfigError(format!("config parse: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Check everything the SQS client needs before it is built.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid setting.
    pub fn validate(&self) -> Result<(), DatasourceError> {
        if self.region.trim().is_empty() {
            return Err(DatasourceError::ConfigError("region is empty".to_string()));
        }

        let url = Url::parse(&self.sqs.url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(DatasourceError::ConfigError(format!(
                "queue url must be http(s), got {}",
                url.scheme()
            )));
        }

        match (self.access_key(), self.secret_key()) {
            (Some(_), None) | (None, Some(_)) => {
                return Err(DatasourceError::ConfigError(
                    "key and secret must be given together".to_string(),
                ));
            }
            _ => {}
        }

        if let Some(bad) = self.columns.values().find(|c| !c.is_valid()) {
            return Err(DatasourceError::ConfigError(format!(
                "column {}: invalid format {:?}",
                bad.name, bad.format
            )));
        }

        Ok(())
    }

    pub fn queue_url(&self) -> &str {
        &self.sqs.url
    }

    pub fn access_key(&self) -> Option<&str> {
        self.key.as_deref().filter(|k| !k.is_empty())
    }

    pub fn secret_key(&self) -> Option<&str> {
        self.secret.as_deref().filter(|s| !s.is_empty())
    }

    /// Default column formats with configured overrides applied.
    pub fn columns(&self) -> BTreeMap<String, ColumnFormat> {
        let mut columns = default_columns();
        columns.extend(self.columns.clone());
        columns
    }
}
