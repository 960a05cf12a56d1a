use crate::config::s3::S3Settings;
use crate::core::ConfigProvider;
use crate::utils::error::{ImportError, Result};
use std::env;

#[derive(Debug, Clone)]
pub struct LambdaConfig {
    pub database_path: String,
    pub recent_limit: usize,
    pub s3_region: String,
    pub s3_endpoint: Option<String>,
}

impl LambdaConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let recent_limit = match lookup("RECENT_LIMIT") {
            Some(raw) => raw.parse().map_err(|_| ImportError::InvalidConfigValueError {
                field: "RECENT_LIMIT".to_string(),
                value: raw.clone(),
                reason: "must be a positive integer".to_string(),
            })?,
            None => 50,
        };

        Ok(Self {
            database_path: lookup("DB_PATH").ok_or_else(|| ImportError::MissingConfigError {
                field: "DB_PATH".to_string(),
            })?,
            recent_limit,
            s3_region: lookup("S3_REGION").unwrap_or_else(|| "ap-southeast-2".to_string()),
            s3_endpoint: lookup("S3_ENDPOINT"),
        })
    }

    pub fn s3_settings(&self) -> S3Settings {
        S3Settings {
            region: self.s3_region.clone(),
            endpoint: self.s3_endpoint.clone(),
            access_key: None,
            secret_key: None,
            force_path_style: self.s3_endpoint.is_some(),
        }
    }
}

impl ConfigProvider for LambdaConfig {
    // 事件來源本身就在 bucket 裡，不需要再備份
    fn archive_bucket(&self) -> Option<&str> {
        None
    }

    fn recent_limit(&self) -> usize {
        self.recent_limit
    }
}

impl crate::utils::validation::Validate for LambdaConfig {
    fn validate(&self) -> Result<()> {
        use crate::utils::validation::*;

        validate_path("DB_PATH", &self.database_path)?;
        validate_aws_region("S3_REGION", &self.s3_region)?;
        if let Some(endpoint) = &self.s3_endpoint {
            validate_url("S3_ENDPOINT", endpoint)?;
        }
        validate_range("RECENT_LIMIT", self.recent_limit, 1, 1000)?;

        tracing::info!("✅ Lambda configuration validation passed");
        Ok(())
    }
}

fn validate_aws_region(field_name: &str, region: &str) -> Result<()> {
    crate::utils::validation::validate_non_empty_string(field_name, region)?;

    if !region
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(ImportError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: region.to_string(),
            reason: "AWS region can only contain lowercase letters, numbers, and hyphens"
                .to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::validation::Validate;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<LambdaConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        LambdaConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults_with_db_path() {
        let config = config_from(&[("DB_PATH", "/tmp/app.db")]).unwrap();

        assert_eq!(config.recent_limit(), 50);
        assert_eq!(config.archive_bucket(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_db_path_is_required() {
        assert!(matches!(
            config_from(&[]),
            Err(ImportError::MissingConfigError { .. })
        ));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(config_from(&[("DB_PATH", "/tmp/a.db"), ("RECENT_LIMIT", "many")]).is_err());

        let config = config_from(&[("DB_PATH", "/tmp/a.db"), ("S3_REGION", "EU West")]).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_custom_endpoint_enables_path_style() {
        let config = config_from(&[("DB_PATH", "/tmp/a.db"), ("S3_ENDPOINT", "http://minio:9000")]).unwrap();

        let settings = config.s3_settings();
        assert!(settings.force_path_style);
        assert_eq!(settings.endpoint.as_deref(), Some("http://minio:9000"));
    }
}
