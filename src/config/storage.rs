use crate::config::local::LocalStorage;
use crate::config::toml_config::{StorageConfig, StorageKind};
use crate::core::Storage;
use crate::utils::error::Result;

#[cfg(feature = "s3")]
use crate::config::s3::{S3Settings, S3Storage};

/// The object storage picked by `[storage] kind`.
#[derive(Debug, Clone)]
pub enum ConfiguredStorage {
    Local(LocalStorage),
    #[cfg(feature = "s3")]
    S3(S3Storage),
}

impl ConfiguredStorage {
    pub async fn from_config(config: &StorageConfig) -> Result<Self> {
        match config.kind {
            StorageKind::Local => Ok(Self::Local(LocalStorage::new(config.path.clone()))),
            #[cfg(feature = "s3")]
            StorageKind::S3 => {
                let settings = S3Settings {
                    region: config.region.clone(),
                    endpoint: config.endpoint.clone(),
                    access_key: config.access_key.clone(),
                    secret_key: config.secret_key.clone(),
                    force_path_style: config.force_path_style,
                };
                Ok(Self::S3(S3Storage::connect(&settings).await))
            }
            #[cfg(not(feature = "s3"))]
            StorageKind::S3 => Err(crate::utils::error::ImportError::ConfigError {
                message: "storage.kind = \"s3\" requires the `s3` feature".to_string(),
            }),
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Self::Local(_) => "local",
            #[cfg(feature = "s3")]
            Self::S3(_) => "s3",
        }
    }
}

impl Storage for ConfiguredStorage {
    async fn read_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        match self {
            Self::Local(storage) => storage.read_object(bucket, key).await,
            #[cfg(feature = "s3")]
            Self::S3(storage) => storage.read_object(bucket, key).await,
        }
    }

    async fn write_object(&self, bucket: &str, key: &str, data: &[u8]) -> Result<()> {
        match self {
            Self::Local(storage) => storage.write_object(bucket, key, data).await,
            #[cfg(feature = "s3")]
            Self::S3(storage) => storage.write_object(bucket, key, data).await,
        }
    }

    async fn list_buckets(&self) -> Result<Vec<String>> {
        match self {
            Self::Local(storage) => storage.list_buckets().await,
            #[cfg(feature = "s3")]
            Self::S3(storage) => storage.list_buckets().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_local_kind_round_trips_objects() {
        let dir = TempDir::new().unwrap();
        let config = StorageConfig {
            path: dir.path().to_str().unwrap().to_string(),
            ..StorageConfig::default()
        };

        let storage = ConfiguredStorage::from_config(&config).await.unwrap();
        storage.write_object("uploads", "x.csv", b"abc").await.unwrap();

        assert_eq!(storage.describe(), "local");
        assert_eq!(storage.read_object("uploads", "x.csv").await.unwrap(), b"abc");
    }
}
