use crate::core::Storage;
use crate::utils::error::{ImportError, Result};
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use aws_sdk_s3::Client as S3Client;

/// Object storage on S3 or an S3-compatible server such as MinIO.
#[derive(Debug, Clone)]
pub struct S3Storage {
    client: S3Client,
    region: String,
}

#[derive(Debug, Clone, Default)]
pub struct S3Settings {
    pub region: String,
    /// Custom endpoint, e.g. `http://localhost:9000` for MinIO.
    pub endpoint: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub force_path_style: bool,
}

impl S3Storage {
    pub fn new(client: S3Client, region: String) -> Self {
        Self { client, region }
    }

    pub async fn connect(settings: &S3Settings) -> Self {
        let shared = aws_config::load_defaults(BehaviorVersion::latest()).await;
        let mut builder = aws_sdk_s3::config::Builder::from(&shared)
            .region(Region::new(settings.region.clone()))
            .force_path_style(settings.force_path_style);

        if let Some(endpoint) = &settings.endpoint {
            builder = builder.endpoint_url(endpoint);
        }
        if let (Some(access_key), Some(secret_key)) = (&settings.access_key, &settings.secret_key) {
            builder = builder.credentials_provider(Credentials::new(
                access_key,
                secret_key,
                None,
                None,
                "csv-intake",
            ));
        }

        Self::new(S3Client::from_conf(builder.build()), settings.region.clone())
    }

    async fn ensure_bucket(&self, bucket: &str) -> Result<()> {
        if self.client.head_bucket().bucket(bucket).send().await.is_ok() {
            return Ok(());
        }

        tracing::debug!("Bucket '{}' does not exist. Creating...", bucket);
        let mut request = self.client.create_bucket().bucket(bucket);
        if self.region != "us-east-1" {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(self.region.as_str()))
                    .build(),
            );
        }
        request.send().await.map_err(|e| ImportError::ObjectStorage {
            message: format!("Failed to create bucket '{}': {}", bucket, DisplayErrorContext(&e)),
        })?;
        Ok(())
    }
}

impl Storage for S3Storage {
    async fn read_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let resp = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| ImportError::ObjectStorage {
                message: format!("Failed to read s3://{}/{}: {}", bucket, key, DisplayErrorContext(&e)),
            })?;

        let data = resp.body.collect().await.map_err(|e| ImportError::ObjectStorage {
            message: format!("Failed to collect s3://{}/{}: {}", bucket, key, e),
        })?;

        Ok(data.into_bytes().to_vec())
    }

    async fn write_object(&self, bucket: &str, key: &str, data: &[u8]) -> Result<()> {
        self.ensure_bucket(bucket).await?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type("text/csv")
            .body(data.to_vec().into())
            .send()
            .await
            .map_err(|e| ImportError::ObjectStorage {
                message: format!("Failed to write s3://{}/{}: {}", bucket, key, DisplayErrorContext(&e)),
            })?;

        Ok(())
    }

    async fn list_buckets(&self) -> Result<Vec<String>> {
        let resp = self
            .client
            .list_buckets()
            .send()
            .await
            .map_err(|e| ImportError::ObjectStorage {
                message: format!("Failed to list buckets: {}", DisplayErrorContext(&e)),
            })?;

        Ok(resp
            .buckets()
            .iter()
            .filter_map(|bucket| bucket.name().map(str::to_string))
            .collect())
    }
}
