use crate::domain::model::{CustomerRecord, ValidRecord};
use crate::utils::error::{ImportError, Result};
use async_trait::async_trait;

/// Raw-byte object storage (a local directory or an S3-compatible bucket).
pub trait Storage: Send + Sync {
    fn read_object(
        &self,
        bucket: &str,
        key: &str,
    ) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;

    /// Creates the bucket first when it does not exist yet.
    fn write_object(
        &self,
        bucket: &str,
        key: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Returns the visible bucket names; used as a startup connectivity probe.
    fn list_buckets(&self) -> impl std::future::Future<Output = Result<Vec<String>>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    /// Bucket that receives a copy of every uploaded file; `None` disables archiving.
    fn archive_bucket(&self) -> Option<&str>;
    fn recent_limit(&self) -> usize;
}

#[derive(Debug, thiserror::Error)]
pub enum InsertError {
    #[error("email already exists: {email}")]
    Conflict { email: String },

    #[error(transparent)]
    Fault(#[from] ImportError),
}

/// Persistence gateway for customer records.
#[async_trait]
pub trait CustomerStore: Send + Sync {
    /// Opens the write session for one ingestion call.
    async fn begin(&self) -> Result<Box<dyn ImportSession>>;

    /// Newest first.
    async fn list_recent(&self, limit: usize) -> Result<Vec<CustomerRecord>>;

    /// Oldest first.
    async fn list_all(&self) -> Result<Vec<CustomerRecord>>;
}

/// One open write transaction. Dropping it without `commit` discards every insert.
#[async_trait]
pub trait ImportSession: Send {
    async fn insert(&mut self, record: &ValidRecord) -> std::result::Result<CustomerRecord, InsertError>;

    async fn commit(self: Box<Self>) -> Result<()>;
}
