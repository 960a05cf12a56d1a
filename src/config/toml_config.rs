use crate::core::ConfigProvider;
use crate::utils::error::{ImportError, Result};
use crate::utils::validation::Validate;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub max_upload_bytes: usize,
    pub recent_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            recent_limit: 50,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "./data/app.db".to_string(),
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    Local,
    S3,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub kind: StorageKind,
    /// Root directory for `kind = "local"`.
    pub path: String,
    pub upload_bucket: String,
    pub archive_uploads: bool,
    pub endpoint: Option<String>,
    pub region: String,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub force_path_style: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            kind: StorageKind::Local,
            path: "./data/objects".to_string(),
            upload_bucket: "uploads".to_string(),
            archive_uploads: true,
            endpoint: None,
            region: "us-east-1".to_string(),
            access_key: None,
            secret_key: None,
            force_path_style: true,
        }
    }
}

impl ServiceConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ImportError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| ImportError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DB_PATH})
    fn substitute_env_vars(content: &str) -> String {
        use regex::Regex;
        use std::sync::LazyLock;

        static ENV_VAR_RE: LazyLock<Regex> =
            LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid"));

        ENV_VAR_RE
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    /// Applies the `DB_PATH` and `MINIO_*` variables understood by the container image.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("DB_PATH") {
            self.database.path = path;
        }
        if let Some(endpoint) = lookup("MINIO_ENDPOINT") {
            self.storage.kind = StorageKind::S3;
            self.storage.endpoint = Some(endpoint);
            self.storage.force_path_style = true;
        }
        if let Some(access_key) = lookup("MINIO_ACCESS_KEY") {
            self.storage.access_key = Some(access_key);
        }
        if let Some(secret_key) = lookup("MINIO_SECRET_KEY") {
            self.storage.secret_key = Some(secret_key);
        }
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        use crate::utils::validation::*;

        validate_non_empty_string("server.bind", &self.server.bind)?;
        validate_positive_number("server.max_upload_bytes", self.server.max_upload_bytes, 1)?;
        validate_range("server.recent_limit", self.server.recent_limit, 1, 1000)?;

        validate_path("database.path", &self.database.path)?;
        validate_range("database.max_connections", self.database.max_connections, 1, 64)?;

        validate_non_empty_string("storage.upload_bucket", &self.storage.upload_bucket)?;
        match self.storage.kind {
            StorageKind::Local => validate_path("storage.path", &self.storage.path)?,
            StorageKind::S3 => {
                validate_non_empty_string("storage.region", &self.storage.region)?;
                if let Some(endpoint) = &self.storage.endpoint {
                    validate_url("storage.endpoint", endpoint)?;
                }
                if self.storage.access_key.is_some() != self.storage.secret_key.is_some() {
                    return Err(ImportError::ConfigValidationError {
                        field: "storage.access_key".to_string(),
                        message: "access_key and secret_key must be set together".to_string(),
                    });
                }
            }
        }

        Ok(())
    }
}

impl ConfigProvider for ServiceConfig {
    fn archive_bucket(&self) -> Option<&str> {
        self.storage
            .archive_uploads
            .then_some(self.storage.upload_bucket.as_str())
    }

    fn recent_limit(&self) -> usize {
        self.server.recent_limit
    }
}

impl Validate for ServiceConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
