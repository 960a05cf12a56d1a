use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Format used for `created_at` everywhere it leaves the process.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// One data row as read from the CSV, keyed by lower-cased trimmed header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// 1-based line of the record; the header is row 1.
    pub number: usize,
    pub fields: HashMap<String, String>,
}

impl RawRow {
    /// Missing columns read as the empty string.
    pub fn field(&self, name: &str) -> &str {
        self.fields.get(name).map(String::as_str).unwrap_or("")
    }
}

/// A row that passed validation, normalized and ready to persist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidRecord {
    pub name: String,
    pub email: String,
    pub age: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub age: u8,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl CustomerRecord {
    pub fn created_at_string(&self) -> String {
        self.created_at.format(TIMESTAMP_FORMAT).to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowFailureReason {
    NameTooShort,
    InvalidEmail,
    InvalidAge,
    DuplicateEmail,
}

impl RowFailureReason {
    pub fn message(&self) -> &'static str {
        match self {
            Self::NameTooShort => "name must be at least 2 characters",
            Self::InvalidEmail => "invalid email",
            Self::InvalidAge => "age must be an integer 1–120",
            Self::DuplicateEmail => "duplicate email (already imported)",
        }
    }
}

impl fmt::Display for RowFailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowFailure {
    pub row: usize,
    pub reason: RowFailureReason,
    pub message: String,
}

impl RowFailure {
    pub fn new(row: usize, reason: RowFailureReason) -> Self {
        Self {
            row,
            reason,
            message: reason.message().to_string(),
        }
    }
}

/// Aggregate result of one ingestion call. Failures stay in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub inserted: usize,
    pub failures: Vec<RowFailure>,
}

impl ImportSummary {
    pub fn record_inserted(&mut self) {
        self.inserted += 1;
    }

    pub fn record_failure(&mut self, row: usize, reason: RowFailureReason) {
        self.failures.push(RowFailure::new(row, reason));
    }

    pub fn error_count(&self) -> usize {
        self.failures.len()
    }

    pub fn total_rows(&self) -> usize {
        self.inserted + self.failures.len()
    }
}

mod timestamp {
    use super::TIMESTAMP_FORMAT;
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT)
            .map(|naive| naive.and_utc())
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_summary_counts() {
        let mut summary = ImportSummary::default();
        summary.record_inserted();
        summary.record_failure(3, RowFailureReason::InvalidEmail);
        summary.record_failure(4, RowFailureReason::InvalidAge);

        assert_eq!(summary.inserted, 1);
        assert_eq!(summary.error_count(), 2);
        assert_eq!(summary.total_rows(), 3);
        assert_eq!(summary.failures[0].message, "invalid email");
    }

    #[test]
    fn test_failure_serializes_reason_and_message() {
        let failure = RowFailure::new(2, RowFailureReason::DuplicateEmail);
        let json = serde_json::to_value(&failure).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "row": 2,
                "reason": "duplicate_email",
                "message": "duplicate email (already imported)"
            })
        );
    }

    #[test]
    fn test_customer_created_at_has_trailing_z() {
        let record = CustomerRecord {
            id: 7,
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            age: 30,
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 15).unwrap(),
        };

        assert_eq!(record.created_at_string(), "2024-05-01T08:30:15Z");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["created_at"], "2024-05-01T08:30:15Z");
    }
}
