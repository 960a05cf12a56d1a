//! S3-style "object created" notifications, as sent by MinIO webhooks and AWS Lambda triggers.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageNotification {
    #[serde(rename = "Records", default)]
    pub records: Vec<NotificationRecord>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationRecord {
    #[serde(default)]
    pub s3: Option<S3Entity>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct S3Entity {
    #[serde(default)]
    pub bucket: Option<BucketEntity>,
    #[serde(default)]
    pub object: Option<ObjectEntity>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BucketEntity {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjectEntity {
    #[serde(default)]
    pub key: Option<String>,
}

impl NotificationRecord {
    /// Bucket name and decoded object key, or `None` when either is absent or empty.
    pub fn location(&self) -> Option<(String, String)> {
        let s3 = self.s3.as_ref()?;
        let bucket = s3.bucket.as_ref()?.name.as_deref().unwrap_or("");
        let key = s3.object.as_ref()?.key.as_deref().unwrap_or("");
        if bucket.is_empty() || key.is_empty() {
            return None;
        }
        Some((bucket.to_string(), decode_object_key(key)))
    }
}

/// Notification keys are form-encoded: `+` stands for a space.
pub fn decode_object_key(key: &str) -> String {
    let plus_decoded = key.replace('+', " ");
    match urlencoding::decode(&plus_decoded) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => plus_decoded,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ObjectOutcome {
    Imported {
        bucket: String,
        object: String,
        inserted: usize,
        errors: usize,
    },
    Skipped {
        bucket: String,
        object: String,
        skipped: String,
    },
    Failed {
        bucket: String,
        object: String,
        error: String,
    },
}

/// Totals across every object named in one notification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NotificationReport {
    pub ok: usize,
    pub errors: usize,
    pub items: Vec<ObjectOutcome>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minio_notification() {
        let payload = serde_json::json!({
            "EventName": "s3:ObjectCreated:Put",
            "Key": "incoming/customers.csv",
            "Records": [{
                "eventVersion": "2.0",
                "eventSource": "minio:s3",
                "s3": {
                    "bucket": {"name": "incoming", "arn": "arn:aws:s3:::incoming"},
                    "object": {"key": "2024+batch%2Fcustomers.csv", "size": 120}
                }
            }]
        });

        let notification: StorageNotification = serde_json::from_value(payload).unwrap();

        assert_eq!(notification.records.len(), 1);
        assert_eq!(
            notification.records[0].location(),
            Some(("incoming".to_string(), "2024 batch/customers.csv".to_string()))
        );
    }

    #[test]
    fn test_records_without_bucket_or_key_have_no_location() {
        let payload = serde_json::json!({
            "Records": [
                {},
                {"s3": {"bucket": {"name": "b"}}},
                {"s3": {"bucket": {"name": ""}, "object": {"key": "a.csv"}}}
            ]
        });

        let notification: StorageNotification = serde_json::from_value(payload).unwrap();

        assert!(notification.records.iter().all(|r| r.location().is_none()));
    }

    #[test]
    fn test_missing_records_is_empty() {
        let notification: StorageNotification = serde_json::from_str("{}").unwrap();
        assert!(notification.records.is_empty());
    }

    #[test]
    fn test_outcomes_serialize_flat() {
        let report = NotificationReport {
            ok: 2,
            errors: 1,
            items: vec![
                ObjectOutcome::Imported {
                    bucket: "b".to_string(),
                    object: "a.csv".to_string(),
                    inserted: 2,
                    errors: 1,
                },
                ObjectOutcome::Skipped {
                    bucket: "b".to_string(),
                    object: "a.txt".to_string(),
                    skipped: "not a .csv".to_string(),
                },
            ],
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["items"][0]["inserted"], 2);
        assert_eq!(json["items"][1]["skipped"], "not a .csv");
        assert!(json["items"][1].get("inserted").is_none());
    }
}
