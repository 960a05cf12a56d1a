use crate::domain::model::CustomerRecord;
use crate::utils::error::{ImportError, Result};

pub const EXPORT_HEADER: [&str; 4] = ["name", "email", "age", "created_at"];

pub const SAMPLE_CSV: &[u8] = b"name,email,age\nAlice,alice@example.com,30\nBob,bob@example.org,25\n";

/// Renders records as `name,email,age,created_at`, in the order given.
pub fn render_export(records: &[CustomerRecord]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(EXPORT_HEADER)?;

    for record in records {
        let age = record.age.to_string();
        let created_at = record.created_at_string();
        writer.write_record([
            record.name.as_str(),
            record.email.as_str(),
            age.as_str(),
            created_at.as_str(),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| ImportError::IoError(e.into_error()))
}
