#[cfg(test)]
pub(crate) mod memory;
pub mod sqlite;

pub use sqlite::SqliteStore;

use chrono::{DateTime, SubsecRound, Utc};

/// Insert timestamps are kept at second precision.
pub(crate) fn now_utc_seconds() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}
