use crate::domain::model::{RawRow, RowFailureReason, ValidRecord};
use regex::Regex;
use std::sync::LazyLock;

pub const MIN_NAME_CHARS: usize = 2;
pub const MIN_AGE: i64 = 1;
pub const MAX_AGE: i64 = 120;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid"));

/// Checks name, then email, then age. The first failing check decides the reason.
pub fn validate(row: &RawRow) -> Result<ValidRecord, RowFailureReason> {
    let name = validate_name(row.field("name"))?;
    let email = validate_email(row.field("email"))?;
    let age = validate_age(row.field("age"))?;

    Ok(ValidRecord { name, email, age })
}

pub fn validate_name(raw: &str) -> Result<String, RowFailureReason> {
    let name = raw.trim();
    if name.chars().count() < MIN_NAME_CHARS {
        return Err(RowFailureReason::NameTooShort);
    }
    Ok(name.to_string())
}

pub fn validate_email(raw: &str) -> Result<String, RowFailureReason> {
    let email = raw.trim().to_lowercase();
    if !EMAIL_RE.is_match(&email) {
        return Err(RowFailureReason::InvalidEmail);
    }
    Ok(email)
}

/// Only integer literals count; `"30.0"` and `"thirty"` are both rejected.
pub fn validate_age(raw: &str) -> Result<u8, RowFailureReason> {
    let age: i64 = raw.trim().parse().map_err(|_| RowFailureReason::InvalidAge)?;
    if !(MIN_AGE..=MAX_AGE).contains(&age) {
        return Err(RowFailureReason::InvalidAge);
    }
    u8::try_from(age).map_err(|_| RowFailureReason::InvalidAge)
}
