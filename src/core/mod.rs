pub mod engine;
pub mod event;
pub mod export;
pub mod parser;
pub mod pipeline;
pub mod validator;

pub use crate::domain::model::{CustomerRecord, ImportSummary, RowFailure, RowFailureReason, ValidRecord};
pub use crate::domain::ports::{ConfigProvider, CustomerStore, ImportSession, InsertError, Storage};
pub use crate::utils::error::Result;
