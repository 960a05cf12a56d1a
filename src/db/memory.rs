use crate::db::now_utc_seconds;
use crate::domain::model::{CustomerRecord, ValidRecord};
use crate::domain::ports::{CustomerStore, ImportSession, InsertError};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Default)]
struct Inner {
    records: Vec<CustomerRecord>,
    last_id: i64,
}

/// In-process customer store.
///
/// A session holds the store lock until it is committed or dropped, so concurrent
/// imports run one after another, the same way SQLite serializes writers.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

struct MemorySession {
    guard: OwnedMutexGuard<Inner>,
    pending: Vec<CustomerRecord>,
}

#[async_trait]
impl CustomerStore for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn ImportSession>> {
        let guard = self.inner.clone().lock_owned().await;
        Ok(Box::new(MemorySession {
            guard,
            pending: Vec::new(),
        }))
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<CustomerRecord>> {
        let inner = self.inner.lock().await;
        Ok(inner.records.iter().rev().take(limit).cloned().collect())
    }

    async fn list_all(&self) -> Result<Vec<CustomerRecord>> {
        let inner = self.inner.lock().await;
        Ok(inner.records.clone())
    }
}

#[async_trait]
impl ImportSession for MemorySession {
    async fn insert(&mut self, record: &ValidRecord) -> std::result::Result<CustomerRecord, InsertError> {
        let taken = self
            .guard
            .records
            .iter()
            .chain(self.pending.iter())
            .any(|existing| existing.email == record.email);
        if taken {
            return Err(InsertError::Conflict {
                email: record.email.clone(),
            });
        }

        let stored = CustomerRecord {
            id: self.guard.last_id + self.pending.len() as i64 + 1,
            name: record.name.clone(),
            email: record.email.clone(),
            age: record.age,
            created_at: now_utc_seconds(),
        };
        self.pending.push(stored.clone());
        Ok(stored)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let MemorySession { mut guard, pending } = *self;
        guard.last_id += pending.len() as i64;
        guard.records.extend(pending);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, email: &str, age: u8) -> ValidRecord {
        ValidRecord {
            name: name.to_string(),
            email: email.to_string(),
            age,
        }
    }

    #[tokio::test]
    async fn test_uncommitted_session_is_discarded() {
        let store = MemoryStore::new();

        {
            let mut session = store.begin().await.unwrap();
            session.insert(&record("Alice", "alice@example.com", 30)).await.unwrap();
        }

        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_conflict_with_committed_and_pending() {
        let store = MemoryStore::new();

        let mut session = store.begin().await.unwrap();
        session.insert(&record("Alice", "alice@example.com", 30)).await.unwrap();
        assert!(matches!(
            session.insert(&record("Alicia", "alice@example.com", 31)).await,
            Err(InsertError::Conflict { .. })
        ));
        session.commit().await.unwrap();

        let mut session = store.begin().await.unwrap();
        assert!(matches!(
            session.insert(&record("Al", "alice@example.com", 32)).await,
            Err(InsertError::Conflict { .. })
        ));
    }

    #[tokio::test]
    async fn test_listing_order() {
        let store = MemoryStore::new();
        let mut session = store.begin().await.unwrap();
        for (i, email) in ["a@x.io", "b@x.io", "c@x.io"].iter().enumerate() {
            session.insert(&record("Name", email, 20 + i as u8)).await.unwrap();
        }
        session.commit().await.unwrap();

        let recent: Vec<i64> = store.list_recent(2).await.unwrap().iter().map(|r| r.id).collect();
        let all: Vec<i64> = store.list_all().await.unwrap().iter().map(|r| r.id).collect();

        assert_eq!(recent, vec![3, 2]);
        assert_eq!(all, vec![1, 2, 3]);
    }
}
