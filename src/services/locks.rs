use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::NaiveDate;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type Key = (i64, NaiveDate);

/// Per `(class_id, date)` async locks serializing attendance writes for the same class day.
#[derive(Debug, Default)]
pub struct ClassDayLocks {
    inner: Mutex<HashMap<Key, Arc<AsyncMutex<()>>>>,
}

impl ClassDayLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, class_id: i64, date: NaiveDate) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            // idle entries are only referenced by the map itself
            map.retain(|_, lock| Arc::strong_count(lock) > 1);
            map.entry((class_id, date)).or_default().clone()
        };
        lock.lock_owned().await
    }

    pub fn tracked(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
