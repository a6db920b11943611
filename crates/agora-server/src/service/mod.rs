//! Business operations over the document store.
//!
//! The store is a single synchronous SQLite connection. [`SharedDb`] owns it
//! behind a mutex and runs every operation on tokio's blocking pool, so
//! request tasks never stall the async workers while SQLite does I/O.

mod posts;
mod users;

use std::sync::{Arc, Mutex};

use agora_store::{Database, StoreError};

use crate::error::ServerError;

pub use posts::PostService;
pub use users::UserService;

/// Cloneable handle to the process-wide database connection.
#[derive(Clone)]
pub struct SharedDb {
    inner: Arc<Mutex<Database>>,
}

impl SharedDb {
    pub fn new(db: Database) -> Self {
        Self {
            inner: Arc::new(Mutex::new(db)),
        }
    }

    /// Run `f` with exclusive access to the database on the blocking pool.
    pub async fn run<T, F>(&self, f: F) -> Result<T, ServerError>
    where
        F: FnOnce(&mut Database) -> Result<T, ServerError> + Send + 'static,
        T: Send + 'static,
    {
        let inner = self.inner.clone();

        tokio::task::spawn_blocking(move || {
            let mut db = inner
                .lock()
                .map_err(|_| ServerError::Internal("database lock poisoned".into()))?;
            f(&mut *db)
        })
        .await
        .map_err(|e| ServerError::Internal(format!("database task failed: {e}")))?
    }

    /// Close the connection if this is the last handle. Outstanding handles
    /// (e.g. a request still draining) keep it open until they drop.
    pub fn close(self) -> Result<(), StoreError> {
        match Arc::try_unwrap(self.inner) {
            Ok(mutex) => match mutex.into_inner() {
                Ok(db) => db.close(),
                Err(poisoned) => poisoned.into_inner().close(),
            },
            Err(_) => {
                tracing::warn!("database still in use at shutdown, leaving it to drop");
                Ok(())
            }
        }
    }
}
