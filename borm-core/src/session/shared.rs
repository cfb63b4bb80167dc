use crate::{Error, Result};
use std::{
    fmt::{self, Display},
    ops::{Deref, DerefMut},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};
use tokio::sync::{Mutex, MutexGuard, OwnedMutexGuard};

/// Returned when a statement needs the connection while the transaction of
/// another session holds it.
///
/// Waiting would never end when that transaction is driven by the same task,
/// for example a second session used inside [`crate::Engine::transaction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionBusy;

impl Display for ConnectionBusy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("The connection is held by the transaction of another session")
    }
}

impl std::error::Error for ConnectionBusy {}

fn busy() -> Error {
    let error = Error::new(ConnectionBusy);
    log::error!("{:#}", error);
    error
}

/// The connection of an engine, shared by every session it creates.
pub struct SharedConnection<C> {
    pub(crate) connection: Arc<Mutex<C>>,
    transaction: Arc<AtomicBool>,
}

impl<C> SharedConnection<C> {
    pub fn new(connection: C) -> Self {
        Self {
            connection: Arc::new(Mutex::new(connection)),
            transaction: Default::default(),
        }
    }

    /// Whether a session holds the connection for a transaction.
    pub fn in_transaction(&self) -> bool {
        self.transaction.load(Ordering::Acquire)
    }

    /// Lock the connection for one statement.
    pub(crate) async fn lock(&self) -> Result<MutexGuard<'_, C>> {
        if self.in_transaction() {
            return Err(busy());
        }
        Ok(self.connection.lock().await)
    }

    /// Lock the connection until the returned guard is dropped.
    pub(crate) async fn lock_transaction(&self) -> Result<TransactionGuard<C>> {
        if self.in_transaction() {
            return Err(busy());
        }
        let guard = self.connection.clone().lock_owned().await;
        self.transaction.store(true, Ordering::Release);
        Ok(TransactionGuard {
            guard,
            transaction: self.transaction.clone(),
        })
    }
}

impl<C> Clone for SharedConnection<C> {
    fn clone(&self) -> Self {
        Self {
            connection: self.connection.clone(),
            transaction: self.transaction.clone(),
        }
    }
}

/// Exclusive access to the connection for the life of a transaction.
pub(crate) struct TransactionGuard<C> {
    guard: OwnedMutexGuard<C>,
    transaction: Arc<AtomicBool>,
}

impl<C> Deref for TransactionGuard<C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.guard
    }
}

impl<C> DerefMut for TransactionGuard<C> {
    fn deref_mut(&mut self) -> &mut C {
        &mut self.guard
    }
}

impl<C> Drop for TransactionGuard<C> {
    fn drop(&mut self) {
        self.transaction.store(false, Ordering::Release);
    }
}
