use crate::{Dialect, Driver, Executor, Result};
use futures::TryFutureExt;
use std::future::Future;

/// A live handle to a backend.
pub trait Connection: Executor + Sized + 'static {
    type Driver: Driver<Connection = Self>;

    /// Open a connection to the given URL, `<driver name>://<location>?<params>`.
    fn connect(url: &str) -> impl Future<Output = Result<Self>> + Send;

    /// Start a transaction, every statement until commit or rollback belongs to it.
    fn begin(&mut self, dialect: &dyn Dialect) -> impl Future<Output = Result<()>> + Send {
        self.execute(dialect.transaction_begin().into())
            .map_ok(|_| ())
    }

    fn commit(&mut self, dialect: &dyn Dialect) -> impl Future<Output = Result<()>> + Send {
        self.execute(dialect.transaction_commit().into())
            .map_ok(|_| ())
    }

    fn rollback(&mut self, dialect: &dyn Dialect) -> impl Future<Output = Result<()>> + Send {
        self.execute(dialect.transaction_rollback().into())
            .map_ok(|_| ())
    }
}
