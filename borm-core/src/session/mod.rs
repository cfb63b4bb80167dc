mod history;
mod hooks;
mod options;
mod raw;
mod record;
mod shared;
mod table;
mod transaction;

#[cfg(test)]
mod tests;

pub use hooks::*;
pub use options::*;
pub use shared::*;

use crate::{Clause, Connection, Dialect, Schema, Value};
use std::{
    fmt::{self, Display},
    sync::Arc,
};

/// Returned by an execution entry point when a hook called [`Session::abort`].
///
/// Detect it with `error.is::<Aborted>()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Aborted;

impl Display for Aborted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Operation aborted by a hook")
    }
}

impl std::error::Error for Aborted {}

/// Per call chain state: pending statement, bound model, flags and history.
///
/// Sessions created by the same engine share one connection. While a
/// transaction is open the session keeps that connection locked and every
/// statement goes through it, statements of the other sessions fail with
/// [`ConnectionBusy`] until it ends.
pub struct Session<C: Connection> {
    connection: SharedConnection<C>,
    tx: Option<TransactionGuard<C>>,
    dialect: Arc<dyn Dialect>,
    hooks: Arc<HookRegistry<C>>,
    clause: Clause,
    ref_table: Option<Schema>,
    sql: String,
    sql_vars: Vec<Value>,
    history: String,
    abort: bool,
    enable_hook: bool,
    enable_history: bool,
}

impl<C: Connection> Session<C> {
    pub fn new(
        connection: SharedConnection<C>,
        dialect: Arc<dyn Dialect>,
        hooks: Arc<HookRegistry<C>>,
        options: SessionOptions,
    ) -> Self {
        Self {
            connection,
            tx: None,
            dialect,
            hooks,
            clause: Default::default(),
            ref_table: None,
            sql: Default::default(),
            sql_vars: Default::default(),
            history: Default::default(),
            abort: false,
            enable_hook: options.enable_hook,
            enable_history: options.enable_history,
        }
    }

    pub fn dialect(&self) -> &dyn Dialect {
        &*self.dialect
    }

    /// Veto the next statement, meant to be called from a hook.
    pub fn abort(&mut self) -> &mut Self {
        self.abort = true;
        self
    }

    pub fn is_aborted(&self) -> bool {
        self.abort
    }

    pub fn enable_hook(&mut self, enable: bool) -> &mut Self {
        self.enable_hook = enable;
        self
    }

    pub fn enable_history(&mut self, enable: bool) -> &mut Self {
        self.enable_history = enable;
        self
    }

    pub fn options(&mut self, options: SessionOptions) -> &mut Self {
        self.enable_hook = options.enable_hook;
        self.enable_history = options.enable_history;
        self
    }

    /// Whether nothing is pending: no raw text, no arguments, no clause fragments.
    pub fn is_idle(&self) -> bool {
        self.sql.is_empty() && self.sql_vars.is_empty() && self.clause.is_empty()
    }

    /// Pending statement text.
    pub fn pending_sql(&self) -> &str {
        &self.sql
    }

    pub fn pending_args(&self) -> &[Value] {
        &self.sql_vars
    }
}

impl<C: Connection> Drop for Session<C> {
    fn drop(&mut self) {
        let Some(mut tx) = self.tx.take() else {
            return;
        };
        log::warn!("Session dropped with an open transaction, rolling it back");
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let dialect = self.dialect.clone();
                handle.spawn(async move {
                    if let Err(e) = tx.rollback(&*dialect).await {
                        log::error!("Rollback of a dropped session failed: {:#}", e);
                    }
                });
            }
            Err(..) => {
                log::error!("No runtime available to roll back the transaction of a dropped session");
            }
        }
    }
}
