use crate::{
    Aborted, Connection, Error, Executor, Query, Result, RowLabeled, RowsAffected, Session, Value,
    stream::{StreamExt, TryStreamExt},
};
use std::{mem, pin::pin};

/// Run `$body` with `$c` bound to the transaction if one is open, to the
/// shared connection otherwise.
macro_rules! on_connection {
    ($self:ident, |$c:ident| $body:expr) => {
        match $self.tx.as_deref_mut() {
            Some($c) => $body,
            None => {
                let mut guard = $self.connection.lock().await?;
                let $c = &mut *guard;
                $body
            }
        }
    };
}

impl<C: Connection> Session<C> {
    /// Append text and arguments to the pending statement.
    ///
    /// Consecutive calls are joined with a single space.
    pub fn raw(&mut self, sql: impl AsRef<str>, args: Vec<Value>) -> &mut Self {
        let sql = sql.as_ref();
        if !self.sql.is_empty() && !sql.is_empty() {
            self.sql.push(' ');
        }
        self.sql.push_str(sql);
        self.sql_vars.extend(args);
        self
    }

    /// Run the pending statement and return the affected rows.
    pub async fn exec(&mut self) -> Result<RowsAffected> {
        let query = self.take_pending()?;
        on_connection!(self, |c| c.execute(query).await)
    }

    /// Run the pending statement and return its first row, if any.
    pub async fn query_row(&mut self) -> Result<Option<RowLabeled>> {
        let query = self.take_pending()?;
        on_connection!(self, |c| {
            let mut rows = pin!(c.fetch(query));
            rows.next().await.transpose()
        })
    }

    /// Run the pending statement and collect every row.
    pub async fn query_rows(&mut self) -> Result<Vec<RowLabeled>> {
        let query = self.take_pending()?;
        on_connection!(self, |c| c.fetch(query).try_collect().await)
    }

    /// Move the pending state out, leaving the session idle.
    ///
    /// Fails with [`Aborted`] when the abort flag was set, the statement is
    /// logged and dropped.
    fn take_pending(&mut self) -> Result<Query> {
        let query = Query::new(mem::take(&mut self.sql), mem::take(&mut self.sql_vars));
        self.clause = Default::default();
        if mem::take(&mut self.abort) {
            log::error!("Aborted: {}", query);
            return Err(Error::new(Aborted));
        }
        log::info!("{}", query);
        if self.enable_history {
            self.record(&query);
        }
        Ok(query)
    }
}
