use crate::{Connection, Error, Result, Session};

impl<C: Connection> Session<C> {
    /// Open a transaction, the shared connection stays locked until
    /// [`Session::commit`] or [`Session::rollback`].
    ///
    /// Meanwhile the other sessions of the engine get [`crate::ConnectionBusy`]
    /// instead of waiting, so do not use them before the transaction ends.
    pub async fn begin(&mut self) -> Result<()> {
        if self.tx.is_some() {
            let error = Error::msg("Cannot begin a transaction, one is already active");
            log::error!("{:#}", error);
            return Err(error);
        }
        let mut connection = self.connection.lock_transaction().await?;
        log::info!("{}", self.dialect.transaction_begin());
        connection.begin(&*self.dialect).await?;
        self.tx = Some(connection);
        Ok(())
    }

    pub async fn commit(&mut self) -> Result<()> {
        let Some(mut connection) = self.tx.take() else {
            let error = Error::msg("Cannot commit, no transaction is active");
            log::error!("{:#}", error);
            return Err(error);
        };
        log::info!("{}", self.dialect.transaction_commit());
        connection.commit(&*self.dialect).await
    }

    pub async fn rollback(&mut self) -> Result<()> {
        let Some(mut connection) = self.tx.take() else {
            let error = Error::msg("Cannot rollback, no transaction is active");
            log::error!("{:#}", error);
            return Err(error);
        };
        log::info!("{}", self.dialect.transaction_rollback());
        connection.rollback(&*self.dialect).await
    }

    pub fn in_transaction(&self) -> bool {
        self.tx.is_some()
    }
}
