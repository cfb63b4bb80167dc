use crate::{
    Connection, Dialect, DialectRegistry, Driver, HookRegistry, Lifecycle, Result, Session,
    SessionOptions, SharedConnection,
};
use futures::FutureExt;
use std::{panic::AssertUnwindSafe, sync::Arc};

/// Entry point: owns the backend connection and hands out sessions.
pub struct Engine<D: Driver> {
    connection: SharedConnection<D::Connection>,
    dialect: Arc<dyn Dialect>,
    hooks: Arc<HookRegistry<D::Connection>>,
    options: SessionOptions,
}

impl<D: Driver> Engine<D> {
    /// Connect to `url` using the dialect registered under the driver name.
    pub async fn connect(url: &str, dialects: &DialectRegistry) -> Result<Self> {
        let dialect = dialects.require(D::NAME)?;
        let connection = D::Connection::connect(url).await?;
        log::info!("Connected to {}", url);
        Ok(Self::new(connection, dialect))
    }

    pub fn new(connection: D::Connection, dialect: Arc<dyn Dialect>) -> Self {
        Self {
            connection: SharedConnection::new(connection),
            dialect,
            hooks: Default::default(),
            options: Default::default(),
        }
    }

    pub fn dialect(&self) -> &dyn Dialect {
        &*self.dialect
    }

    /// Defaults for the sessions created from now on.
    pub fn with_options(mut self, options: SessionOptions) -> Self {
        self.options = options;
        self
    }

    /// Register the lifecycle hooks of `M` for the sessions created from now on.
    pub fn register_hooks<M: Lifecycle<D::Connection>>(&mut self) -> &mut Self {
        Arc::make_mut(&mut self.hooks).register::<M>();
        self
    }

    pub fn new_session(&self) -> Session<D::Connection> {
        Session::new(
            self.connection.clone(),
            self.dialect.clone(),
            self.hooks.clone(),
            self.options,
        )
    }

    /// Run `f` inside a transaction on a fresh session.
    ///
    /// Commits when `f` returns `Ok`. Rolls back when it returns `Err` or
    /// panics, the panic is resumed afterwards. A failed rollback is logged
    /// and the original error returned.
    ///
    /// The transaction holds the only connection: any other session of this
    /// engine used inside `f` fails with [`crate::ConnectionBusy`].
    pub async fn transaction<F, R>(&self, f: F) -> Result<R>
    where
        F: AsyncFnOnce(&mut Session<D::Connection>) -> Result<R>,
    {
        let mut session = self.new_session();
        session.begin().await?;
        let result = AssertUnwindSafe(f(&mut session)).catch_unwind().await;
        match result {
            Ok(Ok(value)) => {
                session.commit().await?;
                Ok(value)
            }
            Ok(Err(error)) => {
                if let Err(e) = session.rollback().await {
                    log::error!("Rollback failed: {:#}", e);
                }
                Err(error)
            }
            Err(panic) => {
                if let Err(e) = session.rollback().await {
                    log::error!("Rollback failed: {:#}", e);
                }
                std::panic::resume_unwind(panic);
            }
        }
    }

    /// Close the engine, the connection is released once every session is dropped.
    pub fn close(self) {
        log::info!("Closing the {} engine", D::NAME);
    }
}
