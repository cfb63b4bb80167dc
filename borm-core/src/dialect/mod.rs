mod mysql;
mod sqlite;

pub use mysql::*;
pub use sqlite::*;

use crate::{Error, Result, Value};
use std::{collections::HashMap, fmt::Debug, sync::Arc};

/// Backend specific policy: column types and catalog lookups.
pub trait Dialect: Debug + Send + Sync {
    /// Name used to register the dialect.
    fn name(&self) -> &'static str;

    /// Column type keyword for a value sample.
    ///
    /// Panics when the value kind has no column type in this backend: a record
    /// holding such a field can never be mapped, which is a bug in its definition.
    fn data_type(&self, value: &Value) -> &'static str;

    /// Statement returning one row with the table name if `table` exists.
    fn table_exists_statement(&self, table: &str) -> (String, Vec<Value>);

    fn transaction_begin(&self) -> &'static str {
        "BEGIN"
    }

    fn transaction_commit(&self) -> &'static str {
        "COMMIT"
    }

    fn transaction_rollback(&self) -> &'static str {
        "ROLLBACK"
    }
}

/// Dialects available to engines, keyed by driver name.
///
/// Filled once at startup and handed to [`crate::Engine::connect`].
#[derive(Default, Debug, Clone)]
pub struct DialectRegistry {
    dialects: HashMap<String, Arc<dyn Dialect>>,
}

impl DialectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the dialects shipped in this crate: `sqlite`, `sqlite3` and `mysql`.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry
            .register("sqlite", SqliteDialect)
            .register("sqlite3", SqliteDialect)
            .register("mysql", MySqlDialect);
        registry
    }

    /// Register `dialect` under `name`, replacing any previous one with the same name.
    pub fn register(&mut self, name: impl Into<String>, dialect: impl Dialect + 'static) -> &mut Self {
        let name = name.into();
        log::debug!("Registering dialect `{}` as `{}`", dialect.name(), name);
        self.dialects.insert(name, Arc::new(dialect));
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Dialect>> {
        self.dialects.get(name).cloned()
    }

    /// Like [`DialectRegistry::get`] but a missing dialect is an error.
    pub fn require(&self, name: &str) -> Result<Arc<dyn Dialect>> {
        self.get(name).ok_or_else(|| {
            let error = Error::msg(format!("Dialect `{}` not found", name));
            log::error!("{:#}", error);
            error
        })
    }
}
