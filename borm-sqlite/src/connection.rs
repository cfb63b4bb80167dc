use crate::{
    CBox, SqliteDriver,
    bind::bind_value,
    error_message_from_ptr,
    extract::{extract_name, extract_value},
};
use async_stream::try_stream;
use borm_core::{
    Connection, Context, Driver, Error, Executor, Query, QueryResult, Result, Row, RowLabeled,
    RowNames, RowsAffected, stream::Stream,
};
use libsqlite3_sys::*;
use std::{
    ffi::{CStr, CString, c_char, c_int},
    ptr,
    sync::atomic::{AtomicPtr, Ordering},
};
use tokio::task::spawn_blocking;
use url::form_urlencoded;

/// Milliseconds a statement waits on a locked database before failing.
const BUSY_TIMEOUT: c_int = 5_000;

/// A connection to a sqlite database file (or an in-memory database).
///
/// Url format: `sqlite://<path>?mode=<ro|rw|rwc|memory>`, the path is
/// percent-decoded and `mode` defaults to `rwc`.
pub struct SqliteConnection {
    pub(crate) connection: CBox<sqlite3>,
}

impl SqliteConnection {
    fn last_error(connection: *mut sqlite3) -> Error {
        Error::msg(error_message_from_ptr(unsafe { sqlite3_errmsg(connection) }).to_string())
    }

    /// Prepare, bind and step a single statement, collecting everything it produced.
    fn run_blocking(connection: *mut sqlite3, query: Query) -> Result<Vec<QueryResult>> {
        let sql = CString::new(query.sql.as_str())
            .context("Could not create a CString from the query String")?;
        let mut statement = CBox::new(ptr::null_mut(), |p| unsafe {
            sqlite3_finalize(p);
        });
        let mut tail: *const c_char = ptr::null();
        let rc = unsafe {
            sqlite3_prepare_v2(connection, sql.as_ptr(), -1, &mut *statement, &mut tail)
        };
        if rc != SQLITE_OK {
            return Err(Self::last_error(connection));
        }
        if !tail.is_null() {
            let rest = unsafe { CStr::from_ptr(tail) }.to_string_lossy();
            if rest.chars().any(|c| !c.is_whitespace() && c != ';') {
                return Err(Error::msg(
                    "Cannot execute more than one statement at a time",
                ));
            }
        }
        if statement.is_null() {
            // Blank or comment only
            return Ok(Vec::new());
        }
        let expected = unsafe { sqlite3_bind_parameter_count(*statement) } as usize;
        if expected != query.args.len() {
            return Err(Error::msg(format!(
                "The statement expects {} arguments but {} were provided",
                expected,
                query.args.len()
            )));
        }
        for (i, value) in query.args.into_iter().enumerate() {
            bind_value(*statement, i as c_int + 1, value)?;
        }

        let readonly = unsafe { sqlite3_stmt_readonly(*statement) } != 0;
        let changes_before = unsafe { sqlite3_total_changes64(connection) };
        let rowid_before = unsafe { sqlite3_last_insert_rowid(connection) };
        let count = unsafe { sqlite3_column_count(*statement) };
        let labels = (0..count)
            .map(|i| extract_name(*statement, i))
            .collect::<Result<RowNames>>()?;
        let mut results = Vec::new();
        loop {
            match unsafe { sqlite3_step(*statement) } {
                SQLITE_ROW => {
                    let values = (0..count)
                        .map(|i| extract_value(*statement, i))
                        .collect::<Result<Row>>()?;
                    results.push(RowLabeled::new(labels.clone(), values).into());
                }
                SQLITE_DONE => break,
                _ => return Err(Self::last_error(connection)),
            }
        }
        if !readonly {
            let changed = unsafe { sqlite3_total_changes64(connection) } - changes_before;
            let rowid = unsafe { sqlite3_last_insert_rowid(connection) };
            results.push(
                RowsAffected {
                    rows_affected: changed.max(0) as u64,
                    last_affected_id: (changed > 0 && rowid != rowid_before).then_some(rowid),
                }
                .into(),
            );
        }
        Ok(results)
    }
}

impl Executor for SqliteConnection {
    fn run<'s>(&'s mut self, query: Query) -> impl Stream<Item = Result<QueryResult>> + Send + 's {
        let connection = AtomicPtr::new(*self.connection);
        let context = format!("While executing the query:\n{}", query);
        try_stream! {
            let results = spawn_blocking(move || {
                Self::run_blocking(connection.load(Ordering::Relaxed), query)
            })
            .await?
            .map_err(|e| {
                let error = e.context(context);
                log::error!("{:#}", error);
                error
            })?;
            for result in results {
                yield result;
            }
        }
    }
}

impl Connection for SqliteConnection {
    type Driver = SqliteDriver;

    async fn connect(url: &str) -> Result<SqliteConnection> {
        let prefix = format!("{}://", SqliteDriver::NAME);
        let Some(location) = url.strip_prefix(&prefix) else {
            let error = Error::msg(format!(
                "Expected sqlite connection url to start with `{}`",
                prefix
            ));
            log::error!("{:#}", error);
            return Err(error);
        };
        let context = || format!("Error while decoding connection URL: `{}`", url);
        let (path, params) = location.split_once('?').unwrap_or((location, ""));
        let mut path = urlencoding::decode(path).with_context(context)?;
        let mut flags = SQLITE_OPEN_READWRITE | SQLITE_OPEN_CREATE;
        for (key, value) in form_urlencoded::parse(params.as_bytes()) {
            match key.as_ref() {
                "mode" => {
                    flags = match value.as_ref() {
                        "ro" => SQLITE_OPEN_READONLY,
                        "rw" => SQLITE_OPEN_READWRITE,
                        "rwc" => SQLITE_OPEN_READWRITE | SQLITE_OPEN_CREATE,
                        "memory" => {
                            if path.is_empty() {
                                path = ":memory:".into();
                            }
                            SQLITE_OPEN_READWRITE | SQLITE_OPEN_CREATE | SQLITE_OPEN_MEMORY
                        }
                        _ => {
                            let error = Error::msg(format!(
                                "Unknown sqlite mode `{}`, expected one of: ro, rw, rwc, memory",
                                value
                            ))
                            .context(context());
                            log::error!("{:#}", error);
                            return Err(error);
                        }
                    }
                }
                _ => log::warn!("Ignoring unknown sqlite connection parameter `{}`", key),
            }
        }
        let filename = CString::new(path.as_bytes()).with_context(context)?;
        let mut connection = CBox::new(ptr::null_mut(), |p| unsafe {
            sqlite3_close_v2(p);
        });
        let rc =
            unsafe { sqlite3_open_v2(filename.as_ptr(), &mut *connection, flags, ptr::null()) };
        if rc != SQLITE_OK {
            let message = if connection.is_null() {
                unsafe { sqlite3_errstr(rc) }
            } else {
                unsafe { sqlite3_errmsg(*connection) }
            };
            let error = Error::msg(error_message_from_ptr(message).to_string())
                .context(format!("Could not open the sqlite database `{}`", path));
            log::error!("{:#}", error);
            return Err(error);
        }
        unsafe {
            sqlite3_busy_timeout(*connection, BUSY_TIMEOUT);
        }
        Ok(Self { connection })
    }
}
