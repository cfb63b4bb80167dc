use crate::error_message_from_ptr;
use borm_core::{Error, Result, TIMESTAMP_FORMAT, Value};
use libsqlite3_sys::*;
use rust_decimal::prelude::ToPrimitive;
use std::{
    ffi::{c_char, c_int, c_void},
    fmt::Display,
};
use time::format_description::well_known::Rfc3339;

fn bind_text(statement: *mut sqlite3_stmt, index: c_int, text: &str) -> c_int {
    unsafe {
        sqlite3_bind_text(
            statement,
            index,
            text.as_ptr() as *const c_char,
            text.len() as c_int,
            SQLITE_TRANSIENT(),
        )
    }
}

fn out_of_range(value: impl Display) -> Error {
    Error::msg(format!(
        "Cannot bind `{}` into a sqlite integer because it's out of bounds",
        value
    ))
}

/// Bind `value` to the 1-based placeholder `index` of `statement`.
pub(crate) fn bind_value(statement: *mut sqlite3_stmt, index: c_int, value: Value) -> Result<()> {
    if value.is_null() {
        let rc = unsafe { sqlite3_bind_null(statement, index) };
        return check(statement, rc, index);
    }
    let rc = unsafe {
        match value {
            Value::Boolean(Some(v)) => sqlite3_bind_int(statement, index, v as c_int),
            Value::Int8(Some(v)) => sqlite3_bind_int(statement, index, v as c_int),
            Value::Int16(Some(v)) => sqlite3_bind_int(statement, index, v as c_int),
            Value::Int32(Some(v)) => sqlite3_bind_int(statement, index, v),
            Value::Int64(Some(v)) => sqlite3_bind_int64(statement, index, v),
            Value::UInt8(Some(v)) => sqlite3_bind_int(statement, index, v as c_int),
            Value::UInt16(Some(v)) => sqlite3_bind_int(statement, index, v as c_int),
            Value::UInt32(Some(v)) => sqlite3_bind_int64(statement, index, v as sqlite3_int64),
            Value::UInt64(Some(v)) => {
                let v = sqlite3_int64::try_from(v).map_err(|_| out_of_range(v))?;
                sqlite3_bind_int64(statement, index, v)
            }
            Value::Float32(Some(v)) => sqlite3_bind_double(statement, index, v as f64),
            Value::Float64(Some(v)) => sqlite3_bind_double(statement, index, v),
            Value::Decimal(Some(v)) => sqlite3_bind_double(
                statement,
                index,
                v.to_f64().ok_or_else(|| {
                    Error::msg(format!("Cannot convert the Decimal value `{}` to f64", v))
                })?,
            ),
            Value::Varchar(Some(v)) => bind_text(statement, index, &v),
            Value::Blob(Some(v)) => sqlite3_bind_blob(
                statement,
                index,
                v.as_ptr() as *const c_void,
                v.len() as c_int,
                SQLITE_TRANSIENT(),
            ),
            Value::Timestamp(Some(v)) => bind_text(statement, index, &v.format(TIMESTAMP_FORMAT)?),
            Value::TimestampWithTimezone(Some(v)) => {
                bind_text(statement, index, &v.format(&Rfc3339)?)
            }
            Value::Uuid(Some(v)) => bind_text(statement, index, &v.to_string()),
            _ => sqlite3_bind_null(statement, index),
        }
    };
    check(statement, rc, index)
}

fn check(statement: *mut sqlite3_stmt, rc: c_int, index: c_int) -> Result<()> {
    if rc == SQLITE_OK {
        return Ok(());
    }
    let message = unsafe { error_message_from_ptr(sqlite3_errmsg(sqlite3_db_handle(statement))) };
    Err(Error::msg(format!(
        "Could not bind parameter {}: {}",
        index, message
    )))
}
