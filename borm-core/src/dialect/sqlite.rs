use crate::{Dialect, Value};

#[derive(Default, Debug, Clone, Copy)]
pub struct SqliteDialect;

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn data_type(&self, value: &Value) -> &'static str {
        match value {
            Value::Boolean(..) => "bool",
            Value::Int8(..)
            | Value::Int16(..)
            | Value::Int32(..)
            | Value::UInt8(..)
            | Value::UInt16(..)
            | Value::UInt32(..) => "integer",
            Value::Int64(..) | Value::UInt64(..) => "bigint",
            Value::Float32(..) | Value::Float64(..) | Value::Decimal(..) => "real",
            Value::Varchar(..) | Value::Uuid(..) => "text",
            Value::Blob(..) => "blob",
            Value::Timestamp(..) | Value::TimestampWithTimezone(..) => "datetime",
            _ => panic!(
                "Unexpected borm::Value, cannot get the sqlite type from {:?} variant",
                value
            ),
        }
    }

    fn table_exists_statement(&self, table: &str) -> (String, Vec<Value>) {
        (
            "SELECT name FROM sqlite_master WHERE type = 'table' and name = ?".into(),
            vec![table.into()],
        )
    }
}
