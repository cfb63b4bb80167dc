use crate::{Dialect, Value};

#[derive(Default, Debug, Clone, Copy)]
pub struct MySqlDialect;

impl Dialect for MySqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn data_type(&self, value: &Value) -> &'static str {
        match value {
            Value::Boolean(..) => "bool",
            Value::Int8(..)
            | Value::Int16(..)
            | Value::Int32(..)
            | Value::UInt8(..)
            | Value::UInt16(..)
            | Value::UInt32(..) => "int",
            Value::Int64(..) | Value::UInt64(..) => "bigint",
            Value::Float32(..) | Value::Float64(..) => "real",
            Value::Decimal(..) => "decimal(38,10)",
            Value::Varchar(..) => "text",
            Value::Uuid(..) => "char(36)",
            Value::Blob(..) => "blob",
            Value::Timestamp(..) | Value::TimestampWithTimezone(..) => "datetime",
            _ => panic!(
                "Unexpected borm::Value, cannot get the mysql type from {:?} variant",
                value
            ),
        }
    }

    fn table_exists_statement(&self, table: &str) -> (String, Vec<Value>) {
        (
            "SELECT table_name FROM information_schema.tables WHERE table_schema = DATABASE() and table_name = ?"
                .into(),
            vec![table.into()],
        )
    }

    fn transaction_begin(&self) -> &'static str {
        "START TRANSACTION"
    }
}
