use crate::{Result, Row, RowLabeled, Value};

/// Column declared by a [`Model`], in struct declaration order.
#[derive(Debug, Clone)]
pub struct ColumnDef {
    /// Column name (the field name).
    pub name: &'static str,
    /// Type sample, an empty [`Value`] of the field's type.
    pub value: Value,
    /// Raw annotation from `#[borm(tag = "...")]`, empty when absent.
    pub tag: &'static str,
}

/// A record type that maps onto a table.
///
/// Usually implemented with `#[derive(Model)]`, which keeps the public named
/// fields not marked `#[borm(skip)]`.
pub trait Model: Sized + Send + Sync + 'static {
    /// Table name, the bare type name unless overridden.
    fn table_name() -> &'static str;

    /// Mapped columns in declaration order.
    fn columns() -> &'static [ColumnDef];

    /// Current values of the mapped fields, aligned with [`Model::columns`].
    fn row(&self) -> Row;

    /// Build a record from a labeled row; fields are matched by label.
    fn from_row(row: RowLabeled) -> Result<Self>;
}
