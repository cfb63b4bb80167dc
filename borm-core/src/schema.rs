use crate::{Dialect, Error, Model, Result, Value};
use std::{any::TypeId, collections::HashMap};

/// A mapped column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    /// Backend column type.
    pub ty: String,
    /// Raw annotation, not interpreted here.
    pub tag: String,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            tag: tag.into(),
        }
    }
}

/// Table description derived from a [`Model`] type and a [`Dialect`].
#[derive(Debug, Clone)]
pub struct Schema {
    model: TypeId,
    model_name: &'static str,
    pub name: String,
    pub fields: Vec<Field>,
    pub field_names: Vec<String>,
    field_map: HashMap<String, usize>,
}

impl Schema {
    /// Derive the schema of `M`, resolving every column type with `dialect`.
    ///
    /// Panics if `M` has a field the dialect cannot map.
    pub fn parse<M: Model>(dialect: &dyn Dialect) -> Self {
        let columns = M::columns();
        let mut fields = Vec::with_capacity(columns.len());
        let mut field_names = Vec::with_capacity(columns.len());
        let mut field_map = HashMap::with_capacity(columns.len());
        for column in columns {
            field_map.insert(column.name.to_string(), fields.len());
            field_names.push(column.name.to_string());
            fields.push(Field::new(
                column.name,
                dialect.data_type(&column.value),
                column.tag,
            ));
        }
        Self {
            model: TypeId::of::<M>(),
            model_name: std::any::type_name::<M>(),
            name: M::table_name().into(),
            fields,
            field_names,
            field_map,
        }
    }

    pub fn get_field(&self, name: &str) -> Option<&Field> {
        self.field_map.get(name).map(|i| &self.fields[*i])
    }

    /// Whether this schema was derived from `M`.
    pub fn is<M: Model>(&self) -> bool {
        self.model == TypeId::of::<M>()
    }

    pub fn model_type(&self) -> TypeId {
        self.model
    }

    /// Full Rust path of the model type.
    pub fn model_name(&self) -> &'static str {
        self.model_name
    }

    /// Values of `record` in the order of [`Schema::fields`].
    pub fn record_values<M: Model>(&self, record: &M) -> Result<Vec<Value>> {
        if !self.is::<M>() {
            return Err(Error::msg(format!(
                "Cannot extract values of `{}` using the schema of `{}`",
                std::any::type_name::<M>(),
                self.model_name
            )));
        }
        Ok(record.row().into_vec())
    }
}
