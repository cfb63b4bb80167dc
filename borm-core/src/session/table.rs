use crate::{Connection, Error, Model, Result, Schema, Session, first_column, separated_by};

/// The schema of the bound model, or an error when none is bound.
pub(super) fn bound(ref_table: &Option<Schema>) -> Result<&Schema> {
    ref_table.as_ref().ok_or_else(|| {
        let error = Error::msg("No model is bound to the session, call `model::<M>()` first");
        log::error!("{:#}", error);
        error
    })
}

impl<C: Connection> Session<C> {
    /// Drop the pending text, arguments and clause fragments.
    pub(super) fn reset_pending(&mut self) {
        self.sql.clear();
        self.sql_vars.clear();
        self.clause = Default::default();
    }

    /// Fail when no model is bound, leaving the session idle.
    pub(super) fn require_model(&mut self) -> Result<()> {
        let result = bound(&self.ref_table).map(|_| ());
        if result.is_err() {
            self.reset_pending();
        }
        result
    }

    /// Bind `M`, the following operations target its table.
    ///
    /// The schema is parsed again only when the bound type changes.
    pub fn model<M: Model>(&mut self) -> &mut Self {
        if !self.ref_table.as_ref().is_some_and(Schema::is::<M>) {
            self.ref_table = Some(Schema::parse::<M>(&*self.dialect));
        }
        self
    }

    pub fn ref_table(&self) -> Result<&Schema> {
        bound(&self.ref_table)
    }

    pub async fn create_table(&mut self) -> Result<()> {
        self.require_model()?;
        let schema = self.ref_table()?;
        let mut sql = format!("CREATE TABLE {} (", schema.name);
        separated_by(
            &mut sql,
            &schema.fields,
            |out, field| {
                out.push_str(&field.name);
                out.push(' ');
                out.push_str(&field.ty);
                if !field.tag.is_empty() {
                    out.push(' ');
                    out.push_str(&field.tag);
                }
            },
            ", ",
        );
        sql.push(')');
        self.raw(sql, Vec::new()).exec().await?;
        Ok(())
    }

    pub async fn drop_table(&mut self) -> Result<()> {
        self.require_model()?;
        let sql = format!("DROP TABLE IF EXISTS {}", self.ref_table()?.name);
        self.raw(sql, Vec::new()).exec().await?;
        Ok(())
    }

    /// Whether the table of the bound model exists.
    pub async fn has_table(&mut self) -> Result<bool> {
        self.require_model()?;
        let name = self.ref_table()?.name.clone();
        let (sql, args) = self.dialect.table_exists_statement(&name);
        let Some(row) = self.raw(sql, args).query_row().await? else {
            return Ok(false);
        };
        Ok(first_column::<String>(row)? == name)
    }
}
