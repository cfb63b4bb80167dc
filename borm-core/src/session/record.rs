use super::table::bound;
use crate::{
    ClauseKind, Connection, Error, Fragment, HookPoint, HookTarget, Model, Result, Session, Value,
    first_column,
};
use std::any::TypeId;

impl<C: Connection> Session<C> {
    /// Insert the records in one statement, returns the number of rows written.
    pub async fn insert<M: Model>(&mut self, records: &[M]) -> Result<u64> {
        if records.is_empty() {
            return Ok(0);
        }
        let mut rows = Vec::with_capacity(records.len());
        for record in records {
            self.call_hook(
                TypeId::of::<M>(),
                HookPoint::BeforeInsert,
                HookTarget::Record(record),
            )
            .await;
            self.model::<M>();
            match bound(&self.ref_table).and_then(|v| v.record_values(record)) {
                Ok(row) => rows.push(row),
                Err(e) => {
                    self.reset_pending();
                    return Err(e);
                }
            }
        }
        let schema = bound(&self.ref_table)?;
        self.clause.set(Fragment::Insert {
            table: &schema.name,
            fields: &schema.field_names,
        });
        self.clause.set(Fragment::Values(rows));
        let (sql, args) = self
            .clause
            .build(&[ClauseKind::Insert, ClauseKind::Values]);
        let affected = self.raw(sql, args).exec().await?;
        self.call_model_hook(HookPoint::AfterInsert).await;
        Ok(affected.rows_affected)
    }

    /// Select the records of `M` matching the pending filter, order and paging.
    pub async fn find<M: Model>(&mut self) -> Result<Vec<M>> {
        self.model::<M>();
        self.call_model_hook(HookPoint::BeforeQuery).await;
        self.model::<M>();
        self.require_model()?;
        let schema = bound(&self.ref_table)?;
        self.clause.set(Fragment::Select {
            table: &schema.name,
            fields: &schema.field_names,
        });
        let (sql, args) = self.clause.build(&[
            ClauseKind::Select,
            ClauseKind::Where,
            ClauseKind::OrderBy,
            ClauseKind::Limit,
            ClauseKind::Offset,
        ]);
        let rows = self.raw(sql, args).query_rows().await?;
        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let mut record = M::from_row(row)?;
            self.call_hook(
                TypeId::of::<M>(),
                HookPoint::AfterQuery,
                HookTarget::RecordMut(&mut record),
            )
            .await;
            records.push(record);
        }
        Ok(records)
    }

    /// First matching record of `M`, `None` when nothing matches.
    pub async fn first<M: Model>(&mut self) -> Result<Option<M>> {
        self.limit(1);
        Ok(self.find::<M>().await?.into_iter().next())
    }

    /// Set the given columns on the rows of the bound model matching the pending filter.
    pub async fn update<K: Into<String>>(
        &mut self,
        pairs: impl IntoIterator<Item = (K, Value)>,
    ) -> Result<u64> {
        let pairs: Vec<(String, Value)> = pairs.into_iter().map(|(k, v)| (k.into(), v)).collect();
        self.require_model()?;
        self.call_model_hook(HookPoint::BeforeUpdate).await;
        let schema = bound(&self.ref_table)?;
        self.clause.set(Fragment::Update {
            table: &schema.name,
            pairs,
        });
        let (sql, args) = self.clause.build(&[ClauseKind::Update, ClauseKind::Where]);
        let affected = self.raw(sql, args).exec().await?;
        self.call_model_hook(HookPoint::AfterUpdate).await;
        Ok(affected.rows_affected)
    }

    /// Delete the rows of the bound model matching the pending filter.
    pub async fn delete(&mut self) -> Result<u64> {
        self.require_model()?;
        self.call_model_hook(HookPoint::BeforeDelete).await;
        let schema = bound(&self.ref_table)?;
        self.clause.set(Fragment::Delete {
            table: &schema.name,
        });
        let (sql, args) = self.clause.build(&[ClauseKind::Delete, ClauseKind::Where]);
        let affected = self.raw(sql, args).exec().await?;
        self.call_model_hook(HookPoint::AfterDelete).await;
        Ok(affected.rows_affected)
    }

    /// Number of rows of the bound model matching the pending filter.
    pub async fn count(&mut self) -> Result<i64> {
        self.require_model()?;
        let schema = bound(&self.ref_table)?;
        self.clause.set(Fragment::Count {
            table: &schema.name,
        });
        let (sql, args) = self.clause.build(&[ClauseKind::Count, ClauseKind::Where]);
        let Some(row) = self.raw(sql, args).query_row().await? else {
            return Err(Error::msg("Count statement returned no rows"));
        };
        first_column(row)
    }

    pub fn filter(&mut self, condition: impl Into<String>, args: Vec<Value>) -> &mut Self {
        self.clause.set(Fragment::Where {
            condition: condition.into(),
            args,
        });
        self
    }

    pub fn order_by(&mut self, expr: impl Into<String>) -> &mut Self {
        self.clause.set(Fragment::OrderBy(expr.into()));
        self
    }

    pub fn limit(&mut self, limit: i64) -> &mut Self {
        self.clause.set(Fragment::Limit(limit));
        self
    }

    pub fn offset(&mut self, offset: i64) -> &mut Self {
        self.clause.set(Fragment::Offset(offset));
        self
    }

    /// Paging starting from page 1: `LIMIT size OFFSET (page - 1) * size`.
    pub fn page(&mut self, page: i64, size: i64) -> &mut Self {
        let offset = page.saturating_sub(1).saturating_mul(size).max(0);
        self.limit(size).offset(offset)
    }
}
