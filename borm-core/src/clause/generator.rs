use crate::{ClauseKind, Value, placeholders, separated_by};

/// Typed input of a fragment generator.
#[derive(Debug, Clone)]
pub enum Fragment<'a> {
    Insert {
        table: &'a str,
        fields: &'a [String],
    },
    /// Rows to insert, the placeholder width is taken from the first row.
    Values(Vec<Vec<Value>>),
    Select {
        table: &'a str,
        fields: &'a [String],
    },
    Limit(i64),
    Offset(i64),
    Where {
        condition: String,
        args: Vec<Value>,
    },
    OrderBy(String),
    Update {
        table: &'a str,
        pairs: Vec<(String, Value)>,
    },
    Delete {
        table: &'a str,
    },
    Count {
        table: &'a str,
    },
}

impl Fragment<'_> {
    pub fn kind(&self) -> ClauseKind {
        match self {
            Fragment::Insert { .. } => ClauseKind::Insert,
            Fragment::Values(..) => ClauseKind::Values,
            Fragment::Select { .. } => ClauseKind::Select,
            Fragment::Limit(..) => ClauseKind::Limit,
            Fragment::Offset(..) => ClauseKind::Offset,
            Fragment::Where { .. } => ClauseKind::Where,
            Fragment::OrderBy(..) => ClauseKind::OrderBy,
            Fragment::Update { .. } => ClauseKind::Update,
            Fragment::Delete { .. } => ClauseKind::Delete,
            Fragment::Count { .. } => ClauseKind::Count,
        }
    }

    /// Fragment text and the arguments bound to its placeholders.
    pub fn generate(self) -> (String, Vec<Value>) {
        match self {
            Fragment::Insert { table, fields } => {
                let mut out = format!("INSERT INTO {} (", table);
                separated_by(&mut out, fields, |out, v| out.push_str(v), ",");
                out.push_str(") ");
                (out, Vec::new())
            }
            Fragment::Values(rows) => {
                let width = rows.first().map(Vec::len).unwrap_or_default();
                let mut out = String::from("VALUES ");
                separated_by(
                    &mut out,
                    0..rows.len(),
                    |out, _| {
                        out.push('(');
                        placeholders(out, width);
                        out.push(')');
                    },
                    ", ",
                );
                (out, rows.into_iter().flatten().collect())
            }
            Fragment::Select { table, fields } => select(table, fields),
            Fragment::Limit(limit) => ("LIMIT ?".into(), vec![limit.into()]),
            Fragment::Offset(offset) => ("OFFSET ?".into(), vec![offset.into()]),
            Fragment::Where { condition, args } => (format!("WHERE {}", condition), args),
            Fragment::OrderBy(expr) => (format!("ORDER BY {}", expr), Vec::new()),
            Fragment::Update { table, pairs } => {
                let mut out = format!("UPDATE {} SET ", table);
                let mut args = Vec::with_capacity(pairs.len());
                separated_by(
                    &mut out,
                    pairs,
                    |out, (column, value)| {
                        out.push_str(&column);
                        out.push_str(" = ?");
                        args.push(value);
                    },
                    ", ",
                );
                (out, args)
            }
            Fragment::Delete { table } => (format!("DELETE FROM {}", table), Vec::new()),
            Fragment::Count { table } => select(table, &["count(*)".to_string()]),
        }
    }
}

fn select(table: &str, fields: &[String]) -> (String, Vec<Value>) {
    let mut out = String::from("SELECT ");
    separated_by(&mut out, fields, |out, v| out.push_str(v), ",");
    out.push_str(" FROM ");
    out.push_str(table);
    out.push(' ');
    (out, Vec::new())
}
