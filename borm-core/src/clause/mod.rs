mod generator;

pub use generator::*;

use crate::Value;
use std::collections::HashMap;

/// Kind of a statement fragment, every kind holds at most one fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClauseKind {
    Insert,
    Values,
    Select,
    Limit,
    Offset,
    Where,
    OrderBy,
    Update,
    Delete,
    Count,
}

/// Pending statement fragments of a session, keyed by kind.
#[derive(Default, Debug, Clone)]
pub struct Clause {
    fragments: HashMap<ClauseKind, (String, Vec<Value>)>,
}

impl Clause {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate and store a fragment, replacing any previous one of the same kind.
    pub fn set(&mut self, fragment: Fragment<'_>) -> &mut Self {
        let kind = fragment.kind();
        let generated = fragment.generate();
        self.fragments.insert(kind, generated);
        self
    }

    pub fn contains(&self, kind: ClauseKind) -> bool {
        self.fragments.contains_key(&kind)
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Join the present fragments in `order` and reset the storage.
    ///
    /// Kinds without a fragment are skipped.
    pub fn build(&mut self, order: &[ClauseKind]) -> (String, Vec<Value>) {
        let mut sql = String::new();
        let mut args = Vec::new();
        for kind in order {
            let Some((text, values)) = self.fragments.remove(kind) else {
                continue;
            };
            if !sql.is_empty() {
                sql.push(' ');
            }
            sql.push_str(&text);
            args.extend(values);
        }
        self.fragments.clear();
        (sql, args)
    }
}
