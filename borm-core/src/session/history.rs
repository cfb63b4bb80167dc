use crate::{Connection, PrintableArgs, Query, Session};
use std::fmt::Write;

impl<C: Connection> Session<C> {
    /// Statements executed while history was enabled, one per line.
    pub fn history(&self) -> &str {
        &self.history
    }

    pub(super) fn record(&mut self, query: &Query) {
        let _ = writeln!(self.history, "{}{}", query.sql, PrintableArgs(&query.args));
    }
}
