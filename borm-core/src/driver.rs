use crate::Connection;
use std::fmt::Debug;

/// A backend implementation.
///
/// `NAME` is both the connection URL scheme (`sqlite://...`) and the key the
/// engine uses to look up the dialect.
pub trait Driver: Default + Debug + Send + Sync + 'static {
    type Connection: Connection<Driver = Self>;

    const NAME: &'static str;
}
