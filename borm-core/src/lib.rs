mod as_value;
mod clause;
mod connection;
mod dialect;
mod driver;
mod engine;
mod executor;
mod model;
mod query;
mod schema;
mod session;
mod util;
mod value;

pub use ::anyhow::Context;
pub use as_value::*;
pub use clause::*;
pub use connection::*;
pub use dialect::*;
pub use driver::*;
pub use engine::*;
pub use executor::*;
pub use model::*;
pub use query::*;
pub use schema::*;
pub use session::*;
pub use util::*;
pub use value::*;
pub mod stream {
    pub use ::futures::stream::*;
}
pub use ::futures::future;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
