mod cache;
mod hooks;
mod raw;
mod transactions;
mod users;

use crate::{cache::cache, hooks::hooks, raw::raw, transactions::transactions, users::users};
use borm::{Driver, Engine};
use log::LevelFilter;
use std::env;

#[doc(hidden)]
pub use log;

pub fn init_logs() {
    let mut logger = env_logger::builder();
    logger
        .is_test(true)
        .format_file(true)
        .format_line_number(true);
    if env::var("RUST_LOG").is_err() {
        logger.filter_level(LevelFilter::Warn);
    }
    let _ = logger.try_init();
}

/// Run the whole suite against `engine`, each part owns its tables.
pub async fn execute_tests<D: Driver>(mut engine: Engine<D>) {
    users(&engine).await;
    raw(&engine).await;
    cache(&engine).await;
    transactions(&engine).await;
    hooks(&mut engine).await;
    engine.close();
}

#[macro_export]
macro_rules! silent_logs {
    ($($code:tt)+) => {{
        let level = $crate::log::max_level();
        $crate::log::set_max_level($crate::log::LevelFilter::Off);
        $($code)+
        $crate::log::set_max_level(level);
    }};
}
