mod explicit_key;
mod nullability;
mod support;
mod widget;

use crate::{
    explicit_key::{catalog, sessions},
    nullability::{absent_values, nullability},
    support::{support, support_errors},
    widget::widget,
};
use berth::{Connection, Driver, SqlSupport, SqlWriter};
use log::LevelFilter;
use std::env;

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

/// Run the driver-agnostic suite on a live connection.
pub fn execute_tests<C: Connection>(connection: &mut C) {
    widget(connection);
    nullability(connection);
    absent_values(connection);
    catalog(connection);
    sessions(connection);
    support(connection);
    support_errors(connection);
}

/// Turns logging off until dropped, then restores the previous level, also when unwinding.
pub struct SilenceLogs(LevelFilter);

impl SilenceLogs {
    pub fn new() -> Self {
        let level = log::max_level();
        log::set_max_level(LevelFilter::Off);
        Self(level)
    }
}

impl Drop for SilenceLogs {
    fn drop(&mut self) {
        log::set_max_level(self.0);
    }
}

#[macro_export]
macro_rules! silent_logs {
    ($($code:tt)+) => {{
        let _silence = $crate::SilenceLogs::new();
        $($code)+
    }};
}

/// Rewrite each `?` of `sql` into the placeholder of the driver behind `connection`.
pub fn dialect<C: Connection>(connection: &C, sql: &str) -> String {
    let writer = connection.driver().sql_writer();
    let mut out = String::with_capacity(sql.len());
    for (i, part) in sql.split('?').enumerate() {
        if i > 0 {
            writer.write_placeholder(&mut out, i);
        }
        out.push_str(part);
    }
    out
}

/// Drop `table` and create it again with the DDL matching the driver.
pub(crate) fn recreate_table<C: Connection>(
    connection: &mut C,
    table: &str,
    sqlite: &str,
    postgres: &str,
) {
    let support = SqlSupport::default();
    support
        .sql(format!("DROP TABLE IF EXISTS {table}"))
        .update(connection)
        .expect(&format!("Failed to drop table {table}"));
    let ddl = match <C::Driver as Driver>::NAME {
        "postgres" => postgres,
        _ => sqlite,
    };
    support
        .sql(ddl)
        .update(connection)
        .expect(&format!("Failed to create table {table}"));
}
