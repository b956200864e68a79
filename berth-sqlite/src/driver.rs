use crate::{SqliteConnection, SqliteSqlWriter};
use berth_core::Driver;
use std::ffi::c_int;
use thiserror::Error;

#[derive(Default, Debug, Clone, Copy)]
pub struct SqliteDriver {}

impl SqliteDriver {
    pub const fn new() -> Self {
        Self {}
    }
}

impl Driver for SqliteDriver {
    type Connection = SqliteConnection;
    type SqlWriter = SqliteSqlWriter;
    type Error = SqliteError;

    const NAME: &'static str = "sqlite";

    fn sql_writer(&self) -> SqliteSqlWriter {
        SqliteSqlWriter {}
    }
}

/// Failure reported by sqlite, with its result code.
#[derive(Debug, Error)]
#[error("{message} (sqlite code {code})")]
pub struct SqliteError {
    pub code: c_int,
    pub message: String,
}
