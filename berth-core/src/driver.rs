use crate::{Connection, SqlWriter};
use std::error::Error as StdError;

pub trait Driver {
    type Connection: Connection;
    type SqlWriter: SqlWriter;
    /// The native error raised by the store.
    type Error: StdError + Send + Sync + 'static;

    const NAME: &'static str;

    fn sql_writer(&self) -> Self::SqlWriter;
}
