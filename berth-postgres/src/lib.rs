//! Postgres driver for Berth, on top of the synchronous `postgres` client.
mod connection;
mod driver;
mod prepared;
mod sql_writer;
mod value_holder;

pub use connection::*;
pub use driver::*;
pub use prepared::*;
pub use sql_writer::*;
pub(crate) use value_holder::*;
