mod as_value;
mod connection;
mod descriptor;
mod driver;
mod entity;
mod error;
pub mod mapper;
pub mod materializer;
mod query;
pub mod registry;
mod sql_writer;
mod support;
mod util;
mod value;

pub use ::anyhow::Context;
pub use as_value::*;
pub use connection::*;
pub use descriptor::*;
pub use driver::*;
pub use entity::*;
pub use error::*;
pub use materializer::from_row;
pub use query::*;
pub use registry::{MappedType, TypeMapper, type_mapper};
pub use sql_writer::*;
pub use support::*;
pub use util::*;
pub use value::*;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
