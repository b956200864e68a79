//! Map plain Rust structs to single SQL tables.
//!
//! ```rust,ignore
//! use berth::{Connection, Entity};
//!
//! #[derive(Entity, Default, Debug, Clone, PartialEq)]
//! struct Widget {
//!     id: Option<i64>,
//!     name: String,
//!     score: Option<i32>,
//! }
//!
//! let mut connection = berth_sqlite::SqliteConnection::connect("sqlite://:memory:")?;
//! let widget = Widget { name: "a".into(), ..Default::default() }
//!     .insert(&mut connection)?;
//! ```
pub use berth_core::*;
pub use berth_macros::Entity;
