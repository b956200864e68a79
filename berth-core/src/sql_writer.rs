use crate::{EntityDescriptor, separated_by};
use std::fmt::{self, Display, Write};

/// Where the primary key is bound in a [`SqlTemplate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyBinding {
    /// Position 1, before any column.
    First,
    /// After every column.
    Last,
    /// Not bound, the store generates it.
    Omitted,
}

/// Generated parameterized SQL for one operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlTemplate {
    pub sql: String,
    pub key: KeyBinding,
    /// The statement produces a generated key to read back.
    pub generated_key: bool,
    /// Number of placeholders.
    pub parameters: usize,
}

impl Display for SqlTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// Writes the SQL of the canonical operations over an [`EntityDescriptor`].
///
/// Columns always appear in the order of [`EntityDescriptor::columns`], the order parameters
/// are bound in. Drivers override the dialect hooks (`write_identifier`, `write_placeholder`,
/// `write_key_set_filter`, `write_returning_key`) and inherit the rest.
pub trait SqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter;

    fn write_identifier(&self, out: &mut String, value: &str) {
        out.push_str(value);
    }

    /// Placeholder of the 1-indexed parameter `index`.
    fn write_placeholder(&self, out: &mut String, _index: usize) {
        out.push('?');
    }

    fn write_projection(&self, out: &mut String, descriptor: &EntityDescriptor) {
        separated_by(
            out,
            descriptor.fields(),
            |out, field| self.write_identifier(out, field.column),
            ", ",
        );
    }

    fn write_key_filter(&self, out: &mut String, descriptor: &EntityDescriptor, index: usize) {
        self.write_identifier(out, descriptor.primary_key.column);
        out.push_str(" = ");
        self.write_placeholder(out, index);
    }

    /// Membership of the primary key in the list parameter `index`.
    ///
    /// The default `ANY(?)` requires a store able to bind arrays.
    fn write_key_set_filter(&self, out: &mut String, descriptor: &EntityDescriptor, index: usize) {
        self.write_identifier(out, descriptor.primary_key.column);
        out.push_str(" = ANY(");
        self.write_placeholder(out, index);
        out.push(')');
    }

    /// Clause making an insert return the key generated by the store, if the store needs one.
    fn write_returning_key(&self, _out: &mut String, _descriptor: &EntityDescriptor) {}

    fn select_by_key(&self, descriptor: &EntityDescriptor) -> SqlTemplate {
        let mut out = String::with_capacity(128);
        out.push_str("SELECT ");
        self.write_projection(&mut out, descriptor);
        out.push_str(" FROM ");
        self.write_identifier(&mut out, descriptor.table);
        out.push_str(" WHERE ");
        self.write_key_filter(&mut out, descriptor, 1);
        SqlTemplate {
            sql: out,
            key: KeyBinding::First,
            generated_key: false,
            parameters: 1,
        }
    }

    fn bulk_select_by_keys(&self, descriptor: &EntityDescriptor) -> SqlTemplate {
        let mut out = String::with_capacity(128);
        out.push_str("SELECT ");
        self.write_projection(&mut out, descriptor);
        out.push_str(" FROM ");
        self.write_identifier(&mut out, descriptor.table);
        out.push_str(" WHERE ");
        self.write_key_set_filter(&mut out, descriptor, 1);
        SqlTemplate {
            sql: out,
            key: KeyBinding::First,
            generated_key: false,
            parameters: 1,
        }
    }

    /// Insert one entity, with the primary key first when `key_provided` or without it.
    fn insert(&self, descriptor: &EntityDescriptor, key_provided: bool) -> SqlTemplate {
        let mut out = String::with_capacity(128);
        out.push_str("INSERT INTO ");
        self.write_identifier(&mut out, descriptor.table);
        let fields = if key_provided {
            descriptor.fields().collect::<Vec<_>>()
        } else {
            descriptor.columns.iter().collect()
        };
        if fields.is_empty() {
            out.push_str(" DEFAULT VALUES");
        } else {
            out.push_str(" (");
            separated_by(
                &mut out,
                fields.iter(),
                |out, field| self.write_identifier(out, field.column),
                ", ",
            );
            out.push_str(") VALUES (");
            separated_by(
                &mut out,
                1..=fields.len(),
                |out, index| self.write_placeholder(out, index),
                ", ",
            );
            out.push(')');
        }
        if !key_provided {
            self.write_returning_key(&mut out, descriptor);
        }
        SqlTemplate {
            sql: out,
            key: if key_provided {
                KeyBinding::First
            } else {
                KeyBinding::Omitted
            },
            generated_key: !key_provided,
            parameters: fields.len(),
        }
    }

    /// Update every column of one entity, the primary key is bound last.
    fn update(&self, descriptor: &EntityDescriptor) -> SqlTemplate {
        let mut out = String::with_capacity(128);
        out.push_str("UPDATE ");
        self.write_identifier(&mut out, descriptor.table);
        out.push_str(" SET ");
        if descriptor.columns.is_empty() {
            // Nothing to change, keeps the statement valid
            self.write_identifier(&mut out, descriptor.primary_key.column);
            out.push_str(" = ");
            self.write_identifier(&mut out, descriptor.primary_key.column);
        } else {
            separated_by(
                &mut out,
                descriptor.columns.iter().enumerate(),
                |out, (i, field)| {
                    self.write_identifier(out, field.column);
                    out.push_str(" = ");
                    self.write_placeholder(out, i + 1);
                },
                ", ",
            );
        }
        out.push_str(" WHERE ");
        let parameters = descriptor.columns.len() + 1;
        self.write_key_filter(&mut out, descriptor, parameters);
        SqlTemplate {
            sql: out,
            key: KeyBinding::Last,
            generated_key: false,
            parameters,
        }
    }

    fn delete_by_key(&self, descriptor: &EntityDescriptor) -> SqlTemplate {
        let mut out = String::with_capacity(64);
        out.push_str("DELETE FROM ");
        self.write_identifier(&mut out, descriptor.table);
        out.push_str(" WHERE ");
        self.write_key_filter(&mut out, descriptor, 1);
        SqlTemplate {
            sql: out,
            key: KeyBinding::First,
            generated_key: false,
            parameters: 1,
        }
    }
}

/// Writer of the dialect described by the default methods of [`SqlWriter`].
#[derive(Default, Debug, Clone, Copy)]
pub struct GenericSqlWriter;

impl GenericSqlWriter {
    pub fn new() -> Self {
        Self {}
    }
}

impl SqlWriter for GenericSqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter {
        self
    }
}

/// Writes `$1`, `$2`, ... placeholders, for drivers using numbered parameters.
pub fn write_numbered_placeholder(out: &mut String, index: usize) {
    let _ = write!(out, "${index}");
}
